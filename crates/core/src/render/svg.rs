use std::fmt::{self, Write as _};

use crate::{
    shape::{Outline, Point},
    style::{BorderPattern, Color, VisualStyle},
    Result,
};

use super::{Frame, Surface, PARTICLE_LIFETIME_MS};

/// Margin around the 100x100 shape box so the particle ring stays visible.
const MARGIN: f32 = 20.0;

/// Renders one frame as a standalone SVG document.
///
/// The shape is drawn in a 100x100 box, rotated and scaled around its center,
/// and carries a CSS `transition` so a browser showing consecutive documents
/// animates between them.
pub fn render_svg(frame: &Frame) -> String {
    let style = &frame.style;
    let extent = 100.0 + 2.0 * MARGIN;
    let pixels = (f32::from(style.size) * extent / 100.0).round();

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{pixels}" height="{pixels}" viewBox="{min} {min} {extent} {extent}" data-shape="{shape}" data-phase="{phase}">"#,
        min = -MARGIN,
        shape = frame.shape,
        phase = frame.phase.name(),
    );
    let _ = writeln!(
        out,
        r#"  <g transform="rotate({rotation} 50 50) translate(50 50) scale({scale}) translate(-50 -50)" style="transition: {motion}">"#,
        rotation = style.display_rotation(),
        scale = style.scale,
        motion = frame.motion.css(),
    );

    match frame.shape.outline() {
        Outline::Circle => {
            write_circle(&mut out, style);
        }
        Outline::Square => {
            write_square(&mut out, style);
        }
        Outline::Polygons(polygons) => {
            for points in polygons {
                write_polygon(&mut out, style, points);
            }
        }
        Outline::MarkedCircle => {
            write_circle(&mut out, style);
            let _ = writeln!(
                out,
                r#"    <circle cx="50" cy="50" r="5" fill="{}"/>"#,
                attr(&style.border_color)
            );
        }
    }
    out.push_str("  </g>\n");

    for particle in &frame.particles {
        let _ = writeln!(
            out,
            r#"  <circle class="particle" cx="{:.2}" cy="{:.2}" r="1.5" fill="{}" style="animation: particle {}ms ease-out {}ms"/>"#,
            particle.x,
            particle.y,
            attr(&particle.color),
            PARTICLE_LIFETIME_MS,
            particle.delay_ms,
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Color as an attribute value. Stored colors are user-editable, so markup
/// characters are escaped.
struct Attr<'a>(&'a str);

fn attr(color: &Color) -> Attr<'_> {
    Attr(color.as_str())
}

impl fmt::Display for Attr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&apos;")?,
                _ => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

/// Border width of box-shaped outlines is given in CSS pixels; convert it to
/// view box units.
fn box_stroke(style: &VisualStyle) -> f32 {
    f32::from(style.border_width) * 100.0 / f32::from(style.size)
}

fn dash_attr(pattern: BorderPattern, width: f32) -> String {
    match pattern {
        BorderPattern::Solid | BorderPattern::Double => String::new(),
        BorderPattern::Dashed => format!(r#" stroke-dasharray="{:.2} {:.2}""#, width * 3.0, width * 2.0),
        BorderPattern::Dotted => {
            format!(r#" stroke-dasharray="0 {:.2}" stroke-linecap="round""#, width * 2.0)
        }
    }
}

fn write_circle(out: &mut String, style: &VisualStyle) {
    let stroke = box_stroke(style);
    let radius = 50.0 - stroke / 2.0;
    let _ = writeln!(
        out,
        r#"    <circle cx="50" cy="50" r="{radius:.2}" fill="{}" stroke="{}" stroke-width="{stroke:.2}"{}/>"#,
        attr(&style.fill),
        attr(&style.border_color),
        dash_attr(style.border_pattern, stroke),
    );
    if style.border_pattern == BorderPattern::Double {
        let _ = writeln!(
            out,
            r#"    <circle cx="50" cy="50" r="{:.2}" fill="none" stroke="{}" stroke-width="{:.2}"/>"#,
            radius - stroke * 1.5,
            attr(&style.border_color),
            stroke / 2.0,
        );
    }
}

fn write_square(out: &mut String, style: &VisualStyle) {
    let stroke = box_stroke(style);
    let inset = stroke / 2.0;
    let side = 100.0 - stroke;
    let _ = writeln!(
        out,
        r#"    <rect x="{inset:.2}" y="{inset:.2}" width="{side:.2}" height="{side:.2}" fill="{}" stroke="{}" stroke-width="{stroke:.2}"{}/>"#,
        attr(&style.fill),
        attr(&style.border_color),
        dash_attr(style.border_pattern, stroke),
    );
    if style.border_pattern == BorderPattern::Double {
        let inner = inset + stroke * 1.5;
        let _ = writeln!(
            out,
            r#"    <rect x="{inner:.2}" y="{inner:.2}" width="{w:.2}" height="{w:.2}" fill="none" stroke="{}" stroke-width="{:.2}"/>"#,
            attr(&style.border_color),
            stroke / 2.0,
            w = 100.0 - 2.0 * inner,
        );
    }
}

fn write_polygon(out: &mut String, style: &VisualStyle, points: &[Point]) {
    let stroke = f32::from(style.border_width);
    let points = points
        .iter()
        .map(|(x, y)| format!("{x},{y}"))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(
        out,
        r#"    <polygon points="{points}" fill="{}" stroke="{}" stroke-width="{stroke}" stroke-linejoin="round"{}/>"#,
        attr(&style.fill),
        attr(&style.border_color),
        dash_attr(style.border_pattern, stroke),
    );
}

/// Surface that keeps the SVG of the latest frame in memory.
#[derive(Debug, Default)]
pub struct SvgSurface {
    document: Option<String>,
    frames_rendered: usize,
    fullscreen: bool,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// SVG of the most recent frame.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

impl Surface for SvgSurface {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.document = Some(render_svg(frame));
        self.frames_rendered += 1;
        Ok(())
    }

    fn toggle_fullscreen(&mut self) -> Result<()> {
        self.fullscreen = !self.fullscreen;
        tracing::info!(fullscreen = self.fullscreen, "toggled fullscreen");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        shape::ShapeKind,
        style::{Color, Palette},
        transition::Phase,
    };

    fn frame(shape: ShapeKind, phase: Phase) -> Frame {
        let mut style =
            VisualStyle::initial(&Palette::from_hex(&["#ffd700", "#b22222"]).unwrap());
        style.rotation = 450;
        Frame::new(0, shape, ShapeKind::Circle, style, phase, false)
    }

    #[test]
    fn every_shape_renders() {
        for shape in ShapeKind::ALL {
            let svg = render_svg(&frame(shape, Phase::Idle));
            assert!(svg.starts_with("<svg"));
            assert!(svg.trim_end().ends_with("</svg>"));
            assert!(svg.contains(&format!(r#"data-shape="{shape}""#)));
            assert!(svg.contains("rotate(90 50 50)"));
        }
    }

    #[test]
    fn polygons_use_legacy_geometry() {
        let svg = render_svg(&frame(ShapeKind::Triangle, Phase::Idle));
        assert!(svg.contains(r#"points="50,10 90,90 10,90""#));

        let svg = render_svg(&frame(ShapeKind::SixPointStar, Phase::Idle));
        assert_eq!(svg.matches("<polygon").count(), 2);
    }

    #[test]
    fn marked_circle_has_center_dot_in_border_color() {
        let svg = render_svg(&frame(ShapeKind::MarkedCircle, Phase::Idle));
        assert!(svg.contains(r##"r="5" fill="#b22222""##));
    }

    #[test]
    fn particles_only_while_transitioning() {
        let resting = render_svg(&frame(ShapeKind::Circle, Phase::Idle));
        assert!(!resting.contains("particle"));

        let busy = render_svg(&frame(ShapeKind::Circle, Phase::Contracting));
        assert_eq!(busy.matches(r#"class="particle""#).count(), 8);
        assert!(busy.contains("cubic-bezier(0.34, 1.3, 0.64, 1)"));
    }

    #[test]
    fn double_border_draws_inner_outline() {
        let mut frame = frame(ShapeKind::Square, Phase::Idle);
        frame.style.border_pattern = BorderPattern::Double;
        frame.style.border_color = Color::from("#123456");
        let svg = render_svg(&frame);
        assert_eq!(svg.matches("<rect").count(), 2);
    }

    #[test]
    fn hostile_colors_are_escaped() {
        let mut frame = frame(ShapeKind::MarkedCircle, Phase::Contracting);
        frame.style.fill = Color::from(r#"red" onload="alert(1)"#);
        frame.style.border_color = Color::from("<script>&");
        for particle in &mut frame.particles {
            particle.color = frame.style.border_color.clone();
        }
        let svg = render_svg(&frame);

        assert!(!svg.contains(r#"red" onload"#));
        assert!(!svg.contains("<script>"));
        assert!(svg.contains(r#"fill="red&quot; onload=&quot;alert(1)""#));
        assert!(svg.contains("&lt;script&gt;&amp;"));
        assert_eq!(svg.matches("<circle").count(), 2 + 8);
    }

    #[test]
    fn surface_keeps_latest_document() {
        let mut surface = SvgSurface::new();
        assert!(surface.document().is_none());
        surface.present(&frame(ShapeKind::Square, Phase::Idle)).unwrap();
        surface
            .present(&frame(ShapeKind::FivePointStar, Phase::Idle))
            .unwrap();

        assert_eq!(surface.frames_rendered(), 2);
        assert!(surface.document().unwrap().contains("pentagram"));
    }
}
