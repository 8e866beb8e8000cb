//! Render surface abstraction plus the two bundled surfaces.
//!
//! The widget never draws anything itself. After every state change it hands
//! a [`Frame`] to a [`Surface`], which is expected to animate from the
//! previous frame to the new one using the frame's [`Motion`].

mod easing;
mod svg;

use std::f32::consts::FRAC_PI_4;

pub use easing::{CubicBezier, Easing};
pub use svg::{render_svg, SvgSurface};

use crate::{shape::ShapeKind, style::Color, style::VisualStyle, transition::Phase, Result};

/// Number of particles in the burst shown while a transition runs.
pub const PARTICLE_COUNT: usize = 8;
/// Radius of the particle ring, in units of the shape's 100x100 view box,
/// measured from its center.
pub const PARTICLE_RING: f32 = 65.0;
pub const PARTICLE_STAGGER_MS: u64 = 50;
pub const PARTICLE_LIFETIME_MS: u64 = 800;

/// Easing curve and duration a surface should use to reach a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub easing: Easing,
    pub duration_ms: u64,
}

impl Motion {
    /// Motion for shrinking into a transition.
    pub const SETTLE: Motion = Motion {
        easing: Easing::Settle,
        duration_ms: 500,
    };
    /// Motion for springing back out.
    pub const ELASTIC: Motion = Motion {
        easing: Easing::ElasticOvershoot,
        duration_ms: 800,
    };

    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Contracting => Self::SETTLE,
            Phase::Settling | Phase::Idle => Self::ELASTIC,
        }
    }

    /// CSS `transition` value for the transform property.
    pub fn css(&self) -> String {
        format!("transform {}ms {}", self.duration_ms, self.easing.css())
    }
}

/// One dot of the transition burst.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Center in view box units.
    pub x: f32,
    pub y: f32,
    pub delay_ms: u64,
    pub color: Color,
}

/// Ring of particles in the border color, one every 45 degrees.
pub fn particle_burst(color: &Color) -> Vec<Particle> {
    (0..PARTICLE_COUNT)
        .map(|i| {
            let angle = i as f32 * FRAC_PI_4;
            Particle {
                x: 50.0 + angle.cos() * PARTICLE_RING,
                y: 50.0 + angle.sin() * PARTICLE_RING,
                delay_ms: i as u64 * PARTICLE_STAGGER_MS,
                color: color.clone(),
            }
        })
        .collect()
}

/// Everything a surface needs to draw the widget at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub at_ms: u64,
    pub shape: ShapeKind,
    pub previous_shape: ShapeKind,
    pub style: VisualStyle,
    pub phase: Phase,
    pub motion: Motion,
    pub particles: Vec<Particle>,
    pub auto_cycling: bool,
}

impl Frame {
    pub fn new(
        at_ms: u64,
        shape: ShapeKind,
        previous_shape: ShapeKind,
        style: VisualStyle,
        phase: Phase,
        auto_cycling: bool,
    ) -> Self {
        let particles = if phase.is_transitioning() {
            particle_burst(&style.border_color)
        } else {
            Vec::new()
        };
        Self {
            at_ms,
            shape,
            previous_shape,
            motion: Motion::for_phase(phase),
            style,
            phase,
            particles,
            auto_cycling,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase.is_transitioning()
    }
}

/// Host-provided drawing target.
pub trait Surface {
    /// Shows `frame`, animating from whatever was presented before.
    fn present(&mut self, frame: &Frame) -> Result<()>;
    /// Enters fullscreen, or leaves it when already there.
    fn toggle_fullscreen(&mut self) -> Result<()>;
}

/// Surface that simply keeps every frame it was given.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    frames: Vec<Frame>,
    fullscreen: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

impl Surface for RecordingSurface {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn toggle_fullscreen(&mut self) -> Result<()> {
        self.fullscreen = !self.fullscreen;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Palette;

    fn style() -> VisualStyle {
        VisualStyle::initial(&Palette::from_hex(&["#ff0000", "#00ff00"]).unwrap())
    }

    #[test]
    fn resting_frames_have_no_particles() {
        let frame = Frame::new(
            0,
            ShapeKind::Circle,
            ShapeKind::Circle,
            style(),
            Phase::Idle,
            false,
        );
        assert!(frame.particles.is_empty());
        assert_eq!(frame.motion, Motion::ELASTIC);
        assert!(!frame.is_transitioning());
    }

    #[test]
    fn transitioning_frames_burst_in_border_color() {
        let frame = Frame::new(
            0,
            ShapeKind::Square,
            ShapeKind::Circle,
            style().contracted(180),
            Phase::Contracting,
            false,
        );
        assert_eq!(frame.motion, Motion::SETTLE);
        assert_eq!(frame.particles.len(), PARTICLE_COUNT);
        assert!(frame.particles.iter().all(|p| p.color.as_str() == "#00ff00"));

        let first = &frame.particles[0];
        assert!((first.x - (50.0 + PARTICLE_RING)).abs() < 1e-4);
        assert!((first.y - 50.0).abs() < 1e-4);
        assert_eq!(frame.particles[7].delay_ms, 350);
    }

    #[test]
    fn motion_css_names_curve_and_duration() {
        assert_eq!(
            Motion::SETTLE.css(),
            "transform 500ms cubic-bezier(0.34, 1.3, 0.64, 1)"
        );
        assert_eq!(
            Motion::ELASTIC.css(),
            "transform 800ms cubic-bezier(0.34, 1.56, 0.64, 1)"
        );
    }

    #[test]
    fn recording_surface_tracks_fullscreen() {
        let mut surface = RecordingSurface::new();
        surface.toggle_fullscreen().unwrap();
        assert!(surface.is_fullscreen());
        surface.toggle_fullscreen().unwrap();
        assert!(!surface.is_fullscreen());
    }
}
