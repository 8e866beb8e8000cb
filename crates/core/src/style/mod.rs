//! Visual styles and the random style generator.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{AlchemyError, Result};

pub const MIN_BORDER_WIDTH: u8 = 1;
pub const MAX_BORDER_WIDTH: u8 = 12;
pub const MIN_SIZE: u16 = 200;
pub const MAX_SIZE: u16 = 400;
pub const CONTRACTED_SCALE: f32 = 0.5;
pub const RESTING_SCALE: f32 = 1.0;

/// CSS color string such as `#ffd700`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Non-empty list of colors that fills and borders are drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Color>", into = "Vec<Color>")]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Result<Self> {
        if colors.is_empty() {
            return Err(AlchemyError::InvalidPalette("<unnamed>".to_string()));
        }
        Ok(Self { colors })
    }

    pub fn from_hex(colors: &[&str]) -> Result<Self> {
        Self::new(colors.iter().copied().map(Color::from).collect())
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn first(&self) -> &Color {
        &self.colors[0]
    }

    /// Second color, or the first one again for single-color palettes.
    pub fn second(&self) -> &Color {
        self.colors.get(1).unwrap_or(&self.colors[0])
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        self.colors[rng.gen_range(0..self.colors.len())].clone()
    }
}

impl TryFrom<Vec<Color>> for Palette {
    type Error = AlchemyError;

    fn try_from(value: Vec<Color>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Palette> for Vec<Color> {
    fn from(value: Palette) -> Self {
        value.colors
    }
}

/// Line pattern of the shape's border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderPattern {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Double,
}

impl BorderPattern {
    pub const ALL: [BorderPattern; 4] = [
        BorderPattern::Solid,
        BorderPattern::Dashed,
        BorderPattern::Dotted,
        BorderPattern::Double,
    ];

    pub fn as_css(self) -> &'static str {
        match self {
            BorderPattern::Solid => "solid",
            BorderPattern::Dashed => "dashed",
            BorderPattern::Dotted => "dotted",
            BorderPattern::Double => "double",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pattern| pattern.as_css() == value)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Immutable snapshot of how the shape looks. Every change produces a new
/// value through one of the builder-style methods below.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualStyle {
    pub fill: Color,
    pub border_color: Color,
    pub border_width: u8,
    pub border_pattern: BorderPattern,
    pub size: u16,
    /// Degrees. May exceed 360 right after a contraction so the turn keeps
    /// its direction, but never reaches 720; see
    /// [`VisualStyle::display_rotation`].
    pub rotation: u32,
    pub scale: f32,
}

impl VisualStyle {
    /// Resting style used before anything has been generated or loaded.
    pub fn initial(palette: &Palette) -> Self {
        Self {
            fill: palette.first().clone(),
            border_color: palette.second().clone(),
            border_width: 4,
            border_pattern: BorderPattern::Solid,
            size: 300,
            rotation: 0,
            scale: RESTING_SCALE,
        }
    }

    /// Copy shrunk to half size and turned by `delta` degrees, counted from
    /// the displayed angle.
    pub fn contracted(&self, delta: u32) -> Self {
        Self {
            rotation: self.display_rotation() + delta % 360,
            scale: CONTRACTED_SCALE,
            ..self.clone()
        }
    }

    /// Copy back at full scale, keeping everything else.
    pub fn expanded(&self) -> Self {
        Self {
            scale: RESTING_SCALE,
            ..self.clone()
        }
    }

    pub fn display_rotation(&self) -> u32 {
        self.rotation % 360
    }

    pub fn is_contracted(&self) -> bool {
        self.scale < RESTING_SCALE
    }
}

/// Draws a fresh resting style from `palette`. Every field is independent
/// and uniform over its range.
pub fn generate<R: Rng + ?Sized>(palette: &Palette, rng: &mut R) -> VisualStyle {
    VisualStyle {
        fill: palette.pick(rng),
        border_color: palette.pick(rng),
        border_width: rng.gen_range(MIN_BORDER_WIDTH..=MAX_BORDER_WIDTH),
        border_pattern: BorderPattern::random(rng),
        size: rng.gen_range(MIN_SIZE..MAX_SIZE),
        rotation: rng.gen_range(0..360),
        scale: RESTING_SCALE,
    }
}

/// One named palette phase of the color cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub colors: Palette,
}

impl Stage {
    pub fn new(name: impl Into<String>, colors: &[&str]) -> Result<Self> {
        let name = name.into();
        let colors = Palette::from_hex(colors)
            .map_err(|_| AlchemyError::InvalidPalette(name.clone()))?;
        Ok(Self { name, colors })
    }
}

/// The four alchemical stages, blackening to reddening.
pub fn alchemical_stages() -> Vec<Stage> {
    [
        ("nigredo", ["#000000", "#1a1a1a", "#333333"]),
        ("albedo", ["#ffffff", "#f0f0f0", "#e0e0e0"]),
        ("citrinitas", ["#ffd700", "#ffec8b", "#f0e68c"]),
        ("rubedo", ["#ff0000", "#dc143c", "#b22222"]),
    ]
    .into_iter()
    .map(|(name, colors)| Stage {
        name: name.to_string(),
        colors: Palette {
            colors: colors.into_iter().map(Color::from).collect(),
        },
    })
    .collect()
}

/// Ordered stages with a cursor that wraps after the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCycle {
    stages: Vec<Stage>,
    index: usize,
}

impl StageCycle {
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        if stages.is_empty() {
            return Err(AlchemyError::msg("stage cycle needs at least one stage"));
        }
        Ok(Self { stages, index: 0 })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &Stage {
        &self.stages[self.index]
    }

    pub fn advance(&mut self) -> &Stage {
        self.index = (self.index + 1) % self.stages.len();
        &self.stages[self.index]
    }
}

/// Where generated colors come from: a fixed palette or the active stage.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSource {
    Flat(Palette),
    Stages(StageCycle),
}

impl ColorSource {
    pub fn palette(&self) -> &Palette {
        match self {
            ColorSource::Flat(palette) => palette,
            ColorSource::Stages(cycle) => &cycle.current().colors,
        }
    }

    pub fn stage(&self) -> Option<&Stage> {
        match self {
            ColorSource::Flat(_) => None,
            ColorSource::Stages(cycle) => Some(cycle.current()),
        }
    }

    pub fn stage_index(&self) -> Option<usize> {
        match self {
            ColorSource::Flat(_) => None,
            ColorSource::Stages(cycle) => Some(cycle.index()),
        }
    }

    /// Moves to the next stage. No-op for flat palettes.
    pub fn advance(&mut self) {
        if let ColorSource::Stages(cycle) = self {
            let stage = cycle.advance();
            tracing::debug!(stage = %stage.name, "advanced color stage");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// Strategy for a non-empty palette of hex colors.
    fn arb_palette() -> impl Strategy<Value = Palette> {
        proptest::collection::vec("#[0-9a-f]{6}", 1..6).prop_map(|colors| Palette {
            colors: colors.into_iter().map(Color::new).collect(),
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// Every generated field lies in its range and colors come from the palette.
        #[test]
        fn generated_styles_stay_in_range(palette in arb_palette(), seed in any::<u64>()) {
            let style = generate(&palette, &mut StdRng::seed_from_u64(seed));
            prop_assert!((MIN_BORDER_WIDTH..=MAX_BORDER_WIDTH).contains(&style.border_width));
            prop_assert!((MIN_SIZE..MAX_SIZE).contains(&style.size));
            prop_assert!(style.rotation < 360);
            prop_assert_eq!(style.scale, RESTING_SCALE);
            prop_assert!(palette.colors().contains(&style.fill));
            prop_assert!(palette.colors().contains(&style.border_color));
        }

        /// Repeated contractions keep the rotation bounded and turn by the delta.
        #[test]
        fn contraction_keeps_rotation_bounded(
            start in any::<u32>(),
            deltas in proptest::collection::vec(prop_oneof![Just(90u32), Just(180u32)], 1..64),
        ) {
            let palette = Palette::from_hex(&["#abcdef"]).unwrap();
            let mut style = VisualStyle { rotation: start, ..VisualStyle::initial(&palette) };
            for delta in deltas {
                let before = style.display_rotation();
                style = style.contracted(delta);
                prop_assert!(style.rotation < 720);
                prop_assert_eq!(style.display_rotation(), (before + delta) % 360);
            }
        }
    }

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let palette = Palette::from_hex(&["#111111", "#222222"]).unwrap();
        let a = generate(&palette, &mut StdRng::seed_from_u64(9));
        let b = generate(&palette, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn contraction_builds_new_snapshot() {
        let palette = Palette::from_hex(&["#abcdef"]).unwrap();
        let resting = VisualStyle::initial(&palette);
        let shrunk = resting.contracted(180);

        assert_eq!(resting.scale, 1.0);
        assert_eq!(resting.rotation, 0);
        assert_eq!(shrunk.scale, 0.5);
        assert_eq!(shrunk.rotation, 180);
        assert!(shrunk.is_contracted());

        let turned = shrunk.contracted(270).expanded();
        assert_eq!(turned.rotation, 450);
        assert_eq!(turned.display_rotation(), 90);
        assert_eq!(turned.scale, 1.0);
    }

    #[test]
    fn contraction_near_rotation_limit_does_not_overflow() {
        let palette = Palette::from_hex(&["#abcdef"]).unwrap();
        let worn = VisualStyle {
            rotation: u32::MAX,
            ..VisualStyle::initial(&palette)
        };
        let shrunk = worn.contracted(180);
        assert_eq!(shrunk.rotation, u32::MAX % 360 + 180);
        assert_eq!(shrunk.display_rotation(), (u32::MAX % 360 + 180) % 360);
    }

    #[test]
    fn single_color_palette_reuses_color_for_border() {
        let palette = Palette::from_hex(&["#abcdef"]).unwrap();
        let style = VisualStyle::initial(&palette);
        assert_eq!(style.fill, style.border_color);
    }

    #[test]
    fn empty_palettes_are_rejected() {
        assert!(matches!(
            Palette::new(Vec::new()),
            Err(AlchemyError::InvalidPalette(_))
        ));
        assert!(serde_json::from_str::<Palette>("[]").is_err());
        assert!(matches!(
            Stage::new("void", &[]),
            Err(AlchemyError::InvalidPalette(name)) if name == "void"
        ));
    }

    #[test]
    fn stage_cycle_wraps() {
        let mut cycle = StageCycle::new(alchemical_stages()).unwrap();
        assert_eq!(cycle.current().name, "nigredo");
        cycle.advance();
        cycle.advance();
        assert_eq!(cycle.current().name, "citrinitas");
        cycle.advance();
        cycle.advance();
        assert_eq!(cycle.index(), 0);
        assert_eq!(cycle.current().name, "nigredo");
    }

    #[test]
    fn border_pattern_names_round_trip() {
        for pattern in BorderPattern::ALL {
            assert_eq!(BorderPattern::from_css(pattern.as_css()), Some(pattern));
        }
        assert_eq!(BorderPattern::from_css("groove"), None);
    }
}
