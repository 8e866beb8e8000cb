use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    style::{alchemical_stages, ColorSource, Palette, Stage, StageCycle},
    Result,
};

/// Key the last style is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "alchemyStyle";

/// Top-level configuration structure for the widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub timing: TimingConfig,
    pub gesture: GestureConfig,
    pub palette: PaletteConfig,
    pub storage_key: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            gesture: GestureConfig::default(),
            palette: PaletteConfig::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl WidgetConfig {
    /// Reads a JSON configuration file. Fields that are left out keep their
    /// defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        tracing::debug!(?path, "loaded widget configuration");
        Ok(config)
    }
}

/// Delays of the transition sequence and the auto-cycle period, in
/// milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub contract_ms: u64,
    pub settle_ms: u64,
    pub auto_cycle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            contract_ms: 300,
            settle_ms: 500,
            auto_cycle_ms: 3_000,
        }
    }
}

/// Gesture recognition thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Minimum horizontal travel, in logical pixels, that counts as a swipe.
    pub swipe_threshold: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: 50.0,
        }
    }
}

/// Colors the generator draws from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PaletteConfig {
    Flat { colors: Palette },
    Stages { stages: Vec<Stage> },
}

impl Default for PaletteConfig {
    fn default() -> Self {
        PaletteConfig::Stages {
            stages: alchemical_stages(),
        }
    }
}

impl PaletteConfig {
    pub fn build(&self) -> Result<ColorSource> {
        match self {
            PaletteConfig::Flat { colors } => Ok(ColorSource::Flat(colors.clone())),
            PaletteConfig::Stages { stages } => {
                Ok(ColorSource::Stages(StageCycle::new(stages.clone())?))
            }
        }
    }
}
