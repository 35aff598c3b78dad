//! Panel configuration (v0.1)
//!
//! Option names follow the panel element attributes:
//!
//! ```yaml
//! ref: model
//! width: 240px
//! darkmode: true
//! autoupdate: true
//! tickspersecond: 10
//! callback: onChange
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CtrlError;

/// Refresh rate cap (ticks per second)
pub const MAX_TICKS_PER_SECOND: u32 = 60;

pub const DEFAULT_TICKS_PER_SECOND: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Global name `$` paths resolve against
    #[serde(rename = "ref")]
    pub reference: String,

    pub width: String,
    pub top: String,
    pub right: String,

    #[serde(rename = "darkmode")]
    pub dark_mode: bool,

    #[serde(rename = "autoupdate")]
    pub auto_update: bool,

    #[serde(rename = "tickspersecond")]
    pub ticks_per_second: u32,

    /// Derive controls from the root's shape when none are given
    #[serde(rename = "autogenerate")]
    pub auto_generate: bool,

    /// Name of a notifier registered on the scope
    pub callback: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            reference: String::new(),
            width: "200px".to_string(),
            top: "0px".to_string(),
            right: "0px".to_string(),
            dark_mode: false,
            auto_update: false,
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            auto_generate: false,
            callback: None,
        }
    }
}

/// Visual options handed to surfaces
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub width: String,
    pub top: String,
    pub right: String,
    pub dark_mode: bool,
}

impl PanelConfig {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Self::default()
        }
    }

    /// Parse YAML (or JSON, which YAML accepts)
    pub fn from_yaml(text: &str) -> Result<Self, CtrlError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CtrlError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Refresh rate clamped to 1..=60
    pub fn ticks(&self) -> u32 {
        self.ticks_per_second.clamp(1, MAX_TICKS_PER_SECOND)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.ticks()))
    }

    pub fn style(&self) -> Style {
        Style {
            width: self.width.clone(),
            top: self.top.clone(),
            right: self.right.clone(),
            dark_mode: self.dark_mode,
        }
    }
}
