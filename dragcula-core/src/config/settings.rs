//! Application settings
//!
//! All sections use `#[serde(default)]` so that a partial (or empty)
//! `settings.toml` still loads.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dnd::DropConfig;
use crate::error::{ConfigError, ConfigResult};

/// Root settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Drag-and-drop engine settings
    pub dnd: DndSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl AppSettings {
    /// Checks every section for out-of-range values
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        self.dnd.validate()
    }
}

/// Drag-and-drop engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DndSettings {
    /// Row height used by index-aware zones, in pixels
    pub row_height: f64,
    /// Fraction of a row treated as the before/after band
    pub drop_zone_ratio: f64,
    /// Upper bound on how long a drop may wait for its handler to settle.
    ///
    /// `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_timeout_ms: Option<u64>,
    /// Skip ancestry resolution while the hovered element is unchanged
    pub hover_cache: bool,
}

impl Default for DndSettings {
    fn default() -> Self {
        let drop = DropConfig::default();
        Self {
            row_height: drop.row_height,
            drop_zone_ratio: drop.drop_zone_ratio,
            drop_timeout_ms: None,
            hover_cache: true,
        }
    }
}

impl DndSettings {
    /// Row geometry for index-aware zones
    #[must_use]
    pub const fn drop_config(&self) -> DropConfig {
        DropConfig {
            row_height: self.row_height,
            drop_zone_ratio: self.drop_zone_ratio,
        }
    }

    /// Drop settlement timeout, if any
    #[must_use]
    pub fn drop_timeout(&self) -> Option<Duration> {
        self.drop_timeout_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> ConfigResult<()> {
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            return Err(ConfigError::Validation {
                field: "dnd.row_height".to_string(),
                reason: format!("must be a positive number, got {}", self.row_height),
            });
        }
        if !(0.0..=0.5).contains(&self.drop_zone_ratio) {
            return Err(ConfigError::Validation {
                field: "dnd.drop_zone_ratio".to_string(),
                reason: format!("must be within 0.0..=0.5, got {}", self.drop_zone_ratio),
            });
        }
        if self.drop_timeout_ms == Some(0) {
            return Err(ConfigError::Validation {
                field: "dnd.drop_timeout_ms".to_string(),
                reason: "must be greater than zero when set".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level name (`error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
    /// `EnvFilter` directive overriding `level`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Write logs to this file instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            filter: None,
            file: None,
        }
    }
}
