//! Navigation configuration
//!
//! Tunables for the sensor session, the smoother, the direction strip and
//! the landmark frame. Every section falls back to its defaults, so a
//! partial TOML file is valid:
//!
//! ```toml
//! [session]
//! data_timeout_ms = 2000
//!
//! [smoothing]
//! interpolation_speed = 0.2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::landmark::LandmarkFrame;
use crate::smoother::SmoothingConfig;

/// Sensor session tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// No-data timeout after listening starts
    pub data_timeout_ms: u64,
    /// Failures tolerated before the session gives up on sensors
    pub retry_budget: u32,
    /// Round every heading to whole degrees
    pub round_whole_degrees: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_timeout_ms: 3000,
            retry_budget: 2,
            round_whole_degrees: true,
        }
    }
}

/// Landmark direction strip tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Half-width of the visible strip in degrees
    pub view_angle_range: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            view_angle_range: 90.0,
        }
    }
}

/// Full navigation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub session: SessionConfig,
    pub smoothing: SmoothingConfig,
    pub view: ViewConfig,
    pub frame: LandmarkFrame,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            smoothing: SmoothingConfig::navigation(),
            view: ViewConfig::default(),
            frame: LandmarkFrame::navigation(),
        }
    }
}

impl NavigationConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "navigation config loaded");
        Ok(config)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check every value against its allowed range
    pub fn validate(&self) -> ConfigResult<()> {
        let smoothing = &self.smoothing;
        check_speed("smoothing.interpolation_speed", smoothing.interpolation_speed)?;
        check_speed("smoothing.max_speed", smoothing.max_speed)?;
        check_non_negative("smoothing.threshold", smoothing.threshold)?;
        check_non_negative("smoothing.snap_threshold", smoothing.snap_threshold)?;

        if self.session.data_timeout_ms == 0 {
            return Err(invalid("session.data_timeout_ms", "must be positive"));
        }
        if self.session.retry_budget == 0 {
            return Err(invalid("session.retry_budget", "must be at least 1"));
        }

        let range = self.view.view_angle_range;
        if !(range > 0.0 && range <= 180.0) {
            return Err(invalid(
                "view.view_angle_range",
                format!("{range} is outside (0, 180]"),
            ));
        }

        let scale = self.frame.scale;
        if !(scale.sx.is_finite() && scale.sz.is_finite() && self.frame.yaw_rad.is_finite()) {
            return Err(invalid("frame", "scale and yaw must be finite"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_speed(field: &'static str, value: f64) -> ConfigResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is outside (0, 1]")))
    }
}

fn check_non_negative(field: &'static str, value: f64) -> ConfigResult<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is negative")))
    }
}
