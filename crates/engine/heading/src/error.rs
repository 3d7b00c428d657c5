//! Error types for the heading engine

use serde::Serialize;
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Why a calibration attempt was refused
///
/// A refused attempt never touches the stored calibration.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", content = "landmarkKey", rename_all = "kebab-case")]
pub enum CalibrationError {
    /// Landmark key is not in the catalog
    #[error("landmark not found: {0}")]
    LandmarkNotFound(String),

    /// No raw heading has been observed yet
    #[error("sensor unavailable: no heading sample yet")]
    SensorUnavailable,
}

impl CalibrationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::LandmarkNotFound(_) => "landmark-not-found",
            Self::SensorUnavailable => "sensor-unavailable",
        }
    }
}

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value outside its allowed range
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors that can occur while loading the landmark catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_error_codes() {
        let missing = CalibrationError::LandmarkNotFound("tower".into());
        assert_eq!(missing.code(), "landmark-not-found");
        assert_eq!(missing.to_string(), "landmark not found: tower");
        assert_eq!(CalibrationError::SensorUnavailable.code(), "sensor-unavailable");
    }

    #[test]
    fn test_calibration_error_serializes_code() {
        let json = serde_json::to_value(CalibrationError::LandmarkNotFound("tower".into())).unwrap();
        assert_eq!(json["error"], "landmark-not-found");
        assert_eq!(json["landmarkKey"], "tower");
    }
}
