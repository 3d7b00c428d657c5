//! Heading calibration against a known landmark
//!
//! The user points the device at a landmark and confirms. The difference
//! between the landmark's true bearing and the raw sensor heading becomes a
//! correction offset that is added to every later raw heading.

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::landmark::{LandmarkCatalog, LandmarkFrame};
use crate::math::{normalize_angle, shortest_angle_diff};

/// The active correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRecord {
    /// Correction in `(-180, 180]`
    pub offset_degrees: f64,
    pub landmark_key: String,
    pub applied_at_ms: u64,
}

/// Outcome of a successful calibration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    pub offset: f64,
    /// True bearing of the landmark
    pub actual_angle: f64,
    /// Uncorrected heading at the moment of calibration
    pub sensor_heading: f64,
    pub calibrated_heading: f64,
    pub landmark_key: String,
}

/// Owns the calibration record
#[derive(Debug, Clone, Default)]
pub struct CalibrationService {
    record: Option<CalibrationRecord>,
}

impl CalibrationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calibrate against a landmark
    ///
    /// `raw_heading` must be the uncorrected sensor heading. On failure the
    /// current record is left as it was; on success it is replaced.
    pub fn calibrate(
        &mut self,
        landmark_key: &str,
        catalog: &LandmarkCatalog,
        frame: &LandmarkFrame,
        raw_heading: Option<f64>,
        now_ms: u64,
    ) -> Result<Calibration, CalibrationError> {
        let landmark = catalog
            .get(landmark_key)
            .ok_or_else(|| CalibrationError::LandmarkNotFound(landmark_key.to_string()))?;
        let sensor_heading = raw_heading
            .filter(|h| h.is_finite())
            .ok_or(CalibrationError::SensorUnavailable)?;

        let actual_angle = frame.bearing(landmark);
        let offset = shortest_angle_diff(actual_angle, sensor_heading);
        let calibrated_heading = normalize_angle(sensor_heading + offset);

        if let Some(previous) = &self.record {
            tracing::debug!(
                previous = %previous.landmark_key,
                previous_offset = previous.offset_degrees,
                "replacing calibration"
            );
        }
        self.record = Some(CalibrationRecord {
            offset_degrees: offset,
            landmark_key: landmark_key.to_string(),
            applied_at_ms: now_ms,
        });

        tracing::info!(
            landmark = landmark_key,
            actual_angle,
            sensor_heading,
            offset,
            "heading calibrated"
        );

        Ok(Calibration {
            offset,
            actual_angle,
            sensor_heading,
            calibrated_heading,
            landmark_key: landmark_key.to_string(),
        })
    }

    /// Drop the active correction
    pub fn reset(&mut self) {
        if self.record.take().is_some() {
            tracing::info!("calibration reset");
        }
    }

    pub fn record(&self) -> Option<&CalibrationRecord> {
        self.record.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.record.is_some()
    }

    /// Active offset, zero when uncalibrated
    pub fn offset(&self) -> f64 {
        self.record.as_ref().map_or(0.0, |r| r.offset_degrees)
    }

    /// Correct a raw heading
    pub fn apply(&self, raw_heading: f64) -> f64 {
        match &self.record {
            Some(record) => normalize_angle(raw_heading + record.offset_degrees),
            None => raw_heading,
        }
    }
}
