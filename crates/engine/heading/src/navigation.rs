//! Navigation state coordinator
//!
//! Wires the sensor session, calibration and smoothing into the single
//! heading the display layer consumes.
//!
//! ```text
//! SensorSession -> raw heading -> CalibrationService -> HeadingSmoother -> display
//! ```

use devices::{AccessDecision, CapabilityKind, Clock, DeviceResult, MotionBackend, SensorEvent};

use crate::calibration::{Calibration, CalibrationRecord, CalibrationService};
use crate::config::NavigationConfig;
use crate::direction::{direction_strip, DirectionStrip, StripQuery};
use crate::error::{CalibrationError, ConfigResult};
use crate::landmark::LandmarkCatalog;
use crate::math::normalize_angle;
use crate::session::{HeadingSample, PermissionState, SensorInfo, SensorSession};
use crate::smoother::HeadingSmoother;

/// Produces the displayed heading
#[derive(Debug)]
pub struct Navigator {
    session: SensorSession,
    calibration: CalibrationService,
    smoother: HeadingSmoother,
    catalog: LandmarkCatalog,
    config: NavigationConfig,
    manual_mode: bool,
    manual_rotation: f64,
}

impl Navigator {
    /// Start a session on `backend` and build the pipeline around it
    ///
    /// The config is validated before the sensor is touched.
    pub fn new(
        backend: impl MotionBackend + 'static,
        clock: impl Clock + 'static,
        catalog: LandmarkCatalog,
        config: NavigationConfig,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let session = SensorSession::new(backend, clock, config.session);
        Self::with_session(session, catalog, config)
    }

    /// Build the pipeline around an existing session
    pub fn with_session(
        session: SensorSession,
        catalog: LandmarkCatalog,
        config: NavigationConfig,
    ) -> ConfigResult<Self> {
        config.validate()?;
        tracing::info!(
            landmarks = catalog.len(),
            state = %session.state(),
            "navigator ready"
        );
        Ok(Self {
            session,
            calibration: CalibrationService::new(),
            smoother: HeadingSmoother::new(config.smoothing),
            catalog,
            config,
            manual_mode: false,
            manual_rotation: 0.0,
        })
    }

    pub fn session(&self) -> &SensorSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SensorSession {
        &mut self.session
    }

    pub fn catalog(&self) -> &LandmarkCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn sensor_info(&self) -> SensorInfo {
        self.session.info()
    }

    pub fn permission_state(&self) -> PermissionState {
        self.session.permission_state()
    }

    /// Ask for sensor access; a no-op unless access is pending or refused
    pub async fn request_permission(&mut self) -> PermissionState {
        self.session.request_permission().await.permission_state()
    }

    /// Strategy an access request would target right now
    pub fn permission_target(&self) -> Option<CapabilityKind> {
        self.session.permission_target()
    }

    /// Feed the answer of an access request made by the host
    pub fn apply_permission(
        &mut self,
        kind: CapabilityKind,
        answer: DeviceResult<AccessDecision>,
    ) -> PermissionState {
        self.session.apply_permission(kind, answer).permission_state()
    }

    /// Route a backend event to the session
    pub fn handle_event(&mut self, event: SensorEvent) -> Option<HeadingSample> {
        self.session.handle_event(event)
    }

    /// Latest uncorrected heading
    pub fn raw_heading(&self) -> Option<f64> {
        self.session.heading().map(|h| h.value)
    }

    /// Latest heading with the calibration offset applied
    pub fn calibrated_heading(&self) -> Option<f64> {
        self.raw_heading().map(|raw| self.calibration.apply(raw))
    }

    /// Advance one render frame and return the displayed heading
    ///
    /// Also checks the session's no-data deadline.
    pub fn tick(&mut self) -> f64 {
        self.session.poll();

        if self.manual_mode {
            self.smoother.reset(self.manual_rotation);
            return self.manual_rotation;
        }

        if self.session.is_listening() {
            if let Some(target) = self.calibrated_heading() {
                return self.smoother.update(target);
            }
        }
        self.smoother.current()
    }

    /// Displayed heading as of the last tick
    pub fn smoothed_heading(&self) -> f64 {
        if self.manual_mode {
            self.manual_rotation
        } else {
            self.smoother.current()
        }
    }

    /// Calibrate against a landmark using the current raw heading
    pub fn calibrate(&mut self, landmark_key: &str) -> Result<Calibration, CalibrationError> {
        let now_ms = self.session.now_ms();
        let raw = self.raw_heading();
        let result = self.calibration.calibrate(
            landmark_key,
            &self.catalog,
            &self.config.frame,
            raw,
            now_ms,
        );
        if let Err(e) = &result {
            tracing::warn!(landmark = landmark_key, error = %e, "calibration refused");
        }
        result
    }

    pub fn reset_calibration(&mut self) {
        self.calibration.reset();
    }

    pub fn calibration_state(&self) -> Option<&CalibrationRecord> {
        self.calibration.record()
    }

    pub fn is_manual_mode(&self) -> bool {
        self.manual_mode
    }

    /// Switch between sensor and manual control
    ///
    /// Sensor headings are ignored for display while manual control is on.
    pub fn set_manual_mode(&mut self, enabled: bool) {
        if self.manual_mode != enabled {
            tracing::info!(manual = enabled, "rotation control changed");
        }
        self.manual_mode = enabled;
        if enabled {
            self.smoother.reset(self.manual_rotation);
        }
    }

    pub fn manual_rotation(&self) -> f64 {
        self.manual_rotation
    }

    pub fn set_manual_rotation(&mut self, degrees: f64) {
        if degrees.is_finite() {
            self.manual_rotation = normalize_angle(degrees);
        }
    }

    /// Direction strip data around the displayed heading
    pub fn landmark_directions(&self, selected: &[String], my_selected: &[String]) -> DirectionStrip {
        direction_strip(
            &self.catalog,
            &self.config.frame,
            StripQuery {
                camera_rotation: self.smoothed_heading(),
                selected,
                my_selected,
                view_angle_range: self.config.view.view_angle_range,
            },
        )
    }

    /// Stop sensing and release the subscription
    pub fn teardown(&mut self) {
        self.session.teardown();
    }
}
