//! Sensor session state machine
//!
//! A [`SensorSession`] owns the single active sensing strategy. It probes the
//! platform, asks for access when the platform gates it, subscribes through
//! the [`MotionBackend`], watches for a no-data timeout and falls back from
//! the absolute-orientation sensor to plain device-orientation events when
//! the primary strategy fails.
//!
//! ```text
//! Idle -> Checking -> NotSupported
//!                  -> NeedsPermission -> Granted -> Listening
//!                  -> Granted -> Listening
//! Listening --timeout/error--> (fallback) NeedsPermission | Listening
//!                          \-> NoSensor
//! NeedsPermission --refused--> Denied (or fallback for the fused sensor)
//! ```
//!
//! Timers are deadlines checked by [`SensorSession::poll`], so the session
//! never owns a callback that could outlive it. Leaving a listening state
//! always releases the subscription and clears the deadline first.

use std::fmt;

use devices::{
    AccessDecision, CapabilityDetector, CapabilityKind, Clock, DeviceResult, EulerAngles,
    MotionBackend, PlatformCapabilities, PlatformProfile, RawReading, SensorEvent,
    SensorEventKind, SubscriptionId,
};
use glam::DQuat;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::math;

/// Internal session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    /// Not started, or torn down
    Idle,
    /// Probing the platform
    Checking,
    /// Waiting for a caller-initiated access request
    NeedsPermission,
    /// No sensing capability at all (terminal)
    NotSupported,
    /// Access granted, subscription not yet running
    Granted,
    /// Subscribed and waiting for or receiving data
    Listening,
    /// Access refused; the caller may ask again
    Denied,
    /// Every strategy failed (terminal)
    NoSensor,
}

impl SessionState {
    /// State as presented to the UI
    pub fn permission_state(&self) -> PermissionState {
        match self {
            Self::Idle | Self::Checking => PermissionState::Checking,
            Self::NeedsPermission => PermissionState::NeedsPermission,
            Self::Granted | Self::Listening => PermissionState::Granted,
            Self::Denied => PermissionState::Denied,
            Self::NotSupported => PermissionState::NotSupported,
            Self::NoSensor => PermissionState::NoSensor,
        }
    }

    /// No further transition happens without a teardown
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotSupported | Self::NoSensor)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Checking => write!(f, "Checking"),
            Self::NeedsPermission => write!(f, "NeedsPermission"),
            Self::NotSupported => write!(f, "NotSupported"),
            Self::Granted => write!(f, "Granted"),
            Self::Listening => write!(f, "Listening"),
            Self::Denied => write!(f, "Denied"),
            Self::NoSensor => write!(f, "NoSensor"),
        }
    }
}

/// Permission state shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionState {
    Checking,
    NeedsPermission,
    Granted,
    Denied,
    NotSupported,
    NoSensor,
}

/// One converted heading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingSample {
    /// Degrees in `[0, 360)`
    pub value: f64,
    pub timestamp_ms: u64,
}

/// Snapshot of the session for display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorInfo {
    pub sensor_type: CapabilityKind,
    pub permission_state: PermissionState,
    /// Uncorrected heading
    pub compass_heading: Option<f64>,
    pub orientation: Option<EulerAngles>,
    pub quaternion: Option<DQuat>,
    pub is_listening: bool,
    pub cardinal: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    /// No data before the deadline
    Timeout,
    /// Sensor error event or a sensor that would not start
    Error,
}

/// Owns the active sensing strategy
pub struct SensorSession {
    backend: Box<dyn MotionBackend>,
    clock: Box<dyn Clock>,
    config: SessionConfig,
    caps: PlatformCapabilities,
    profile: Option<PlatformProfile>,
    kind: CapabilityKind,
    state: SessionState,
    subscription: Option<SubscriptionId>,
    deadline_ms: Option<u64>,
    retry_count: u32,
    heading: Option<HeadingSample>,
    orientation: Option<EulerAngles>,
    quaternion: Option<DQuat>,
}

impl SensorSession {
    /// Create a session and run capability detection
    pub fn new(
        backend: impl MotionBackend + 'static,
        clock: impl Clock + 'static,
        config: SessionConfig,
    ) -> Self {
        let mut session = Self {
            backend: Box::new(backend),
            clock: Box::new(clock),
            config,
            caps: PlatformCapabilities::none(),
            profile: None,
            kind: CapabilityKind::Unsupported,
            state: SessionState::Idle,
            subscription: None,
            deadline_ms: None,
            retry_count: 0,
            heading: None,
            orientation: None,
            quaternion: None,
        };
        session.start();
        session
    }

    /// Force a heading convention instead of the detected one
    pub fn with_profile(mut self, profile: PlatformProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn permission_state(&self) -> PermissionState {
        self.state.permission_state()
    }

    /// Strategy currently in use
    pub fn capability(&self) -> CapabilityKind {
        self.kind
    }

    pub fn capabilities(&self) -> &PlatformCapabilities {
        &self.caps
    }

    /// Heading convention applied to Euler readings
    pub fn profile(&self) -> PlatformProfile {
        self.profile.unwrap_or(self.caps.profile)
    }

    pub fn is_listening(&self) -> bool {
        self.state == SessionState::Listening
    }

    /// Failures consumed from the retry budget
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// A no-data timeout is armed
    pub fn timeout_pending(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    /// Latest uncorrected heading
    pub fn heading(&self) -> Option<HeadingSample> {
        self.heading
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn info(&self) -> SensorInfo {
        let compass_heading = self.heading.map(|h| h.value);
        SensorInfo {
            sensor_type: self.kind,
            permission_state: self.permission_state(),
            compass_heading,
            orientation: self.orientation,
            quaternion: self.quaternion,
            is_listening: self.is_listening(),
            cardinal: compass_heading.map(math::cardinal),
        }
    }

    /// Probe the platform and pick a strategy
    ///
    /// Only acts from `Idle`; returns the resulting state.
    pub fn start(&mut self) -> SessionState {
        if self.state != SessionState::Idle {
            return self.state;
        }

        self.state = SessionState::Checking;
        self.caps = self.backend.probe();
        self.kind = CapabilityDetector::detect(&self.caps);
        self.retry_count = 0;
        tracing::debug!(
            kind = %self.kind,
            profile = ?self.caps.profile,
            "motion capability detected"
        );

        if self.kind == CapabilityKind::Unsupported {
            tracing::warn!("no orientation sensing available");
            self.state = SessionState::NotSupported;
        } else if CapabilityDetector::requires_permission(self.kind, &self.caps) {
            self.state = SessionState::NeedsPermission;
        } else {
            self.begin_listening();
        }
        self.state
    }

    /// Strategy an access request would target right now
    pub fn permission_target(&self) -> Option<CapabilityKind> {
        match self.state {
            SessionState::NeedsPermission | SessionState::Denied => Some(self.kind),
            _ => None,
        }
    }

    /// Ask the platform for access to the current strategy
    ///
    /// A no-op outside `NeedsPermission` and `Denied`.
    pub async fn request_permission(&mut self) -> SessionState {
        let Some(kind) = self.permission_target() else {
            return self.state;
        };
        let answer = self.backend.request_access(kind).await;
        self.apply_permission(kind, answer)
    }

    /// Feed the answer of an access request made outside the session
    ///
    /// Answers for a strategy that is no longer current, or that arrive
    /// after the session left the permission states, are dropped.
    pub fn apply_permission(
        &mut self,
        kind: CapabilityKind,
        answer: DeviceResult<AccessDecision>,
    ) -> SessionState {
        if self.permission_target() != Some(kind) {
            tracing::debug!(kind = %kind, state = %self.state, "stale permission answer ignored");
            return self.state;
        }

        let decision = answer.unwrap_or_else(|e| {
            tracing::warn!(kind = %kind, error = %e, "permission request failed");
            AccessDecision::Denied
        });

        match decision {
            AccessDecision::Granted => {
                tracing::info!(kind = %kind, "orientation access granted");
                if kind == CapabilityDetector::detect(&self.caps) {
                    self.retry_count = 0;
                }
                self.begin_listening();
            }
            AccessDecision::Denied => {
                if self.fallback_target().is_some() {
                    tracing::info!(kind = %kind, "access refused, trying fallback sensor");
                    self.fall_back();
                } else {
                    tracing::warn!(kind = %kind, "orientation access denied");
                    self.state = SessionState::Denied;
                }
            }
        }
        self.state
    }

    /// Check the no-data deadline
    ///
    /// Call from the host's timer or render loop.
    pub fn poll(&mut self) -> SessionState {
        if self.state == SessionState::Listening {
            if let Some(deadline) = self.deadline_ms {
                if self.clock.now_ms() >= deadline {
                    self.deadline_ms = None;
                    tracing::warn!(
                        kind = %self.kind,
                        timeout_ms = self.config.data_timeout_ms,
                        "no sensor data before timeout"
                    );
                    self.fail(Failure::Timeout);
                }
            }
        }
        self.state
    }

    /// Route a backend event into the session
    ///
    /// Events from a released subscription are ignored. Returns the new
    /// heading sample if the event produced one.
    pub fn handle_event(&mut self, event: SensorEvent) -> Option<HeadingSample> {
        if self.state != SessionState::Listening || self.subscription != Some(event.subscription)
        {
            tracing::trace!(subscription = event.subscription.0, "stale sensor event ignored");
            return None;
        }

        match event.kind {
            SensorEventKind::Reading(reading) => self.accept_reading(reading),
            SensorEventKind::Error(fault) => {
                tracing::warn!(kind = %self.kind, error = %fault.message, "sensor error");
                self.fail(Failure::Error);
                None
            }
        }
    }

    /// Release everything and return to `Idle`
    ///
    /// Safe to call from any state, any number of times.
    pub fn teardown(&mut self) {
        self.release();
        self.retry_count = 0;
        self.orientation = None;
        self.quaternion = None;
        if self.state != SessionState::Idle {
            tracing::debug!(state = %self.state, "sensor session torn down");
            self.state = SessionState::Idle;
        }
    }

    fn accept_reading(&mut self, reading: RawReading) -> Option<HeadingSample> {
        if reading.has_data() && self.deadline_ms.take().is_some() {
            tracing::info!(kind = %self.kind, "first sensor data received");
        }

        match reading {
            RawReading::Euler(sample) => self.orientation = Some(sample.euler),
            RawReading::Quaternion(q) => self.quaternion = Some(q),
        }

        let raw = math::reading_heading(&reading, self.profile())?;
        let value = if self.config.round_whole_degrees {
            math::round_heading(raw)
        } else {
            math::normalize_angle(raw)
        };

        let sample = HeadingSample {
            value,
            timestamp_ms: self.clock.now_ms(),
        };
        tracing::trace!(heading = value, "heading sample");
        self.heading = Some(sample);
        Some(sample)
    }

    fn begin_listening(&mut self) {
        self.release();
        self.state = SessionState::Granted;

        match self.backend.subscribe(self.kind) {
            Ok(id) => {
                self.subscription = Some(id);
                self.deadline_ms = Some(
                    self.clock
                        .now_ms()
                        .saturating_add(self.config.data_timeout_ms),
                );
                self.state = SessionState::Listening;
                tracing::info!(kind = %self.kind, subscription = id.0, "listening started");
            }
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "sensor failed to start");
                self.fail(Failure::Error);
            }
        }
    }

    /// Consume one retry and fall back or give up
    ///
    /// A silent sensor always gets its one fallback; the retry budget only
    /// limits sensor errors.
    fn fail(&mut self, failure: Failure) {
        self.retry_count += 1;

        let within_budget = match failure {
            Failure::Timeout => true,
            Failure::Error => self.retry_count < self.config.retry_budget,
        };
        if within_budget && self.fallback_target().is_some() {
            self.fall_back();
        } else {
            self.release();
            self.state = SessionState::NoSensor;
            tracing::warn!(
                kind = %self.kind,
                retries = self.retry_count,
                "no usable orientation sensor"
            );
        }
    }

    fn fallback_target(&self) -> Option<CapabilityKind> {
        self.kind.fallback().filter(|next| match next {
            CapabilityKind::DeviceOrientationEvent => self.caps.device_orientation,
            CapabilityKind::AbsoluteOrientation => self.caps.absolute_orientation,
            CapabilityKind::Unsupported => false,
        })
    }

    fn fall_back(&mut self) {
        self.release();
        // Readings from the abandoned strategy must not leak into the next snapshot
        self.orientation = None;
        self.quaternion = None;
        let Some(next) = self.fallback_target() else {
            self.state = SessionState::NoSensor;
            return;
        };

        tracing::info!(from = %self.kind, to = %next, "falling back");
        self.kind = next;
        if CapabilityDetector::requires_permission(next, &self.caps) {
            self.state = SessionState::NeedsPermission;
        } else {
            self.begin_listening();
        }
    }

    /// Drop the subscription and the pending deadline
    fn release(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.backend.unsubscribe(id);
            tracing::debug!(subscription = id.0, "subscription released");
        }
        self.deadline_ms = None;
        self.heading = None;
    }
}

impl Drop for SensorSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for SensorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorSession")
            .field("state", &self.state)
            .field("kind", &self.kind)
            .field("subscription", &self.subscription)
            .field("deadline_ms", &self.deadline_ms)
            .field("retry_count", &self.retry_count)
            .field("heading", &self.heading)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devices::{ManualClock, NullBackend, OrientationSample, ScriptedBackend};
    use futures::executor::block_on;

    fn fused_caps() -> PlatformCapabilities {
        PlatformCapabilities {
            absolute_orientation: true,
            device_orientation: true,
            orientation_permission_api: false,
            profile: PlatformProfile::Android,
        }
    }

    fn session_with(caps: PlatformCapabilities) -> (SensorSession, ScriptedBackend, ManualClock) {
        let backend = ScriptedBackend::new(caps);
        let clock = ManualClock::new();
        let session = SensorSession::new(backend.clone(), clock.clone(), SessionConfig::default());
        (session, backend, clock)
    }

    #[test]
    fn test_null_backend_not_supported() {
        let session = SensorSession::new(NullBackend::new(), ManualClock::new(), SessionConfig::default());
        assert_eq!(session.state(), SessionState::NotSupported);
        assert_eq!(session.permission_state(), PermissionState::NotSupported);
        assert!(session.state().is_terminal());
    }

    #[test]
    fn test_ungated_orientation_listens_immediately() {
        let (session, backend, _clock) = session_with(PlatformCapabilities {
            device_orientation: true,
            ..Default::default()
        });
        assert_eq!(session.state(), SessionState::Listening);
        assert_eq!(session.capability(), CapabilityKind::DeviceOrientationEvent);
        assert!(session.timeout_pending());
        assert_eq!(backend.active_count(), 1);
    }

    #[test]
    fn test_fused_sensor_needs_permission() {
        let (mut session, backend, _clock) = session_with(fused_caps());
        assert_eq!(session.state(), SessionState::NeedsPermission);
        assert_eq!(backend.active_count(), 0);

        assert_eq!(block_on(session.request_permission()), SessionState::Listening);
        assert_eq!(
            backend.access_requests(),
            vec![CapabilityKind::AbsoluteOrientation]
        );
    }

    #[test]
    fn test_request_permission_noop_while_listening() {
        let (mut session, backend, _clock) = session_with(PlatformCapabilities {
            device_orientation: true,
            ..Default::default()
        });
        assert_eq!(block_on(session.request_permission()), SessionState::Listening);
        assert!(backend.access_requests().is_empty());
    }

    #[test]
    fn test_quaternion_reading_clears_timeout() {
        let (mut session, backend, clock) = session_with(fused_caps());
        block_on(session.request_permission());

        let event = backend
            .reading(
                CapabilityKind::AbsoluteOrientation,
                RawReading::Quaternion(DQuat::from_rotation_z(-30f64.to_radians())),
            )
            .unwrap();
        let sample = session.handle_event(event).unwrap();
        assert_eq!(sample.value, 30.0);
        assert!(!session.timeout_pending());

        // A late deadline check is a no-op
        clock.advance(10_000);
        assert_eq!(session.poll(), SessionState::Listening);
        assert_eq!(session.info().compass_heading, Some(30.0));
        assert_eq!(session.info().cardinal, Some("NE"));
    }

    #[test]
    fn test_empty_reading_keeps_timeout_armed() {
        let (mut session, backend, clock) = session_with(PlatformCapabilities {
            device_orientation: true,
            ..Default::default()
        });

        let empty = backend
            .reading(
                CapabilityKind::DeviceOrientationEvent,
                RawReading::Euler(OrientationSample::default()),
            )
            .unwrap();
        assert!(session.handle_event(empty).is_none());
        assert!(session.timeout_pending());

        clock.advance(3000);
        assert_eq!(session.poll(), SessionState::NoSensor);
        assert_eq!(backend.active_count(), 0);
    }

    #[test]
    fn test_poll_before_deadline() {
        let (mut session, _backend, clock) = session_with(PlatformCapabilities {
            device_orientation: true,
            ..Default::default()
        });
        clock.advance(2999);
        assert_eq!(session.poll(), SessionState::Listening);
        assert!(session.timeout_pending());
    }

    #[test]
    fn test_euler_heading_rounded() {
        let (mut session, backend, _clock) = session_with(PlatformCapabilities {
            device_orientation: true,
            profile: PlatformProfile::Unknown,
            ..Default::default()
        });

        let reading = RawReading::Euler(OrientationSample::from_euler(EulerAngles::new(
            29.6, 10.0, 0.0,
        )));
        let event = backend
            .reading(CapabilityKind::DeviceOrientationEvent, reading)
            .unwrap();
        assert_eq!(session.handle_event(event).map(|s| s.value), Some(330.0));
        assert_eq!(
            session.info().orientation,
            Some(EulerAngles::new(29.6, 10.0, 0.0))
        );
    }

    #[test]
    fn test_profile_override() {
        let (session, _backend, _clock) = session_with(PlatformCapabilities {
            device_orientation: true,
            profile: PlatformProfile::Android,
            ..Default::default()
        });
        let session = session.with_profile(PlatformProfile::Ios);
        assert_eq!(session.profile(), PlatformProfile::Ios);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let (mut session, backend, _clock) = session_with(PlatformCapabilities {
            device_orientation: true,
            ..Default::default()
        });
        session.teardown();
        session.teardown();

        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.timeout_pending());
        assert_eq!(backend.active_count(), 0);
        assert_eq!(backend.unsubscribe_calls(), 1);

        // Restart from Idle
        assert_eq!(session.start(), SessionState::Listening);
        assert_eq!(backend.active_count(), 1);
    }

    #[test]
    fn test_drop_releases_subscription() {
        let backend = ScriptedBackend::new(PlatformCapabilities {
            device_orientation: true,
            ..Default::default()
        });
        {
            let _session =
                SensorSession::new(backend.clone(), ManualClock::new(), SessionConfig::default());
            assert_eq!(backend.active_count(), 1);
        }
        assert_eq!(backend.active_count(), 0);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::NeedsPermission.to_string(), "NeedsPermission");
        assert_eq!(
            serde_json::to_value(PermissionState::NoSensor).unwrap(),
            "no-sensor"
        );
    }
}
