//! Raw motion sensor samples
//!
//! This module provides the types a backend emits while a subscription is
//! live: Euler-angle orientation events, fused-sensor quaternions, and
//! sensor faults.

use glam::DQuat;
use serde::{Deserialize, Serialize};

/// Device orientation as reported by an orientation event
///
/// Angles are in degrees. Any axis may be unknown on a given platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Rotation around the Z axis (0-360)
    pub alpha: Option<f64>,
    /// Rotation around the X axis (-180 to 180, front-back tilt)
    pub beta: Option<f64>,
    /// Rotation around the Y axis (-90 to 90, left-right tilt)
    pub gamma: Option<f64>,
}

impl EulerAngles {
    /// Create a fully known orientation
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
        }
    }

    /// An orientation with every axis unknown
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Check if at least one axis is known
    pub fn has_any(&self) -> bool {
        self.alpha.is_some() || self.beta.is_some() || self.gamma.is_some()
    }

    /// All three axes, if every one is known
    pub fn complete(&self) -> Option<(f64, f64, f64)> {
        Some((self.alpha?, self.beta?, self.gamma?))
    }
}

/// One device-orientation event
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    /// Euler angles of the event
    pub euler: EulerAngles,
    /// Compass heading supplied by the platform itself, if any
    pub native_heading: Option<f64>,
}

impl OrientationSample {
    /// Create a sample without a native heading
    pub fn from_euler(euler: EulerAngles) -> Self {
        Self {
            euler,
            native_heading: None,
        }
    }

    /// Attach a platform-supplied compass heading
    pub fn with_native_heading(mut self, heading: f64) -> Self {
        self.native_heading = Some(heading);
        self
    }
}

/// A single reading from the active capability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RawReading {
    /// Device-orientation event sample
    Euler(OrientationSample),
    /// Fused absolute-orientation quaternion (x, y, z, w)
    Quaternion(DQuat),
}

impl RawReading {
    /// Whether this reading carries any usable orientation data
    ///
    /// Some browsers fire one orientation event with every axis null when
    /// no sensor exists; such events do not count as data.
    pub fn has_data(&self) -> bool {
        match self {
            Self::Euler(sample) => sample.euler.has_any() || sample.native_heading.is_some(),
            Self::Quaternion(q) => q.is_finite(),
        }
    }
}

/// Identifies one live subscription handed out by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// A sensor fault reported through a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorFault {
    /// Platform-provided description (e.g. `NotReadableError`)
    pub message: String,
}

impl SensorFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Payload of a sensor event
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEventKind {
    /// New reading
    Reading(RawReading),
    /// Runtime sensor error
    Error(SensorFault),
}

/// Event routed from a backend subscription into a sensor session
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    /// Subscription that produced the event
    pub subscription: SubscriptionId,
    /// What happened
    pub kind: SensorEventKind,
}

impl SensorEvent {
    /// Create a reading event
    pub fn reading(subscription: SubscriptionId, reading: RawReading) -> Self {
        Self {
            subscription,
            kind: SensorEventKind::Reading(reading),
        }
    }

    /// Create an error event
    pub fn error(subscription: SubscriptionId, fault: SensorFault) -> Self {
        Self {
            subscription,
            kind: SensorEventKind::Error(fault),
        }
    }
}
