//! Capability detection and platform profiles
//!
//! Decides which motion-sensing strategy a session starts with and which
//! heading formula applies to the platform's device-orientation samples.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Motion-sensing capability backing a sensor session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    /// Fused absolute-orientation sensor reporting quaternions
    AbsoluteOrientation,
    /// Device-orientation event stream reporting Euler angles
    #[serde(rename = "device-orientation")]
    DeviceOrientationEvent,
    /// Neither API exists
    Unsupported,
}

impl CapabilityKind {
    /// Stable string form, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AbsoluteOrientation => "absolute-orientation",
            Self::DeviceOrientationEvent => "device-orientation",
            Self::Unsupported => "unsupported",
        }
    }

    /// Whether a lower-fidelity strategy exists to fall back to
    pub fn fallback(&self) -> Option<CapabilityKind> {
        match self {
            Self::AbsoluteOrientation => Some(Self::DeviceOrientationEvent),
            Self::DeviceOrientationEvent | Self::Unsupported => None,
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform family, selecting the heading formula for Euler samples
///
/// - `Ios` exposes a native compass heading on orientation events
/// - `Android` and `Desktop` report raw device rotation that goes through
///   the Euler-to-compass formula
/// - `Unknown` inverts alpha as a last resort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformProfile {
    Ios,
    Android,
    #[default]
    Desktop,
    Unknown,
}

impl PlatformProfile {
    /// Classify a user-agent string
    ///
    /// Anything that is neither an Apple handheld nor Android is treated as
    /// a desktop browser. `Unknown` is never produced here; hosts inject it
    /// explicitly when they cannot vouch for the axis convention.
    pub fn from_user_agent(user_agent: &str) -> Self {
        if ["iPhone", "iPad", "iPod"]
            .iter()
            .any(|needle| user_agent.contains(needle))
        {
            Self::Ios
        } else if user_agent.contains("Android") {
            Self::Android
        } else {
            Self::Desktop
        }
    }

    /// Whether orientation events on this platform may carry a native heading
    pub fn has_native_compass(&self) -> bool {
        matches!(self, Self::Ios)
    }
}

/// What the host platform offers, as reported by a backend probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCapabilities {
    /// A fused absolute-orientation sensor constructor is present
    pub absolute_orientation: bool,
    /// The device-orientation event type exists
    pub device_orientation: bool,
    /// Device-orientation events are gated behind an explicit permission API
    pub orientation_permission_api: bool,
    /// Platform family for heading conversion
    pub profile: PlatformProfile,
}

impl PlatformCapabilities {
    /// A platform with no motion sensing at all
    pub fn none() -> Self {
        Self::default()
    }
}

/// Picks the initial capability and its permission requirements
pub struct CapabilityDetector;

impl CapabilityDetector {
    /// Decide the capability a session starts with
    ///
    /// The fused sensor wins over the event stream; with neither the
    /// platform is unsupported.
    pub fn detect(caps: &PlatformCapabilities) -> CapabilityKind {
        if caps.absolute_orientation {
            CapabilityKind::AbsoluteOrientation
        } else if caps.device_orientation {
            CapabilityKind::DeviceOrientationEvent
        } else {
            CapabilityKind::Unsupported
        }
    }

    /// Whether an explicit grant is needed before the first read
    ///
    /// Absolute-orientation sensors are always gated.
    pub fn requires_permission(kind: CapabilityKind, caps: &PlatformCapabilities) -> bool {
        match kind {
            CapabilityKind::AbsoluteOrientation => true,
            CapabilityKind::DeviceOrientationEvent => caps.orientation_permission_api,
            CapabilityKind::Unsupported => false,
        }
    }
}
