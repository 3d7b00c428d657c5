//! Motion sensor abstractions for the landmark compass
//!
//! This crate provides platform-agnostic abstractions for orientation
//! sensing and can be compiled both natively and to WebAssembly.
//!
//! # Modules
//!
//! - [`platform`]: Capability kinds, platform profiles and capability detection
//! - [`sensors`]: Raw readings (Euler angles, quaternions) and sensor events
//! - [`backend`]: Motion backend trait for platform-specific implementations
//! - [`scripted`]: Deterministic backend for simulations and tests
//! - [`clock`]: Millisecond clocks (system and hand-driven)
//! - [`error`]: Device error types
//!
//! # Feature Flags
//!
//! - `wasm`: Enable the JavaScript-bridged browser backend

pub mod backend;
pub mod clock;
pub mod error;
pub mod platform;
pub mod scripted;
pub mod sensors;

#[cfg(feature = "wasm")]
pub mod web;

// Re-export commonly used types at crate root
pub use backend::{AccessDecision, MotionBackend, NullBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DeviceError, DeviceResult};
pub use platform::{CapabilityDetector, CapabilityKind, PlatformCapabilities, PlatformProfile};
pub use scripted::ScriptedBackend;
pub use sensors::{
    EulerAngles, OrientationSample, RawReading, SensorEvent, SensorEventKind, SensorFault,
    SubscriptionId,
};

#[cfg(feature = "wasm")]
pub use web::JsMotionBackend;

// Re-export glam for convenience
pub use glam;
