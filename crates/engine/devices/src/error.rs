//! Device error types.

use thiserror::Error;

use crate::platform::CapabilityKind;

/// Errors raised by motion sensor backends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The requested capability is not present on this platform.
    #[error("capability not available: {0}")]
    CapabilityUnavailable(CapabilityKind),

    /// The sensor could not be constructed or started.
    #[error("sensor start failed: {0}")]
    StartFailed(String),

    /// The permission prompt itself failed (not a refusal).
    #[error("permission request failed: {0}")]
    PermissionRequest(String),

    /// Host bridge returned something unexpected.
    #[error("host bridge error: {0}")]
    Bridge(String),
}

/// Convenience result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
