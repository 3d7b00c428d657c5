//! Motion backend trait for platform-specific implementations
//!
//! This module defines the trait that platform-specific motion sensing
//! backends must implement (e.g., the browser Generic Sensor API and
//! `deviceorientation` events, or a scripted source for simulations).

use futures::future::{self, LocalBoxFuture};
use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, DeviceResult};
use crate::platform::{CapabilityKind, PlatformCapabilities};
use crate::sensors::SubscriptionId;

/// Outcome of an access request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessDecision {
    Granted,
    Denied,
}

/// Trait for motion sensing backends
///
/// Implementations of this trait provide platform-specific orientation
/// sensing. The backend is responsible for:
/// - Reporting which capabilities the platform offers
/// - Prompting the user for sensor access
/// - Starting and stopping the underlying listener or sensor
///
/// Readings themselves are not pulled through the trait. The host routes
/// every callback it receives into the owning session as a
/// [`SensorEvent`](crate::sensors::SensorEvent) tagged with the
/// subscription that produced it, which keeps the backend free of
/// references back into the session.
///
/// # Example
///
/// ```ignore
/// let mut backend = ScriptedBackend::new(caps);
/// let id = backend.subscribe(CapabilityKind::DeviceOrientationEvent)?;
///
/// // later, from the event source:
/// session.handle_event(SensorEvent::reading(id, reading));
///
/// backend.unsubscribe(id);
/// ```
pub trait MotionBackend {
    /// Report the capabilities of the current platform
    fn probe(&self) -> PlatformCapabilities;

    /// Ask the user for access to a capability
    ///
    /// Resolves to `Err` only if the prompt itself failed; a refusal is
    /// `Ok(AccessDecision::Denied)`.
    fn request_access(
        &mut self,
        kind: CapabilityKind,
    ) -> LocalBoxFuture<'_, DeviceResult<AccessDecision>>;

    /// Start delivering readings for a capability
    fn subscribe(&mut self, kind: CapabilityKind) -> DeviceResult<SubscriptionId>;

    /// Stop a subscription
    ///
    /// Must tolerate unknown or already-released ids.
    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// A no-op backend for platforms without motion sensing
///
/// Sessions built on it end up in the not-supported state, so callers can
/// run without conditional compilation everywhere.
pub struct NullBackend;

impl NullBackend {
    /// Create a new null backend
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionBackend for NullBackend {
    fn probe(&self) -> PlatformCapabilities {
        PlatformCapabilities::none()
    }

    fn request_access(
        &mut self,
        _kind: CapabilityKind,
    ) -> LocalBoxFuture<'_, DeviceResult<AccessDecision>> {
        Box::pin(future::ready(Ok(AccessDecision::Denied)))
    }

    fn subscribe(&mut self, kind: CapabilityKind) -> DeviceResult<SubscriptionId> {
        Err(DeviceError::CapabilityUnavailable(kind))
    }

    fn unsubscribe(&mut self, _id: SubscriptionId) {
        // No-op
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_null_backend() {
        let mut backend = NullBackend::new();

        assert_eq!(backend.probe(), PlatformCapabilities::none());
        assert_eq!(
            block_on(backend.request_access(CapabilityKind::DeviceOrientationEvent)),
            Ok(AccessDecision::Denied)
        );
        assert!(backend
            .subscribe(CapabilityKind::AbsoluteOrientation)
            .is_err());
        backend.unsubscribe(SubscriptionId(1)); // Should not panic
    }

    #[test]
    fn test_boxed_backend_forwards() {
        let mut backend: Box<dyn MotionBackend> = Box::new(NullBackend::new());
        assert_eq!(
            backend.subscribe(CapabilityKind::DeviceOrientationEvent),
            Err(DeviceError::CapabilityUnavailable(
                CapabilityKind::DeviceOrientationEvent
            ))
        );
    }
}
