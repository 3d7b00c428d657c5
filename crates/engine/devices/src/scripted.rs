//! Scripted motion backend
//!
//! A deterministic backend for simulations and tests. Access decisions and
//! subscription failures are configured up front; the backend records
//! which subscriptions are live so callers can verify that nothing leaks.
//! Clones share state.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};

use crate::backend::{AccessDecision, MotionBackend};
use crate::error::{DeviceError, DeviceResult};
use crate::platform::{CapabilityKind, PlatformCapabilities};
use crate::sensors::{RawReading, SensorEvent, SensorFault, SubscriptionId};

#[derive(Debug, Default)]
struct ScriptedState {
    caps: PlatformCapabilities,
    access: HashMap<CapabilityKind, DeviceResult<AccessDecision>>,
    subscribe_failures: HashMap<CapabilityKind, String>,
    active: BTreeMap<SubscriptionId, CapabilityKind>,
    next_id: u64,
    access_requests: Vec<CapabilityKind>,
    subscribe_calls: usize,
    unsubscribe_calls: usize,
}

/// Backend whose behaviour is scripted by the caller
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    state: Rc<RefCell<ScriptedState>>,
}

impl ScriptedBackend {
    /// Create a backend reporting the given capabilities
    ///
    /// Every access request is granted until scripted otherwise.
    pub fn new(caps: PlatformCapabilities) -> Self {
        let backend = Self::default();
        backend.state.borrow_mut().caps = caps;
        backend
    }

    /// Script the answer to access requests for a capability
    pub fn set_access(&self, kind: CapabilityKind, decision: AccessDecision) {
        self.state.borrow_mut().access.insert(kind, Ok(decision));
    }

    /// Make the permission prompt for a capability fail outright
    pub fn fail_access(&self, kind: CapabilityKind, message: impl Into<String>) {
        self.state
            .borrow_mut()
            .access
            .insert(kind, Err(DeviceError::PermissionRequest(message.into())));
    }

    /// Make subscribing to a capability fail
    pub fn fail_subscribe(&self, kind: CapabilityKind, message: impl Into<String>) {
        self.state
            .borrow_mut()
            .subscribe_failures
            .insert(kind, message.into());
    }

    /// Live subscription for a capability, if any
    pub fn active_subscription(&self, kind: CapabilityKind) -> Option<SubscriptionId> {
        self.state
            .borrow()
            .active
            .iter()
            .find(|(_, k)| **k == kind)
            .map(|(id, _)| *id)
    }

    /// Number of live subscriptions
    pub fn active_count(&self) -> usize {
        self.state.borrow().active.len()
    }

    /// Capabilities access was requested for, in order
    pub fn access_requests(&self) -> Vec<CapabilityKind> {
        self.state.borrow().access_requests.clone()
    }

    /// Total subscribe calls, successful or not
    pub fn subscribe_calls(&self) -> usize {
        self.state.borrow().subscribe_calls
    }

    /// Total unsubscribe calls that released a live subscription
    pub fn unsubscribe_calls(&self) -> usize {
        self.state.borrow().unsubscribe_calls
    }

    /// Build a reading event for the live subscription of `kind`
    pub fn reading(&self, kind: CapabilityKind, reading: RawReading) -> Option<SensorEvent> {
        self.active_subscription(kind)
            .map(|id| SensorEvent::reading(id, reading))
    }

    /// Build an error event for the live subscription of `kind`
    pub fn fault(&self, kind: CapabilityKind, message: &str) -> Option<SensorEvent> {
        self.active_subscription(kind)
            .map(|id| SensorEvent::error(id, SensorFault::new(message)))
    }
}

impl MotionBackend for ScriptedBackend {
    fn probe(&self) -> PlatformCapabilities {
        self.state.borrow().caps
    }

    fn request_access(
        &mut self,
        kind: CapabilityKind,
    ) -> LocalBoxFuture<'_, DeviceResult<AccessDecision>> {
        let mut state = self.state.borrow_mut();
        state.access_requests.push(kind);
        let answer = state
            .access
            .get(&kind)
            .cloned()
            .unwrap_or(Ok(AccessDecision::Granted));
        Box::pin(future::ready(answer))
    }

    fn subscribe(&mut self, kind: CapabilityKind) -> DeviceResult<SubscriptionId> {
        let mut state = self.state.borrow_mut();
        state.subscribe_calls += 1;

        if kind == CapabilityKind::Unsupported {
            return Err(DeviceError::CapabilityUnavailable(kind));
        }
        if let Some(message) = state.subscribe_failures.get(&kind) {
            return Err(DeviceError::StartFailed(message.clone()));
        }

        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state.active.insert(id, kind);
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        let mut state = self.state.borrow_mut();
        if state.active.remove(&id).is_some() {
            state.unsubscribe_calls += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn orientation_caps() -> PlatformCapabilities {
        PlatformCapabilities {
            device_orientation: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_subscription_lifecycle() {
        let mut backend = ScriptedBackend::new(orientation_caps());
        let observer = backend.clone();

        let id = backend
            .subscribe(CapabilityKind::DeviceOrientationEvent)
            .unwrap();
        assert_eq!(observer.active_count(), 1);
        assert_eq!(
            observer.active_subscription(CapabilityKind::DeviceOrientationEvent),
            Some(id)
        );

        backend.unsubscribe(id);
        backend.unsubscribe(id); // Second release is ignored
        assert_eq!(observer.active_count(), 0);
        assert_eq!(observer.unsubscribe_calls(), 1);
    }

    #[test]
    fn test_scripted_access() {
        let mut backend = ScriptedBackend::new(orientation_caps());
        assert_eq!(
            block_on(backend.request_access(CapabilityKind::DeviceOrientationEvent)),
            Ok(AccessDecision::Granted)
        );

        backend.set_access(CapabilityKind::DeviceOrientationEvent, AccessDecision::Denied);
        assert_eq!(
            block_on(backend.request_access(CapabilityKind::DeviceOrientationEvent)),
            Ok(AccessDecision::Denied)
        );

        backend.fail_access(CapabilityKind::AbsoluteOrientation, "SecurityError");
        assert!(block_on(backend.request_access(CapabilityKind::AbsoluteOrientation)).is_err());
        assert_eq!(backend.access_requests().len(), 3);
    }

    #[test]
    fn test_scripted_subscribe_failure() {
        let mut backend = ScriptedBackend::new(orientation_caps());
        backend.fail_subscribe(CapabilityKind::AbsoluteOrientation, "NotReadableError");

        assert_eq!(
            backend.subscribe(CapabilityKind::AbsoluteOrientation),
            Err(DeviceError::StartFailed("NotReadableError".to_string()))
        );
        assert_eq!(backend.active_count(), 0);
        assert_eq!(backend.subscribe_calls(), 1);
    }
}
