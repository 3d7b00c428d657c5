//! Browser motion backend
//!
//! Bridges the [`MotionBackend`] trait to a JavaScript host object. The
//! host owns the actual `AbsoluteOrientationSensor` instance and the
//! `deviceorientation` listener; it forwards every reading back into the
//! session through the wasm facade.
//!
//! The host object must provide:
//!
//! ```text
//! probe()              -> { absoluteOrientation, deviceOrientation,
//!                           orientationPermissionApi, userAgent }
//! requestAccess(kind)  -> Promise<"granted" | "denied">
//! subscribe(kind)      -> number   (throws if the sensor cannot start)
//! unsubscribe(id)      -> void
//! ```

use futures::future::LocalBoxFuture;
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::backend::{AccessDecision, MotionBackend};
use crate::error::{DeviceError, DeviceResult};
use crate::platform::{CapabilityKind, PlatformCapabilities, PlatformProfile};
use crate::sensors::SubscriptionId;

/// Motion backend driven by JavaScript callbacks
///
/// Clones share the same host object.
#[derive(Clone)]
pub struct JsMotionBackend {
    host: JsValue,
}

impl JsMotionBackend {
    /// Wrap a host object implementing the bridge protocol
    pub fn new(host: JsValue) -> Self {
        Self { host }
    }

    fn method(&self, name: &str) -> DeviceResult<Function> {
        Reflect::get(&self.host, &JsValue::from_str(name))
            .map_err(|e| DeviceError::Bridge(format!("{name}: {e:?}")))?
            .dyn_into::<Function>()
            .map_err(|_| DeviceError::Bridge(format!("{name} is not a function")))
    }

    fn flag(value: &JsValue, name: &str) -> bool {
        Reflect::get(value, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

impl MotionBackend for JsMotionBackend {
    fn probe(&self) -> PlatformCapabilities {
        let report = match self.method("probe").and_then(|f| {
            f.call0(&self.host)
                .map_err(|e| DeviceError::Bridge(format!("probe threw: {e:?}")))
        }) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "motion host probe failed, assuming no sensors");
                return PlatformCapabilities::none();
            }
        };

        let user_agent = Reflect::get(&report, &JsValue::from_str("userAgent"))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();

        PlatformCapabilities {
            absolute_orientation: Self::flag(&report, "absoluteOrientation"),
            device_orientation: Self::flag(&report, "deviceOrientation"),
            orientation_permission_api: Self::flag(&report, "orientationPermissionApi"),
            profile: PlatformProfile::from_user_agent(&user_agent),
        }
    }

    fn request_access(
        &mut self,
        kind: CapabilityKind,
    ) -> LocalBoxFuture<'_, DeviceResult<AccessDecision>> {
        let call = self.method("requestAccess").and_then(|f| {
            f.call1(&self.host, &JsValue::from_str(kind.as_str()))
                .map_err(|e| DeviceError::PermissionRequest(format!("{e:?}")))
        });

        Box::pin(async move {
            let promise: Promise = call?
                .dyn_into()
                .map_err(|_| DeviceError::Bridge("requestAccess must return a Promise".into()))?;
            let answer = JsFuture::from(promise)
                .await
                .map_err(|e| DeviceError::PermissionRequest(format!("{e:?}")))?;

            match answer.as_string().as_deref() {
                Some("granted") => Ok(AccessDecision::Granted),
                _ => Ok(AccessDecision::Denied),
            }
        })
    }

    fn subscribe(&mut self, kind: CapabilityKind) -> DeviceResult<SubscriptionId> {
        let id = self
            .method("subscribe")?
            .call1(&self.host, &JsValue::from_str(kind.as_str()))
            .map_err(|e| DeviceError::StartFailed(format!("{e:?}")))?;

        id.as_f64()
            .filter(|v| *v >= 0.0)
            .map(|v| SubscriptionId(v as u64))
            .ok_or_else(|| DeviceError::Bridge("subscribe must return a subscription id".into()))
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        let result = self.method("unsubscribe").and_then(|f| {
            f.call1(&self.host, &JsValue::from_f64(id.0 as f64))
                .map_err(|e| DeviceError::Bridge(format!("{e:?}")))
        });
        if let Err(e) = result {
            tracing::warn!(subscription = id.0, error = %e, "unsubscribe failed");
        }
    }
}
