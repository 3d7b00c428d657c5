//! JavaScript facade over [`Navigator`]
//!
//! The host page owns the real sensor objects. It hands a bridge object to
//! the constructor (see [`devices::JsMotionBackend`]) and forwards every
//! sensor callback through `pushOrientation`, `pushQuaternion` and
//! `pushSensorError`, tagged with the subscription id it returned from
//! `subscribe`. The render loop calls `tick` once per frame.

use std::cell::RefCell;
use std::rc::Rc;

use devices::{
    EulerAngles, JsMotionBackend, MotionBackend, OrientationSample, RawReading, SensorEvent,
    SensorFault, SubscriptionId, SystemClock,
};
use glam::DQuat;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::calibration::Calibration;
use crate::config::NavigationConfig;
use crate::landmark::LandmarkCatalog;
use crate::navigation::Navigator;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalibrationReply {
    success: bool,
    #[serde(flatten)]
    calibration: Option<Calibration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn string_list(value: JsValue) -> Result<Vec<String>, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(Vec::new());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Expected a list of landmark keys: {}", e)))
}

#[wasm_bindgen]
pub struct WasmNavigator {
    inner: Rc<RefCell<Navigator>>,
    backend: JsMotionBackend,
}

#[wasm_bindgen]
impl WasmNavigator {
    /// Create a navigator
    ///
    /// # Arguments
    /// * `host` - Bridge object with `probe`, `requestAccess`, `subscribe`, `unsubscribe`
    /// * `landmarks_json` - Landmark catalog as exported by the scene
    /// * `config_toml` - Optional navigation config overrides
    #[wasm_bindgen(constructor)]
    pub fn new(
        host: JsValue,
        landmarks_json: &str,
        config_toml: Option<String>,
    ) -> Result<WasmNavigator, JsValue> {
        let catalog = LandmarkCatalog::from_json(landmarks_json)
            .map_err(|e| JsValue::from_str(&format!("Landmark error: {}", e)))?;
        let config = match config_toml {
            Some(toml) => NavigationConfig::from_toml_str(&toml)
                .map_err(|e| JsValue::from_str(&format!("Config error: {}", e)))?,
            None => NavigationConfig::default(),
        };

        let backend = JsMotionBackend::new(host);
        let navigator = Navigator::new(backend.clone(), SystemClock::new(), catalog, config)
            .map_err(|e| JsValue::from_str(&format!("Config error: {}", e)))?;

        Ok(Self {
            inner: Rc::new(RefCell::new(navigator)),
            backend,
        })
    }

    /// `{ sensorType, permissionState, compassHeading, orientation, quaternion, isListening, cardinal }`
    #[wasm_bindgen(js_name = sensorInfo)]
    pub fn sensor_info(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().sensor_info())
    }

    /// Ask the host for sensor access; resolves to the new permission state
    #[wasm_bindgen(js_name = requestPermission)]
    pub fn request_permission(&self) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        let target = inner.borrow().permission_target();
        let mut backend = self.backend.clone();

        wasm_bindgen_futures::future_to_promise(async move {
            let state = match target {
                Some(kind) => {
                    // The navigator is not borrowed while the host prompt is open
                    let answer = backend.request_access(kind).await;
                    inner.borrow_mut().apply_permission(kind, answer)
                }
                None => inner.borrow().permission_state(),
            };
            to_js(&state)
        })
    }

    /// Advance one frame; returns the displayed heading
    pub fn tick(&self) -> f64 {
        self.inner.borrow_mut().tick()
    }

    #[wasm_bindgen(js_name = smoothedHeading)]
    pub fn smoothed_heading(&self) -> f64 {
        self.inner.borrow().smoothed_heading()
    }

    /// `{ success, offset, actualAngle, sensorHeading, calibratedHeading, landmarkKey }`
    /// or `{ success: false, error, message }`
    pub fn calibrate(&self, landmark_key: &str) -> Result<JsValue, JsValue> {
        let reply = match self.inner.borrow_mut().calibrate(landmark_key) {
            Ok(calibration) => CalibrationReply {
                success: true,
                calibration: Some(calibration),
                error: None,
                message: None,
            },
            Err(e) => CalibrationReply {
                success: false,
                calibration: None,
                error: Some(e.code()),
                message: Some(e.to_string()),
            },
        };
        to_js(&reply)
    }

    #[wasm_bindgen(js_name = resetCalibration)]
    pub fn reset_calibration(&self) {
        self.inner.borrow_mut().reset_calibration();
    }

    /// Active calibration record or `null`
    #[wasm_bindgen(js_name = calibrationState)]
    pub fn calibration_state(&self) -> Result<JsValue, JsValue> {
        match self.inner.borrow().calibration_state() {
            Some(record) => to_js(record),
            None => Ok(JsValue::NULL),
        }
    }

    /// Forward a `deviceorientation` event; returns the new raw heading
    #[wasm_bindgen(js_name = pushOrientation)]
    pub fn push_orientation(
        &self,
        subscription: f64,
        alpha: Option<f64>,
        beta: Option<f64>,
        gamma: Option<f64>,
        native_heading: Option<f64>,
    ) -> Option<f64> {
        let reading = RawReading::Euler(OrientationSample {
            euler: EulerAngles { alpha, beta, gamma },
            native_heading,
        });
        self.push(SensorEvent::reading(subscription_id(subscription), reading))
    }

    /// Forward an absolute-orientation sensor reading; returns the new raw heading
    #[wasm_bindgen(js_name = pushQuaternion)]
    pub fn push_quaternion(&self, subscription: f64, x: f64, y: f64, z: f64, w: f64) -> Option<f64> {
        let reading = RawReading::Quaternion(DQuat::from_xyzw(x, y, z, w));
        self.push(SensorEvent::reading(subscription_id(subscription), reading))
    }

    /// Forward a sensor `error` event
    #[wasm_bindgen(js_name = pushSensorError)]
    pub fn push_sensor_error(&self, subscription: f64, message: &str) {
        self.push(SensorEvent::error(
            subscription_id(subscription),
            SensorFault::new(message),
        ));
    }

    #[wasm_bindgen(js_name = setManualMode)]
    pub fn set_manual_mode(&self, enabled: bool) {
        self.inner.borrow_mut().set_manual_mode(enabled);
    }

    #[wasm_bindgen(js_name = setManualRotation)]
    pub fn set_manual_rotation(&self, degrees: f64) {
        self.inner.borrow_mut().set_manual_rotation(degrees);
    }

    /// Direction strip data around the displayed heading
    ///
    /// # Arguments
    /// * `selected` - Landmark keys selected by anyone
    /// * `my_selected` - Landmark keys selected by the local user
    #[wasm_bindgen(js_name = landmarkDirections)]
    pub fn landmark_directions(&self, selected: JsValue, my_selected: JsValue) -> Result<JsValue, JsValue> {
        let selected = string_list(selected)?;
        let my_selected = string_list(my_selected)?;
        to_js(&self.inner.borrow().landmark_directions(&selected, &my_selected))
    }

    /// `[[key, label], ...]` for a calibration picker
    #[wasm_bindgen(js_name = landmarkOptions)]
    pub fn landmark_options(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.borrow().catalog().options())
    }

    /// Release the sensor subscription
    pub fn teardown(&self) {
        self.inner.borrow_mut().teardown();
    }
}

impl WasmNavigator {
    fn push(&self, event: SensorEvent) -> Option<f64> {
        self.inner
            .borrow_mut()
            .handle_event(event)
            .map(|sample| sample.value)
    }
}

fn subscription_id(value: f64) -> SubscriptionId {
    SubscriptionId(value.max(0.0) as u64)
}
