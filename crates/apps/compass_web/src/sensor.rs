//! Generic Sensor API binding for `AbsoluteOrientationSensor`.

use foundation::math::Quat;
use js_sys::{Array, Object, Reflect};
use session::SessionError;
use session::config::SensorOptions;
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = EventTarget)]
    #[derive(Debug, Clone)]
    pub type AbsoluteOrientationSensor;

    #[wasm_bindgen(constructor, catch)]
    fn new(options: &Object) -> Result<AbsoluteOrientationSensor, JsValue>;

    /// `[x, y, z, w]`, or `null` before the first reading.
    #[wasm_bindgen(method, getter)]
    fn quaternion(this: &AbsoluteOrientationSensor) -> Option<Array>;

    #[wasm_bindgen(method, catch)]
    fn start(this: &AbsoluteOrientationSensor) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn stop(this: &AbsoluteOrientationSensor);
}

/// A running sensor; dropping it stops the sensor and releases the listeners.
pub struct OrientationSensor {
    sensor: AbsoluteOrientationSensor,
    _on_reading: Closure<dyn FnMut()>,
    _on_error: Closure<dyn FnMut(Event)>,
}

impl OrientationSensor {
    pub fn start(
        options: &SensorOptions,
        mut on_quaternion: impl FnMut(Quat) + 'static,
    ) -> Result<Self, SessionError> {
        let init = Object::new();
        let set = |key: &str, value: JsValue| {
            Reflect::set(&init, &JsValue::from_str(key), &value)
                .map(|_| ())
                .map_err(|err| SessionError::Sensor(js_message(&err)))
        };
        set("frequency", JsValue::from_f64(options.frequency_hz))?;
        set(
            "referenceFrame",
            JsValue::from_str(options.reference_frame.as_str()),
        )?;

        let sensor = AbsoluteOrientationSensor::new(&init)
            .map_err(|err| SessionError::Sensor(js_message(&err)))?;

        let reader = sensor.clone();
        let on_reading = Closure::<dyn FnMut()>::new(move || {
            let Some(values) = reader.quaternion() else {
                return;
            };
            let components: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
            match Quat::from_slice(&components) {
                Some(q) => on_quaternion(q),
                None => warn!(len = components.len(), "malformed orientation quaternion"),
            }
        });
        let on_error = Closure::<dyn FnMut(Event)>::new(|event: Event| {
            let message = Reflect::get(&event, &JsValue::from_str("error"))
                .map(|err| js_message(&err))
                .unwrap_or_else(|_| event.type_());
            warn!(error = %message, "orientation sensor error");
        });

        let target: &EventTarget = sensor.as_ref();
        let listen = |name: &str, callback: &js_sys::Function| {
            target
                .add_event_listener_with_callback(name, callback)
                .map_err(|err| SessionError::Sensor(js_message(&err)))
        };
        listen("reading", on_reading.as_ref().unchecked_ref())?;
        listen("error", on_error.as_ref().unchecked_ref())?;

        sensor
            .start()
            .map_err(|err| SessionError::Sensor(js_message(&err)))?;

        Ok(Self {
            sensor,
            _on_reading: on_reading,
            _on_error: on_error,
        })
    }
}

impl Drop for OrientationSensor {
    fn drop(&mut self) {
        self.sensor.stop();
    }
}

/// Best-effort text for a thrown JS value.
pub fn js_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
