use session::{GeoCoordinates, GeolocationError};

/// Builds a fix from `GeolocationCoordinates` fields; `field` looks one up by
/// its DOM name. Latitude and longitude are required.
pub fn coordinates_from_fields(
    field: impl Fn(&str) -> Option<f64>,
) -> Result<GeoCoordinates, GeolocationError> {
    let missing = |name: &str| {
        GeolocationError::PositionUnavailable(format!("position has no {name}"))
    };
    let latitude = field("latitude")
        .filter(|v| v.is_finite())
        .ok_or_else(|| missing("latitude"))?;
    let longitude = field("longitude")
        .filter(|v| v.is_finite())
        .ok_or_else(|| missing("longitude"))?;
    Ok(GeoCoordinates {
        latitude,
        longitude,
        accuracy_m: field("accuracy"),
        altitude_m: field("altitude"),
        altitude_accuracy_m: field("altitudeAccuracy"),
    })
}

/// Maps a `GeolocationPositionError` code and message.
pub fn error_from_fields(code: Option<f64>, message: Option<String>) -> GeolocationError {
    let code = code
        .filter(|c| c.is_finite() && *c >= 0.0 && *c <= f64::from(u16::MAX))
        .map_or(0, |c| c as u16);
    GeolocationError::from_code(code, message.unwrap_or_default())
}

#[cfg(target_arch = "wasm32")]
pub use browser::request_position;

#[cfg(target_arch = "wasm32")]
mod browser {
    use js_sys::Reflect;
    use session::config::GeolocationOptions;
    use session::{GeolocationError, HostEvent};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::PositionOptions;

    use super::{coordinates_from_fields, error_from_fields};
    use crate::sensor::js_message;

    /// One-shot `getCurrentPosition`; the outcome is passed to `deliver` as a
    /// geolocation event.
    pub fn request_position(options: &GeolocationOptions, deliver: fn(HostEvent)) {
        let geolocation = match web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))
            .and_then(|w| w.navigator().geolocation())
        {
            Ok(geolocation) => geolocation,
            Err(err) => {
                deliver(HostEvent::GeolocationFailed(GeolocationError::Other {
                    code: 0,
                    message: js_message(&err),
                }));
                return;
            }
        };

        let position_options = PositionOptions::new();
        position_options.set_enable_high_accuracy(options.enable_high_accuracy);
        position_options.set_timeout(options.timeout_ms);
        position_options.set_maximum_age(options.maximum_age_ms);

        let on_success = Closure::once_into_js(move |position: JsValue| {
            let coords = Reflect::get(&position, &JsValue::from_str("coords"))
                .unwrap_or(JsValue::UNDEFINED);
            let event = match coordinates_from_fields(|key| number(&coords, key)) {
                Ok(coords) => HostEvent::GeolocationResolved(coords),
                Err(err) => HostEvent::GeolocationFailed(err),
            };
            deliver(event);
        });
        let on_error = Closure::once_into_js(move |error: JsValue| {
            let message = Reflect::get(&error, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string());
            deliver(HostEvent::GeolocationFailed(error_from_fields(
                number(&error, "code"),
                message,
            )));
        });

        if let Err(err) = geolocation.get_current_position_with_error_callback_and_options(
            on_success.unchecked_ref(),
            Some(on_error.unchecked_ref()),
            &position_options,
        ) {
            deliver(HostEvent::GeolocationFailed(GeolocationError::Other {
                code: 0,
                message: js_message(&err),
            }));
        }
    }

    fn number(object: &JsValue, key: &str) -> Option<f64> {
        if object.is_undefined() || object.is_null() {
            return None;
        }
        Reflect::get(object, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::{coordinates_from_fields, error_from_fields};
    use session::{GeoCoordinates, GeolocationError};

    fn fields<'a>(pairs: &'a [(&'static str, f64)]) -> impl Fn(&str) -> Option<f64> + 'a {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    #[test]
    fn full_fix_maps_every_field() {
        let coords = coordinates_from_fields(fields(&[
            ("latitude", 45.2079),
            ("longitude", 19.7462),
            ("accuracy", 12.0),
            ("altitude", 80.0),
            ("altitudeAccuracy", 3.0),
        ]))
        .unwrap();
        assert_eq!(
            coords,
            GeoCoordinates {
                latitude: 45.2079,
                longitude: 19.7462,
                accuracy_m: Some(12.0),
                altitude_m: Some(80.0),
                altitude_accuracy_m: Some(3.0),
            }
        );
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let coords =
            coordinates_from_fields(fields(&[("latitude", 1.0), ("longitude", 2.0)])).unwrap();
        assert_eq!(coords, GeoCoordinates::new(1.0, 2.0));
    }

    #[test]
    fn missing_latitude_or_longitude_is_position_unavailable() {
        let err = coordinates_from_fields(fields(&[("longitude", 2.0)])).unwrap_err();
        assert!(matches!(err, GeolocationError::PositionUnavailable(ref m) if m.contains("latitude")));

        let err = coordinates_from_fields(fields(&[("latitude", 1.0)])).unwrap_err();
        assert!(matches!(err, GeolocationError::PositionUnavailable(_)));

        let err = coordinates_from_fields(fields(&[("latitude", f64::NAN), ("longitude", 2.0)]))
            .unwrap_err();
        assert!(matches!(err, GeolocationError::PositionUnavailable(_)));

        assert!(matches!(
            coordinates_from_fields(|_| None),
            Err(GeolocationError::PositionUnavailable(_))
        ));
    }

    #[test]
    fn error_codes_map_to_variants() {
        assert_eq!(
            error_from_fields(Some(1.0), Some("User denied Geolocation".into())),
            GeolocationError::PermissionDenied("User denied Geolocation".into())
        );
        assert_eq!(
            error_from_fields(Some(3.0), None),
            GeolocationError::Timeout(String::new())
        );
        assert!(matches!(
            error_from_fields(None, None),
            GeolocationError::Other { code: 0, .. }
        ));
        assert!(matches!(
            error_from_fields(Some(-4.0), None),
            GeolocationError::Other { code: 0, .. }
        ));
    }
}
