use foundation::math::LatLng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::GeolocationOptions;
use crate::platform::XrPlatform;

/// Position fix as reported by the platform; only latitude and longitude
/// feed placement.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub altitude_m: Option<f64>,
    pub altitude_accuracy_m: Option<f64>,
}

impl GeoCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            altitude_m: None,
            altitude_accuracy_m: None,
        }
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// `GeolocationPositionError` codes 1..=3, anything else is `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("geolocation permission denied: {0}")]
    PermissionDenied(String),
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("geolocation timed out: {0}")]
    Timeout(String),
    #[error("geolocation error {code}: {message}")]
    Other { code: u16, message: String },
}

impl GeolocationError {
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            1 => GeolocationError::PermissionDenied(message),
            2 => GeolocationError::PositionUnavailable(message),
            3 => GeolocationError::Timeout(message),
            code => GeolocationError::Other { code, message },
        }
    }
}

/// Single-shot, best-effort position probe. No retries.
#[derive(Debug)]
pub struct GeolocationProbe {
    options: GeolocationOptions,
    coordinates: Option<GeoCoordinates>,
    last_error: Option<GeolocationError>,
}

impl GeolocationProbe {
    pub fn new(options: GeolocationOptions) -> Self {
        Self {
            options,
            coordinates: None,
            last_error: None,
        }
    }

    pub fn options(&self) -> &GeolocationOptions {
        &self.options
    }

    pub fn coordinates(&self) -> Option<&GeoCoordinates> {
        self.coordinates.as_ref()
    }

    pub fn last_error(&self) -> Option<&GeolocationError> {
        self.last_error.as_ref()
    }

    pub fn request<P: XrPlatform + ?Sized>(&mut self, platform: &mut P) {
        platform.request_geolocation(&self.options);
    }

    pub fn on_success(&mut self, coordinates: GeoCoordinates) {
        info!(
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            accuracy_m = coordinates.accuracy_m,
            "viewer geolocation resolved"
        );
        self.coordinates = Some(coordinates);
        self.last_error = None;
    }

    pub fn on_failure(&mut self, error: GeolocationError) {
        warn!(error = %error, "geolocation request failed");
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoCoordinates, GeolocationError, GeolocationProbe};
    use crate::config::GeolocationOptions;
    use crate::platform::testing::{MockPlatform, PlatformCall};

    #[test]
    fn maps_position_error_codes() {
        assert_eq!(
            GeolocationError::from_code(1, "denied"),
            GeolocationError::PermissionDenied("denied".into())
        );
        assert!(matches!(
            GeolocationError::from_code(3, "slow"),
            GeolocationError::Timeout(_)
        ));
        assert!(matches!(
            GeolocationError::from_code(9, "?"),
            GeolocationError::Other { code: 9, .. }
        ));
    }

    #[test]
    fn request_uses_configured_options() {
        let mut platform = MockPlatform::default();
        let mut probe = GeolocationProbe::new(GeolocationOptions::default());
        probe.request(&mut platform);
        assert_eq!(
            platform.calls,
            vec![PlatformCall::RequestGeolocation(GeolocationOptions {
                enable_high_accuracy: true,
                timeout_ms: 5000,
                maximum_age_ms: 0,
            })]
        );
    }

    #[test]
    fn success_overwrites_and_failure_keeps_last_fix() {
        let mut probe = GeolocationProbe::new(GeolocationOptions::default());
        probe.on_success(GeoCoordinates::new(45.0, 19.0));
        probe.on_success(GeoCoordinates::new(45.5, 19.5));
        probe.on_failure(GeolocationError::from_code(3, "timeout"));

        assert_eq!(probe.coordinates().unwrap().latitude, 45.5);
        assert!(probe.last_error().is_some());
    }
}
