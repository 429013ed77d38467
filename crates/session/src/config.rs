//! Session configuration.
//!
//! Every field has a default, so an empty JSON object (or no config at all)
//! yields the stock demo: 60 Hz device-frame orientation, a 5 s
//! high-accuracy position fix, and a 2 s placement cooldown over the fixed
//! eight-point boundary.

use foundation::math::LatLng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_HISTORY_CAPACITY: usize = 120;
pub const DEFAULT_HEADING_RING_INDEX: usize = 60;
pub const DEFAULT_PLACEMENT_COOLDOWN_MS: f64 = 2000.0;
pub const DEFAULT_GROUND_OFFSET_M: f64 = -1.5;

/// Closed boundary as `[lat, lng]` pairs; the first point is repeated last.
pub const DEFAULT_WAYPOINTS: [[f64; 2]; 8] = [
    [45.207874, 19.745987],
    [45.207902, 19.746197],
    [45.207920, 19.746336],
    [45.207928, 19.746398],
    [45.207812, 19.746471],
    [45.207789, 19.746217],
    [45.207782, 19.746009],
    [45.207874, 19.745987],
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArConfig {
    pub session: SessionFeatures,
    pub sensor: SensorOptions,
    pub geolocation: GeolocationOptions,
    pub placement: PlacementConfig,
    pub history_capacity: usize,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            session: SessionFeatures::default(),
            sensor: SensorOptions::default(),
            geolocation: GeolocationOptions::default(),
            placement: PlacementConfig::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl ArConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ArConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if let HeadingEstimator::RingIndex(index) = self.placement.heading_estimator
            && index >= self.history_capacity
        {
            return Err(ConfigError::RingIndexOutOfRange {
                index,
                capacity: self.history_capacity,
            });
        }
        let cooldown = self.placement.cooldown_ms;
        if !cooldown.is_finite() || cooldown < 0.0 {
            return Err(ConfigError::InvalidCooldown(cooldown));
        }
        let frequency = self.sensor.frequency_hz;
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(ConfigError::InvalidFrequency(frequency));
        }
        if self.placement.waypoints.len() < 2 {
            return Err(ConfigError::TooFewWaypoints(self.placement.waypoints.len()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFeatures {
    pub mode: String,
    pub required_features: Vec<String>,
    pub optional_features: Vec<String>,
    /// Root the DOM overlay at `document.body`.
    pub dom_overlay: bool,
}

impl Default for SessionFeatures {
    fn default() -> Self {
        Self {
            mode: "immersive-ar".to_string(),
            required_features: ["hit-test", "dom-overlay", "anchors", "local-floor"]
                .map(String::from)
                .to_vec(),
            optional_features: vec!["bounded-floor".to_string()],
            dom_overlay: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceFrame {
    Device,
    Screen,
}

impl ReferenceFrame {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceFrame::Device => "device",
            ReferenceFrame::Screen => "screen",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorOptions {
    pub frequency_hz: f64,
    pub reference_frame: ReferenceFrame,
}

impl Default for SensorOptions {
    fn default() -> Self {
        Self {
            frequency_hz: 60.0,
            reference_frame: ReferenceFrame::Device,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u32,
    pub maximum_age_ms: u32,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: 5000,
            maximum_age_ms: 0,
        }
    }
}

/// How a single heading is picked from the rolling history.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingEstimator {
    /// The sample at a fixed buffer position.
    RingIndex(usize),
    Median,
    CircularMean,
}

impl Default for HeadingEstimator {
    fn default() -> Self {
        HeadingEstimator::RingIndex(DEFAULT_HEADING_RING_INDEX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub cooldown_ms: f64,
    /// Y coordinate given to every projected boundary point.
    pub ground_offset_m: f64,
    pub heading_estimator: HeadingEstimator,
    /// `[lat, lng]` pairs in degrees.
    pub waypoints: Vec<[f64; 2]>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DEFAULT_PLACEMENT_COOLDOWN_MS,
            ground_offset_m: DEFAULT_GROUND_OFFSET_M,
            heading_estimator: HeadingEstimator::default(),
            waypoints: DEFAULT_WAYPOINTS.to_vec(),
        }
    }
}

impl PlacementConfig {
    pub fn waypoints(&self) -> Vec<LatLng> {
        self.waypoints
            .iter()
            .map(|[lat, lng]| LatLng::new(*lat, *lng))
            .collect()
    }
}
