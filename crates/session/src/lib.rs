pub mod config;
pub mod controller;
pub mod error;
pub mod geolocation;
pub mod placement;
pub mod platform;
pub mod sampler;

pub use config::ArConfig;
pub use controller::*;
pub use error::*;
pub use geolocation::{GeoCoordinates, GeolocationError, GeolocationProbe};
pub use platform::*;
pub use sampler::{HeadingHistory, OrientationSample, OrientationSampler};
