pub mod geolocation;
pub mod logging;
pub mod ui;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod sensor;
#[cfg(target_arch = "wasm32")]
mod webgl;
#[cfg(target_arch = "wasm32")]
mod xr;

#[cfg(target_arch = "wasm32")]
pub use app::*;
