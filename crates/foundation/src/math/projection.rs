//! Geographic and screen-space projections.
//!
//! `degrees_to_meters` is the spherical Web-Mercator forward projection
//! (EPSG:3857). It is only meaningful for latitudes strictly inside
//! (-90, 90); at the poles the result is non-finite and is not guarded.

use std::f64::consts::PI;

use super::{Mat4, Vec2, Vec3};

/// Half the Web-Mercator world extent in meters (`PI * 6378137`).
pub const WEB_MERCATOR_HALF_EXTENT_M: f64 = 20_037_508.34;

/// Latitude/longitude pair in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Pixel-space viewport read at call time.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

pub fn degrees_to_meters(longitude: f64, latitude: f64) -> Vec2 {
    let x = longitude * WEB_MERCATOR_HALF_EXTENT_M / 180.0;
    let y = ((90.0 + latitude) * PI / 360.0).tan().ln() / (PI / 180.0);
    Vec2::new(x, y * WEB_MERCATOR_HALF_EXTENT_M / 180.0)
}

/// Projects waypoints into a planar frame centered on `viewer`.
///
/// Output is `(x - vx, ground_y, y - vy)` per waypoint, in input order.
pub fn local_waypoints(waypoints: &[LatLng], viewer: LatLng, ground_y: f64) -> Vec<Vec3> {
    let origin = degrees_to_meters(viewer.lng, viewer.lat);
    waypoints
        .iter()
        .map(|wp| {
            let d = degrees_to_meters(wp.lng, wp.lat) - origin;
            Vec3::new(d.x, ground_y, d.y)
        })
        .collect()
}

/// Projects a world point to pixel coordinates (`z` is always 0).
///
/// The result is only valid for the viewport it was computed with.
pub fn to_screen_position(point: Vec3, view_projection: &Mat4, viewport: Viewport) -> Vec3 {
    let ndc = view_projection.project_point(point);
    Vec3::new(
        (ndc.x + 1.0) * viewport.width / 2.0,
        (-ndc.y + 1.0) * viewport.height / 2.0,
        0.0,
    )
}
