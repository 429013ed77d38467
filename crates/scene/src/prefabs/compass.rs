//! Compass marker: four cardinal triangles plus a boundary polyline.

use std::f64::consts::{FRAC_PI_2, PI};

use foundation::math::Vec3;

use crate::World;
use crate::components::{Color, Drawable, Transform, Visibility};
use crate::entity::EntityId;

/// Distance of each cardinal marker from the compass origin.
pub const MARKER_OFFSET: f64 = 2.0;

/// Local triangle shared by all markers; the tip points along -Z.
pub const MARKER_TRIANGLE: [Vec3; 3] = [
    Vec3 {
        x: -0.2,
        y: 0.0,
        z: 0.0,
    },
    Vec3 {
        x: 0.0,
        y: 0.0,
        z: -1.0,
    },
    Vec3 {
        x: 0.2,
        y: 0.0,
        z: 0.0,
    },
];

pub const BOUNDARY_COLOR: Color = Color::WHITE;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Cardinal {
    North,
    South,
    East,
    West,
}

impl Cardinal {
    pub const ALL: [Cardinal; 4] = [
        Cardinal::North,
        Cardinal::South,
        Cardinal::East,
        Cardinal::West,
    ];

    pub fn position(self) -> Vec3 {
        match self {
            Cardinal::North => Vec3::new(0.0, 0.0, -MARKER_OFFSET),
            Cardinal::South => Vec3::new(0.0, 0.0, MARKER_OFFSET),
            Cardinal::East => Vec3::new(MARKER_OFFSET, 0.0, 0.0),
            Cardinal::West => Vec3::new(-MARKER_OFFSET, 0.0, 0.0),
        }
    }

    /// Yaw that turns the marker tip away from the origin.
    pub fn yaw_rad(self) -> f64 {
        match self {
            Cardinal::North => 0.0,
            Cardinal::South => PI,
            Cardinal::East => -FRAC_PI_2,
            Cardinal::West => FRAC_PI_2,
        }
    }

    pub fn color(self) -> Color {
        match self {
            Cardinal::North => Color::BLUE,
            Cardinal::South => Color::RED,
            Cardinal::East => Color::GREEN,
            Cardinal::West => Color::YELLOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompassMarker {
    pub cardinal: Cardinal,
    pub transform: Transform,
    pub drawable: Drawable,
}

impl CompassMarker {
    fn new(cardinal: Cardinal) -> Self {
        Self {
            cardinal,
            transform: Transform::translate(cardinal.position()).with_yaw(cardinal.yaw_rad()),
            drawable: Drawable::triangle(MARKER_TRIANGLE, cardinal.color()),
        }
    }
}

/// Immutable compass geometry.
///
/// Closing the boundary is up to the caller: pass the first point again as
/// the last one for a closed outline.
#[derive(Debug, Clone, PartialEq)]
pub struct CompassModel {
    markers: [CompassMarker; 4],
    boundary: Drawable,
}

impl CompassModel {
    pub fn new(boundary_points: Vec<Vec3>) -> Self {
        Self {
            markers: Cardinal::ALL.map(CompassMarker::new),
            boundary: Drawable::polyline(boundary_points, BOUNDARY_COLOR),
        }
    }

    pub fn markers(&self) -> &[CompassMarker; 4] {
        &self.markers
    }

    pub fn marker(&self, cardinal: Cardinal) -> &CompassMarker {
        let idx = Cardinal::ALL
            .iter()
            .position(|c| *c == cardinal)
            .unwrap_or_default();
        &self.markers[idx]
    }

    pub fn boundary(&self) -> &Drawable {
        &self.boundary
    }

    /// Adds the compass to `world` under a new visible root rotated by
    /// `yaw_rad`; returns the root entity.
    pub fn spawn(&self, world: &mut World, yaw_rad: f64) -> EntityId {
        let root = world.spawn();
        world.set_transform(root, Transform::identity().with_yaw(yaw_rad));
        world.set_visibility(root, Visibility::Visible);

        for marker in &self.markers {
            let entity = world.spawn_child(root);
            world.set_transform(entity, marker.transform);
            world.set_drawable(entity, marker.drawable.clone());
        }

        let boundary = world.spawn_child(root);
        world.set_transform(boundary, Transform::identity());
        world.set_drawable(boundary, self.boundary.clone());

        root
    }
}

#[cfg(test)]
mod tests {
    use super::{Cardinal, CompassModel, MARKER_OFFSET};
    use crate::World;
    use crate::components::{Color, Shape};
    use foundation::math::Vec3;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-12, "expected {a:?} ~= {b:?}");
    }

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::new(-3.0, -1.5, -3.0),
            Vec3::new(3.0, -1.5, -3.0),
            Vec3::new(3.0, -1.5, 3.0),
            Vec3::new(-3.0, -1.5, -3.0),
        ]
    }

    #[test]
    fn markers_have_fixed_offsets_and_colors() {
        let compass = CompassModel::new(square());

        let north = compass.marker(Cardinal::North);
        assert_eq!(north.transform.position, Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(north.drawable.color, Color::BLUE);

        let south = compass.marker(Cardinal::South);
        assert_eq!(south.transform.position, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(south.drawable.color, Color::RED);

        let east = compass.marker(Cardinal::East);
        assert_eq!(east.transform.position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(east.drawable.color, Color::GREEN);

        let west = compass.marker(Cardinal::West);
        assert_eq!(west.transform.position, Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(west.drawable.color, Color::YELLOW);
    }

    #[test]
    fn marker_tips_point_outward() {
        let compass = CompassModel::new(square());
        for marker in compass.markers() {
            let tip = marker
                .transform
                .matrix()
                .transform_point(Vec3::new(0.0, 0.0, -1.0));
            let outward = marker.cardinal.position() * ((MARKER_OFFSET + 1.0) / MARKER_OFFSET);
            assert_vec_close(tip, outward);
        }
    }

    #[test]
    fn boundary_follows_supplied_points() {
        let points = square();
        let compass = CompassModel::new(points.clone());
        assert!(matches!(compass.boundary().shape, Shape::Polyline { .. }));
        assert_eq!(compass.boundary().vertices(), points.as_slice());
    }

    #[test]
    fn spawn_builds_rotated_root_with_five_children() {
        let mut world = World::new();
        let compass = CompassModel::new(square());
        let root = compass.spawn(&mut world, -0.5);

        assert_eq!(world.transform(root).unwrap().yaw_rad, -0.5);
        assert_eq!(world.children(root).len(), 5);
        assert_eq!(world.visible_drawables().len(), 5);
    }
}
