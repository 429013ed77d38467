use foundation::math::{Mat4, Vec3};

/// Local transform relative to the parent entity (or the scene root).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation about +Y in radians.
    pub yaw_rad: f64,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw_rad: 0.0,
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            yaw_rad: 0.0,
        }
    }

    pub fn with_yaw(self, yaw_rad: f64) -> Self {
        Self { yaw_rad, ..self }
    }

    /// `T * R`: rotate about the local origin, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::translation(self.position).mul(&Mat4::rotation_y(self.yaw_rad))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::Transform;
    use foundation::math::{Mat4, Vec3};
    use std::f64::consts::PI;

    #[test]
    fn identity_is_origin() {
        let transform = Transform::identity();
        assert_eq!(transform.position, Vec3::ZERO);
        assert_eq!(transform.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn matrix_rotates_before_translating() {
        let t = Transform::translate(Vec3::new(0.0, 0.0, 2.0)).with_yaw(PI);
        let tip = t.matrix().transform_point(Vec3::new(0.0, 0.0, -1.0));
        assert!(tip.distance(Vec3::new(0.0, 0.0, 3.0)) < 1e-12);
    }
}
