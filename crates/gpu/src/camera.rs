use foundation::math::{Mat4, Vec3, Viewport, to_screen_position};

/// Pose-driven camera: the XR runtime supplies both matrices every frame,
/// so nothing here is derived from look-at parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    /// Camera-to-world transform (`XRView.transform.matrix`).
    pub world_from_view: Mat4,
    /// `XRView.projectionMatrix`.
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            world_from_view: Mat4::IDENTITY,
            projection: Mat4::perspective_rh_gl(50f64.to_radians(), 1.0, 0.1, 2000.0),
        }
    }
}

impl Camera {
    pub fn update_from_pose(&mut self, world_from_view: Mat4, projection: Mat4) {
        self.world_from_view = world_from_view;
        self.projection = projection;
    }

    pub fn view(&self) -> Mat4 {
        self.world_from_view.rigid_inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection.mul(&self.view())
    }

    pub fn position(&self) -> Vec3 {
        let t = self.world_from_view.cols[3];
        Vec3::new(t[0], t[1], t[2])
    }

    pub fn to_screen_position(&self, point: Vec3, viewport: Viewport) -> Vec3 {
        to_screen_position(point, &self.view_projection(), viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::Camera;
    use foundation::math::{Mat4, Vec3, Viewport};

    #[test]
    fn translated_camera_sees_point_ahead_at_center() {
        let mut camera = Camera::default();
        camera.update_from_pose(
            Mat4::translation(Vec3::new(1.0, 1.6, 0.0)),
            Mat4::perspective_rh_gl(1.0, 1.0, 0.1, 100.0),
        );
        assert_eq!(camera.position(), Vec3::new(1.0, 1.6, 0.0));

        let viewport = Viewport::sized(400.0, 400.0);
        let p = camera.to_screen_position(Vec3::new(1.0, 1.6, -3.0), viewport);
        assert!((p.x - 200.0).abs() < 1e-9);
        assert!((p.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn point_right_of_camera_lands_right_of_center() {
        let camera = Camera::default();
        let viewport = Viewport::sized(800.0, 600.0);
        let p = camera.to_screen_position(Vec3::new(0.5, 0.0, -4.0), viewport);
        assert!(p.x > 400.0 && p.x <= 800.0);
    }
}
