use foundation::math::Vec3;

use super::Color;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Filled triangle in local space.
    Triangle { vertices: [Vec3; 3] },
    /// Connected line strip through `vertices`, in order.
    Polyline { vertices: Vec<Vec3> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub shape: Shape,
    pub color: Color,
}

impl Drawable {
    pub fn triangle(vertices: [Vec3; 3], color: Color) -> Self {
        Self {
            shape: Shape::Triangle { vertices },
            color,
        }
    }

    pub fn polyline(vertices: Vec<Vec3>, color: Color) -> Self {
        Self {
            shape: Shape::Polyline { vertices },
            color,
        }
    }

    pub fn vertices(&self) -> &[Vec3] {
        match &self.shape {
            Shape::Triangle { vertices } => vertices,
            Shape::Polyline { vertices } => vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Drawable, Shape};
    use crate::components::Color;
    use foundation::math::Vec3;

    #[test]
    fn polyline_exposes_vertices_in_order() {
        let pts = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        let drawable = Drawable::polyline(pts.clone(), Color::WHITE);
        assert!(matches!(drawable.shape, Shape::Polyline { .. }));
        assert_eq!(drawable.vertices(), pts.as_slice());
    }
}
