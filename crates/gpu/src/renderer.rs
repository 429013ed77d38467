use foundation::math::{Mat4, Viewport};
use scene::components::Shape;
use scene::world::World;

use crate::camera::Camera;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    LineStrip,
}

/// One draw call: world-space vertices in `f32`, flat color.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub primitive: Primitive,
    pub vertices: Vec<[f32; 3]>,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub viewport: Viewport,
    pub view_projection: Mat4,
    pub commands: Vec<DrawCommand>,
}

impl RenderFrame {
    pub fn vertex_count(&self) -> usize {
        self.commands.iter().map(|c| c.vertices.len()).sum()
    }
}

pub struct Renderer;

impl Renderer {
    /// Flattens every visible drawable into world-space draw commands.
    ///
    /// Vertices are transformed on the CPU; the scene is a handful of
    /// triangles and one line strip.
    pub fn collect(world: &World, camera: &Camera, viewport: Viewport) -> RenderFrame {
        let mut commands = Vec::new();
        for (_, model, drawable) in world.visible_drawables() {
            let primitive = match drawable.shape {
                Shape::Triangle { .. } => Primitive::Triangles,
                Shape::Polyline { .. } => Primitive::LineStrip,
            };
            let vertices: Vec<[f32; 3]> = drawable
                .vertices()
                .iter()
                .map(|v| model.transform_point(*v).as_f32())
                .collect();
            if primitive == Primitive::LineStrip && vertices.len() < 2 {
                continue;
            }
            commands.push(DrawCommand {
                primitive,
                vertices,
                color: drawable.color.as_array(),
            });
        }

        RenderFrame {
            viewport,
            view_projection: camera.view_projection(),
            commands,
        }
    }
}
