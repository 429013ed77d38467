use crate::components::{Drawable, Transform, Visibility};
use crate::entity::EntityId;
use foundation::handles::Handle;
use foundation::math::Mat4;

/// Scene graph storage: one optional component slot per entity index.
///
/// Hierarchy is expressed through a parent link; a child's world matrix is
/// `parent_world * local`, and a hidden ancestor hides the whole subtree.
#[derive(Debug, Default)]
pub struct World {
    next_index: u32,
    transforms: Vec<Option<Transform>>,
    visibility: Vec<Option<Visibility>>,
    drawables: Vec<Option<Drawable>>,
    parents: Vec<Option<EntityId>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(Handle::new(self.next_index, 0));
        self.next_index += 1;
        self.ensure_capacity(id.index() as usize);
        id
    }

    pub fn spawn_child(&mut self, parent: EntityId) -> EntityId {
        let child = self.spawn();
        self.set_parent(child, parent);
        child
    }

    pub fn entity_count(&self) -> usize {
        self.next_index as usize
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        self.ensure_capacity(entity.index() as usize);
        self.transforms[entity.index() as usize] = Some(transform);
    }

    pub fn set_visibility(&mut self, entity: EntityId, visibility: Visibility) {
        self.ensure_capacity(entity.index() as usize);
        self.visibility[entity.index() as usize] = Some(visibility);
    }

    pub fn set_drawable(&mut self, entity: EntityId, drawable: Drawable) {
        self.ensure_capacity(entity.index() as usize);
        self.drawables[entity.index() as usize] = Some(drawable);
    }

    pub fn set_parent(&mut self, entity: EntityId, parent: EntityId) {
        self.ensure_capacity(entity.index() as usize);
        self.parents[entity.index() as usize] = Some(parent);
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.transforms.get(entity.index() as usize).and_then(|t| *t)
    }

    /// The entity's own visibility flag (defaults to visible).
    pub fn visibility(&self, entity: EntityId) -> Visibility {
        self.visibility
            .get(entity.index() as usize)
            .and_then(|v| *v)
            .unwrap_or_default()
    }

    pub fn drawable(&self, entity: EntityId) -> Option<&Drawable> {
        self.drawables
            .get(entity.index() as usize)
            .and_then(|d| d.as_ref())
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.parents.get(entity.index() as usize).and_then(|p| *p)
    }

    pub fn children(&self, entity: EntityId) -> Vec<EntityId> {
        self.parents
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == Some(entity))
            .map(|(idx, _)| EntityId(Handle::new(idx as u32, 0)))
            .collect()
    }

    /// Visible only if the entity and every ancestor are visible.
    pub fn is_visible(&self, entity: EntityId) -> bool {
        let mut current = Some(entity);
        let mut depth = 0usize;
        while let Some(e) = current {
            if !self.visibility(e).is_visible() {
                return false;
            }
            current = self.parent(e);
            depth += 1;
            if depth > self.transforms.len() {
                // Parent cycle; treat as detached.
                break;
            }
        }
        true
    }

    pub fn world_matrix(&self, entity: EntityId) -> Mat4 {
        let mut chain = Vec::new();
        let mut current = Some(entity);
        while let Some(e) = current {
            if chain.len() > self.transforms.len() {
                break;
            }
            chain.push(e);
            current = self.parent(e);
        }

        chain.iter().rev().fold(Mat4::IDENTITY, |acc, e| {
            let local = self.transform(*e).unwrap_or_default().matrix();
            acc.mul(&local)
        })
    }

    /// Visible drawables with their world matrices, in entity order.
    pub fn visible_drawables(&self) -> Vec<(EntityId, Mat4, &Drawable)> {
        let mut out = Vec::new();
        for (idx, drawable) in self.drawables.iter().enumerate() {
            let Some(drawable) = drawable else { continue };
            let entity = EntityId(Handle::new(idx as u32, 0));
            if !self.is_visible(entity) {
                continue;
            }
            out.push((entity, self.world_matrix(entity), drawable));
        }
        out
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.transforms.len() <= idx {
            let new_len = idx + 1;
            self.transforms.resize(new_len, None);
            self.visibility.resize(new_len, None);
            self.drawables.resize(new_len, None);
            self.parents.resize(new_len, None);
        }
    }
}
