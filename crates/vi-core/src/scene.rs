//! Scene store and the access trait the viewport manipulates

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bounds::BoundingBox;
use crate::constants::GIZMO_ID_BASE;
use crate::transform::{EntityId, Xform};

/// Errors raised when building a scene
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("entity id {0} is zero or inside the gizmo handle range")]
    InvalidId(u32),
    #[error("entity id {0} already exists")]
    DuplicateId(EntityId),
    #[error("no entity ids left below the gizmo handle range")]
    IdSpaceExhausted,
}

/// Read/write access to entity transforms.
///
/// The viewport only needs enumeration, transform access and local
/// bounds, so any scene representation can sit behind this trait.
pub trait SceneAccess {
    /// All entity ids in stable visible order (outliner order)
    fn entity_ids(&self) -> Vec<EntityId>;

    fn transform(&self, id: EntityId) -> Option<Xform>;

    /// Write a transform; returns false when the entity does not exist
    fn set_transform(&mut self, id: EntityId, xform: Xform) -> bool;

    /// Local-space bounds of the entity
    fn bounds(&self, id: EntityId) -> Option<BoundingBox>;

    fn contains(&self, id: EntityId) -> bool {
        self.transform(id).is_some()
    }

    /// Bounds transformed into world space
    fn world_bounds(&self, id: EntityId) -> Option<BoundingBox> {
        let xform = self.transform(id)?;
        let bounds = self.bounds(id)?;
        Some(bounds.transform(&xform.to_matrix()))
    }
}

/// A scene entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub transform: Xform,
    /// Local-space bounds
    pub bounds: BoundingBox,
}

impl Entity {
    pub fn new(id: EntityId, name: impl Into<String>, transform: Xform) -> Self {
        Self {
            id,
            name: name.into(),
            transform,
            bounds: BoundingBox::default(),
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = bounds;
        self
    }
}

/// Flat entity store in insertion order
#[derive(Debug, Clone, Default)]
pub struct Scene {
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
    next_id: u32,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity with a freshly allocated id
    pub fn spawn(&mut self, name: impl Into<String>, transform: Xform) -> Result<EntityId, SceneError> {
        let mut candidate = self.next_id.max(1);
        while self.index.contains_key(&EntityId(candidate)) {
            candidate += 1;
        }
        if candidate >= GIZMO_ID_BASE {
            return Err(SceneError::IdSpaceExhausted);
        }
        let id = EntityId(candidate);
        self.insert(Entity::new(id, name, transform))?;
        Ok(id)
    }

    /// Insert an entity with a caller-chosen id
    pub fn insert(&mut self, mut entity: Entity) -> Result<(), SceneError> {
        if !entity.id.is_valid() {
            return Err(SceneError::InvalidId(entity.id.raw()));
        }
        if self.index.contains_key(&entity.id) {
            return Err(SceneError::DuplicateId(entity.id));
        }
        entity.transform = entity.transform.sanitized();
        self.next_id = self.next_id.max(entity.id.raw() + 1);
        self.index.insert(entity.id, self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    /// Remove an entity, keeping the order of the others
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let position = self.index.remove(&id)?;
        let entity = self.entities.remove(position);
        for (i, e) in self.entities.iter().enumerate().skip(position) {
            self.index.insert(e.id, i);
        }
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|&i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let i = *self.index.get(&id)?;
        self.entities.get_mut(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl SceneAccess for Scene {
    fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id).collect()
    }

    fn transform(&self, id: EntityId) -> Option<Xform> {
        self.get(id).map(|e| e.transform)
    }

    fn set_transform(&mut self, id: EntityId, xform: Xform) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.transform = xform.sanitized();
                true
            }
            None => false,
        }
    }

    fn bounds(&self, id: EntityId) -> Option<BoundingBox> {
        self.get(id).map(|e| e.bounds)
    }
}
