//! Entity selection

use std::collections::BTreeSet;

use glam::Vec3;
use vi_core::{EntityId, SceneAccess};

/// Selected entities plus the active and anchor entities.
///
/// `active` is always a member of the selection or `None`. Iteration is in
/// ascending id order so derived values such as the centroid do not depend
/// on click order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    selected: BTreeSet<EntityId>,
    active: Option<EntityId>,
    anchor: Option<EntityId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.selected.iter().copied()
    }

    pub fn active(&self) -> Option<EntityId> {
        self.active
    }

    /// Start point for range selection
    pub fn anchor(&self) -> Option<EntityId> {
        self.anchor
    }

    /// Select exactly one entity
    pub fn set_single(&mut self, id: EntityId) {
        self.selected.clear();
        self.selected.insert(id);
        self.active = Some(id);
        self.anchor = Some(id);
    }

    /// Flip membership of one entity
    pub fn toggle(&mut self, id: EntityId) {
        if self.selected.remove(&id) {
            if self.active == Some(id) {
                self.active = self.selected.first().copied();
            }
            if self.anchor == Some(id) {
                self.anchor = self.active;
            }
        } else {
            self.selected.insert(id);
            self.active = Some(id);
            self.anchor = Some(id);
        }
    }

    /// Add entities, keeping the active one if there is one
    pub fn add_many(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        let mut first_new = None;
        for id in ids {
            if self.selected.insert(id) {
                first_new.get_or_insert(id);
            }
        }
        if self.active.is_none() {
            self.active = first_new;
            self.anchor = self.anchor.or(first_new);
        }
    }

    /// Replace the selection; the first id becomes active
    pub fn replace_many(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        let mut ids = ids.into_iter().peekable();
        let first = ids.peek().copied();
        self.selected = ids.collect();
        self.active = first;
        self.anchor = first;
    }

    /// Select the inclusive slice of `order` between `from` and `to`.
    ///
    /// Works in either direction. Falls back to selecting `to` alone when
    /// `from` is not in `order`, and does nothing when `to` is not.
    pub fn range_select(&mut self, from: EntityId, to: EntityId, order: &[EntityId]) {
        let Some(end) = order.iter().position(|&id| id == to) else {
            return;
        };
        let Some(start) = order.iter().position(|&id| id == from) else {
            self.set_single(to);
            return;
        };
        let (lo, hi) = (start.min(end), start.max(end));
        self.selected = order[lo..=hi].iter().copied().collect();
        self.anchor = Some(from);
        self.active = Some(to);
    }

    /// Deselect everything
    pub fn clear(&mut self) {
        self.selected.clear();
        self.active = None;
        self.anchor = None;
    }

    /// Drop ids that no longer exist in the scene
    pub fn retain_existing(&mut self, scene: &dyn SceneAccess) {
        let before = self.selected.len();
        self.selected.retain(|&id| scene.contains(id));
        if self.selected.len() == before {
            return;
        }
        if self.active.is_some_and(|id| !self.selected.contains(&id)) {
            self.active = self.selected.first().copied();
        }
        if self.anchor.is_some_and(|id| !self.selected.contains(&id)) {
            self.anchor = self.active;
        }
    }

    /// Mean position of the selected entities present in the scene
    pub fn compute_center(&self, scene: &dyn SceneAccess) -> Option<Vec3> {
        let (sum, count) = self
            .selected
            .iter()
            .filter_map(|&id| scene.transform(id))
            .fold((Vec3::ZERO, 0u32), |(sum, n), xform| (sum + xform.position, n + 1));
        (count > 0).then(|| sum / count as f32)
    }
}
