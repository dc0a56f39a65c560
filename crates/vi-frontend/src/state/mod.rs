//! Editor state module

mod selection;
mod viewport;

pub use selection::SelectionSet;
pub use viewport::{
    GizmoError, GizmoManipulator, PickingService, PivotMode, SharedViewportState,
    ViewportSettings, ViewportState,
};

use std::sync::Arc;

use parking_lot::Mutex;

use vi_core::{EntityId, HistoryError, Scene, SceneAccess, TransactionLog, Xform};

/// Scene, selection and history edited together by the viewport and panels
#[derive(Debug, Default)]
pub struct EditorContext {
    pub scene: Scene,
    pub selection: SelectionSet,
    pub history: TransactionLog,
}

impl EditorContext {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            selection: SelectionSet::new(),
            history: TransactionLog::new(),
        }
    }

    /// Apply a transform typed into an inspector as one undoable step.
    ///
    /// Returns whether anything changed.
    pub fn apply_inspector_edit(&mut self, id: EntityId, xform: Xform) -> Result<bool, HistoryError> {
        let Some(before) = self.scene.transform(id) else {
            tracing::warn!("Inspector edit for missing entity {id}");
            return Ok(false);
        };
        if !self.scene.set_transform(id, xform) {
            return Ok(false);
        }
        // Record what the scene actually stored after sanitizing
        let after = self.scene.transform(id).unwrap_or(xform);
        self.history.record_inspector_edit(id, before, after)
    }

    /// Undo the latest transaction; returns its label
    pub fn undo(&mut self) -> Option<String> {
        let label = self.history.undo(&mut self.scene)?;
        self.selection.retain_existing(&self.scene);
        tracing::info!("Undo: {label}");
        Some(label)
    }

    /// Redo the latest undone transaction; returns its label
    pub fn redo(&mut self) -> Option<String> {
        let label = self.history.redo(&mut self.scene)?;
        self.selection.retain_existing(&self.scene);
        tracing::info!("Redo: {label}");
        Some(label)
    }
}

/// Shared editor context
pub type SharedEditorContext = Arc<Mutex<EditorContext>>;

/// Create a new shared editor context
pub fn create_shared_context(scene: Scene) -> SharedEditorContext {
    Arc::new(Mutex::new(EditorContext::new(scene)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_inspector_edit_is_undoable() {
        let mut scene = Scene::new();
        let id = scene.spawn("box", Xform::IDENTITY).unwrap();
        let context = create_shared_context(scene);
        let mut ctx = context.lock();

        let moved = Xform::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(ctx.apply_inspector_edit(id, moved).unwrap());
        assert!(!ctx.apply_inspector_edit(id, moved).unwrap());
        assert_eq!(ctx.history.len(), 1);

        assert_eq!(ctx.undo().as_deref(), Some(vi_core::constants::INSPECTOR_TRANSFORM_LABEL));
        assert_eq!(ctx.scene.transform(id), Some(Xform::IDENTITY));
        assert!(ctx.redo().is_some());
        assert_eq!(ctx.scene.transform(id).map(|x| x.position), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(ctx.redo().is_none());
    }
}
