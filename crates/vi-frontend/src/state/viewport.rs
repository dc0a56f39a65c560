//! Per-viewport interaction state

mod gizmo;
mod picking;

pub use gizmo::{GizmoError, GizmoManipulator, PivotMode};
pub use picking::PickingService;

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use vi_core::{BoundingBox, SceneAccess};
use vi_renderer::{
    GizmoMode, GizmoSpace, OrbitCamera, OrbitCameraState, ProjectionMode, RendererConfig,
    SnapSettings,
};

use crate::state::SelectionSet;

/// Viewport preferences persisted between sessions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub camera: OrbitCameraState,
    pub projection: ProjectionMode,
    pub snap: SnapSettings,
    pub gizmo_mode: GizmoMode,
    pub space: GizmoSpace,
    pub pivot_mode: PivotMode,
}

/// Camera, picking and gizmo state owned by one viewport
#[derive(Debug, Clone)]
pub struct ViewportState {
    pub camera: OrbitCamera,
    pub picking: PickingService,
    pub gizmo: GizmoManipulator,
    config: RendererConfig,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(RendererConfig::default())
    }
}

impl ViewportState {
    /// Create a new viewport state
    pub fn new(config: RendererConfig) -> Self {
        Self {
            camera: OrbitCamera::new(config.camera.clone()),
            picking: PickingService::new(config.picking.clone()),
            gizmo: GizmoManipulator::new(config.gizmo.snap),
            config,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Replace the renderer configuration, keeping camera pose and gizmo state
    pub fn set_config(&mut self, config: RendererConfig) {
        self.camera.set_config(config.camera.clone());
        self.picking.set_config(config.picking.clone());
        self.config = config;
    }

    /// Snapshot the persistable settings
    pub fn settings(&self) -> ViewportSettings {
        ViewportSettings {
            camera: self.camera.state(),
            projection: self.camera.projection(),
            snap: *self.gizmo.snap(),
            gizmo_mode: self.gizmo.mode(),
            space: self.gizmo.space(),
            pivot_mode: self.gizmo.pivot_mode(),
        }
    }

    /// Restore persisted settings.
    ///
    /// Gizmo settings are skipped while a drag is in progress.
    pub fn apply_settings(
        &mut self,
        settings: &ViewportSettings,
        selection: &SelectionSet,
        scene: &dyn SceneAccess,
    ) {
        self.camera.set_projection(settings.projection);
        self.camera.apply_state(settings.camera);

        if self.gizmo.is_dragging() {
            tracing::warn!("Gizmo settings not restored during an active drag");
            return;
        }
        self.gizmo.set_snap(settings.snap);
        if let Err(e) = self
            .gizmo
            .set_mode(settings.gizmo_mode)
            .and_then(|()| self.gizmo.set_space(settings.space))
        {
            tracing::warn!("Failed to restore gizmo settings: {e}");
        }
        self.gizmo.set_pivot_mode(settings.pivot_mode, selection, scene);
    }

    /// Start the camera animation toward the selection bounds.
    ///
    /// Returns `false` when nothing selected has bounds.
    pub fn frame_selection(&mut self, selection: &SelectionSet, scene: &dyn SceneAccess) -> bool {
        let bounds = selection
            .iter()
            .filter_map(|id| scene.world_bounds(id))
            .fold(BoundingBox::empty(), |acc, b| acc.union(&b));
        if bounds.is_empty() {
            return false;
        }
        tracing::debug!("Framing {} selected entities", selection.len());
        self.camera.frame_bounds(bounds.center(), bounds.radius());
        true
    }
}

/// Shared viewport state
pub type SharedViewportState = Arc<Mutex<ViewportState>>;
