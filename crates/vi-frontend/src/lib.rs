//! Viewport Interaction Frontend
//!
//! Selection, gizmo manipulation and the per-frame loop that turns egui
//! input into camera motion, picking and undoable transform edits.

pub mod config;
pub mod panels;
pub mod state;

// Re-exports for convenience
pub use config::{AppConfig, ConfigError, ConfigManager};
pub use panels::viewport::{FrameOutput, InputFrame, Modifiers, ViewportKey, ViewportPanel};
pub use state::{
    EditorContext, GizmoError, GizmoManipulator, PickingService, PivotMode, SelectionSet,
    SharedEditorContext, SharedViewportState, ViewportSettings, ViewportState,
    create_shared_context,
};
