//! Viewport Renderer Side
//!
//! Camera and picking infrastructure consumed by the interaction frontend.
//!
//! # Module Structure
//!
//! ```text
//! vi-renderer/
//! ├── camera.rs     # Orbit camera, projections, view geometry
//! ├── config.rs     # Serializable camera/gizmo/picking settings
//! ├── constants.rs  # Tuning constants
//! ├── gizmo/        # Gizmo modes, handle ids, handle geometry, snapping
//! ├── picking.rs    # PickId classification and the CPU ID buffer
//! ├── backend.rs    # Renderer contract (RenderBackend)
//! └── software.rs   # CPU reference backend
//! ```

pub mod backend;
pub mod camera;
pub mod config;
pub mod constants;
pub mod gizmo;
pub mod picking;
pub mod software;

pub use backend::{ColorTexture, RenderBackend};
pub use camera::{OrbitCamera, OrbitCameraState, ProjectionMode, ViewGeometry};
pub use config::{CameraConfig, GizmoConfig, PickingConfig, RendererConfig, ViewportConfig};
pub use gizmo::{GizmoAxis, GizmoHandle, GizmoMode, GizmoSpace, SnapSettings};
pub use picking::{IdBuffer, PickId};
pub use software::SoftwareRenderer;
