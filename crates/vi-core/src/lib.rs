//! Viewport Core
//!
//! Data model shared by the renderer and the interaction frontend:
//! entity identifiers, transforms, bounding boxes, the scene store and
//! the undo/redo transaction log.

pub mod bounds;
pub mod constants;
pub mod history;
pub mod scene;
pub mod transform;

// Re-exports for convenience
pub use bounds::BoundingBox;
pub use history::{CompositeTransaction, HistoryError, TransactionLog, TransformRecord};
pub use scene::{Entity, Scene, SceneAccess, SceneError};
pub use transform::{EntityId, Xform, clamp_scale};
