//! Global constants for vi-core

/// First identifier of the range reserved for gizmo handles.
///
/// Entity ids must stay strictly below this value; everything from here up
/// to `u32::MAX` is owned by the gizmo.
pub const GIZMO_ID_BASE: u32 = 0xFFFF_FF00;

/// Maximum number of composite transactions kept on the undo stack
pub const HISTORY_LIMIT: usize = 256;

/// Label used for transform edits coming from the property inspector
pub const INSPECTOR_TRANSFORM_LABEL: &str = "Transform (Inspector)";

/// Smallest scale magnitude ever written to an entity
pub const SCALE_EPSILON: f32 = 1e-4;
