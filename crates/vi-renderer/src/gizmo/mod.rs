//! Transform gizmo definitions
//!
//! Modes, coordinate spaces, handle identifiers and snapping shared by the
//! renderer (which draws handles into the ID buffer) and the frontend
//! (which interprets the handle that was hit).

mod geometry;

pub use geometry::{HandlePrimitive, HandleShape, handle_primitives};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use vi_core::constants::GIZMO_ID_BASE;

use crate::picking::PickId;

/// Gizmo mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GizmoMode {
    /// Move along axes or planes
    #[default]
    Translate,
    /// Rotate around axes
    Rotate,
    /// Scale along axes or uniformly
    Scale,
}

impl GizmoMode {
    /// Label used for the undo transaction of a drag in this mode
    pub fn label(&self) -> &'static str {
        match self {
            GizmoMode::Translate => "Translate",
            GizmoMode::Rotate => "Rotate",
            GizmoMode::Scale => "Scale",
        }
    }
}

/// Gizmo coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GizmoSpace {
    /// Handles aligned with the world axes
    #[default]
    World,
    /// Handles aligned with the pivot entity's rotation
    Local,
}

impl GizmoSpace {
    /// The other space
    pub fn toggled(self) -> Self {
        match self {
            GizmoSpace::World => GizmoSpace::Local,
            GizmoSpace::Local => GizmoSpace::World,
        }
    }
}

/// Principal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoAxis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl GizmoAxis {
    /// All axes in order
    pub const ALL: [GizmoAxis; 3] = [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z];

    /// Unit direction of the axis
    pub fn direction(&self) -> Vec3 {
        match self {
            GizmoAxis::X => Vec3::X,
            GizmoAxis::Y => Vec3::Y,
            GizmoAxis::Z => Vec3::Z,
        }
    }

    /// The two axes spanning the plane perpendicular to this one
    pub fn plane_axes(&self) -> (GizmoAxis, GizmoAxis) {
        match self {
            GizmoAxis::X => (GizmoAxis::Y, GizmoAxis::Z),
            GizmoAxis::Y => (GizmoAxis::Z, GizmoAxis::X),
            GizmoAxis::Z => (GizmoAxis::X, GizmoAxis::Y),
        }
    }
}

/// One interactive part of the gizmo.
///
/// The meaning of a handle depends on the mode: `Axis` moves, rotates
/// around or scales along an axis; `Plane` (identified by its normal)
/// moves or scales within a plane; `Center` moves in the view plane,
/// rotates around the view axis or scales uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoHandle {
    /// Single-axis handle
    Axis(GizmoAxis),
    /// Plane handle, named by the plane normal
    Plane(GizmoAxis),
    /// Center handle
    Center,
}

impl GizmoHandle {
    /// Every handle
    pub const ALL: [GizmoHandle; 7] = [
        GizmoHandle::Axis(GizmoAxis::X),
        GizmoHandle::Axis(GizmoAxis::Y),
        GizmoHandle::Axis(GizmoAxis::Z),
        GizmoHandle::Plane(GizmoAxis::X),
        GizmoHandle::Plane(GizmoAxis::Y),
        GizmoHandle::Plane(GizmoAxis::Z),
        GizmoHandle::Center,
    ];

    fn code(self) -> u32 {
        match self {
            GizmoHandle::Axis(GizmoAxis::X) => 1,
            GizmoHandle::Axis(GizmoAxis::Y) => 2,
            GizmoHandle::Axis(GizmoAxis::Z) => 3,
            GizmoHandle::Plane(GizmoAxis::X) => 4,
            GizmoHandle::Plane(GizmoAxis::Y) => 5,
            GizmoHandle::Plane(GizmoAxis::Z) => 6,
            GizmoHandle::Center => 7,
        }
    }

    /// Identifier written into the ID buffer for this handle
    pub fn pick_id(self) -> PickId {
        PickId(GIZMO_ID_BASE + self.code())
    }

    /// Decode a picked identifier
    pub fn from_pick_id(id: PickId) -> Option<Self> {
        let code = id.0.checked_sub(GIZMO_ID_BASE)?;
        Self::ALL.into_iter().find(|h| h.code() == code)
    }

    /// Axis color index for shading (`None` for the center handle)
    pub fn axis(self) -> Option<GizmoAxis> {
        match self {
            GizmoHandle::Axis(axis) | GizmoHandle::Plane(axis) => Some(axis),
            GizmoHandle::Center => None,
        }
    }
}

/// Snapping steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    /// Whether snapping is applied during drags
    pub enabled: bool,
    /// Translation step in world units
    pub move_step: f32,
    /// Rotation step in degrees
    pub angle_step_deg: f32,
    /// Scale multiplier step
    pub scale_step: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            move_step: 0.25,
            angle_step_deg: 15.0,
            scale_step: 0.1,
        }
    }
}

/// Round `value` to the nearest multiple of `step`.
///
/// Non-positive or non-finite steps leave the value untouched. Snapping an
/// already snapped value returns it unchanged.
pub fn snap(value: f32, step: f32) -> f32 {
    if !(step.is_finite() && step > 0.0) || !value.is_finite() {
        return value;
    }
    (value / step).round() * step
}
