//! Entity identifiers and decomposed transforms

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{GIZMO_ID_BASE, SCALE_EPSILON};

/// Identifier of a scene entity.
///
/// Valid ids are non-zero and below [`GIZMO_ID_BASE`], so they can be
/// written verbatim into an ID buffer next to gizmo handle ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Raw value as stored in the ID buffer
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Whether the raw value may name an entity
    pub fn is_valid(self) -> bool {
        self.0 != 0 && self.0 < GIZMO_ID_BASE
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position, rotation and scale of an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Xform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Xform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Transform at the given position with no rotation and unit scale
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Model matrix (scale, then rotate, then translate)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Copy with degenerate components repaired.
    ///
    /// Non-finite values fall back to identity components and scale
    /// magnitudes are kept above [`SCALE_EPSILON`]. Valid transforms come
    /// back bit-for-bit unchanged.
    pub fn sanitized(&self) -> Self {
        let position = if self.position.is_finite() {
            self.position
        } else {
            Vec3::ZERO
        };
        let rotation = if !self.rotation.is_finite() || self.rotation.length_squared() == 0.0 {
            Quat::IDENTITY
        } else if self.rotation.is_normalized() {
            self.rotation
        } else {
            self.rotation.normalize()
        };
        let scale = if self.scale.is_finite() {
            clamp_scale(self.scale)
        } else {
            Vec3::ONE
        };
        Self {
            position,
            rotation,
            scale,
        }
    }
}

/// Keep every component's magnitude at or above [`SCALE_EPSILON`], preserving sign
pub fn clamp_scale(scale: Vec3) -> Vec3 {
    let clamp = |v: f32| {
        if v.abs() < SCALE_EPSILON {
            SCALE_EPSILON.copysign(if v == 0.0 { 1.0 } else { v })
        } else {
            v
        }
    };
    Vec3::new(clamp(scale.x), clamp(scale.y), clamp(scale.z))
}
