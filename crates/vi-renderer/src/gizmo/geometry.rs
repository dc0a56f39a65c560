//! World-space handle shapes for drawing the gizmo into an ID buffer

use glam::{Quat, Vec3};

use super::{GizmoAxis, GizmoHandle, GizmoMode};
use crate::constants::gizmo::{AXIS_START, PLANE_INNER, PLANE_OUTER, RING_SEGMENTS};

/// Shape of a handle primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleShape {
    /// Thick line between two points
    Segment {
        /// Start point
        a: Vec3,
        /// End point
        b: Vec3,
    },
    /// Filled quad, corners in winding order
    Quad([Vec3; 4]),
    /// Screen-space disc around a point
    Dot {
        /// Disc center
        center: Vec3,
    },
}

/// A shape tagged with the handle it belongs to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandlePrimitive {
    /// Handle identity
    pub handle: GizmoHandle,
    /// Geometry
    pub shape: HandleShape,
}

/// Generate the handle primitives for a gizmo.
///
/// `length` is the world-space handle length. Primitives are returned in
/// draw order; later ones win where they overlap, so the center handle
/// comes last.
pub fn handle_primitives(
    mode: GizmoMode,
    position: Vec3,
    orientation: Quat,
    length: f32,
) -> Vec<HandlePrimitive> {
    let dir = |axis: GizmoAxis| orientation * axis.direction();
    let mut primitives = Vec::new();

    match mode {
        GizmoMode::Translate | GizmoMode::Scale => {
            for normal in GizmoAxis::ALL {
                let (u, v) = normal.plane_axes();
                let (u, v) = (dir(u) * length, dir(v) * length);
                primitives.push(HandlePrimitive {
                    handle: GizmoHandle::Plane(normal),
                    shape: HandleShape::Quad([
                        position + u * PLANE_INNER + v * PLANE_INNER,
                        position + u * PLANE_OUTER + v * PLANE_INNER,
                        position + u * PLANE_OUTER + v * PLANE_OUTER,
                        position + u * PLANE_INNER + v * PLANE_OUTER,
                    ]),
                });
            }
            for axis in GizmoAxis::ALL {
                let d = dir(axis) * length;
                primitives.push(HandlePrimitive {
                    handle: GizmoHandle::Axis(axis),
                    shape: HandleShape::Segment {
                        a: position + d * AXIS_START,
                        b: position + d,
                    },
                });
            }
        }
        GizmoMode::Rotate => {
            for axis in GizmoAxis::ALL {
                let (u, v) = axis.plane_axes();
                let (u, v) = (dir(u) * length, dir(v) * length);
                let point = |i: usize| {
                    let angle = i as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
                    position + u * angle.cos() + v * angle.sin()
                };
                for i in 0..RING_SEGMENTS {
                    primitives.push(HandlePrimitive {
                        handle: GizmoHandle::Axis(axis),
                        shape: HandleShape::Segment {
                            a: point(i),
                            b: point(i + 1),
                        },
                    });
                }
            }
        }
    }

    primitives.push(HandlePrimitive {
        handle: GizmoHandle::Center,
        shape: HandleShape::Dot { center: position },
    });
    primitives
}
