//! Gizmo drag state machine
//!
//! A drag snapshots the selected entities, then recomputes every
//! transform from those snapshots on each pointer update. Transforms are
//! written into the scene live; the undo transaction is only built when the
//! drag ends.

use std::collections::BTreeMap;
use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vi_core::constants::SCALE_EPSILON;
use vi_core::{CompositeTransaction, EntityId, SceneAccess, TransformRecord, Xform, clamp_scale};
use vi_renderer::gizmo::snap;
use vi_renderer::{
    GizmoAxis, GizmoHandle, GizmoMode, GizmoSpace, RenderBackend, SnapSettings, ViewGeometry,
};

use crate::state::SelectionSet;

/// Pixels of pointer travel that double (or halve) a scale
const SCALE_PIXELS_PER_UNIT: f32 = 100.0;

/// Rejected gizmo operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GizmoError {
    #[error("a gizmo drag is already in progress")]
    DragInProgress,
    #[error("no gizmo drag is in progress")]
    NotDragging,
    #[error("nothing is selected")]
    EmptySelection,
    #[error("the selection has no pivot")]
    NoPivot,
}

/// Where the gizmo sits relative to the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PivotMode {
    /// Centroid of the selection
    #[default]
    Center,
    /// Origin of the active entity
    Active,
}

impl PivotMode {
    pub fn toggled(self) -> Self {
        match self {
            PivotMode::Center => PivotMode::Active,
            PivotMode::Active => PivotMode::Center,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PivotMode::Center => "Center",
            PivotMode::Active => "Active",
        }
    }
}

/// State captured when a drag begins
#[derive(Debug, Clone)]
struct DragState {
    mode: GizmoMode,
    handle: GizmoHandle,
    space: GizmoSpace,
    start_pointer: Vec2,
    pivot: Vec3,
    orientation: Quat,
    start_transforms: BTreeMap<EntityId, Xform>,
    last_angle: Option<f32>,
    accumulated_angle: f32,
    /// Gizmo position shown while translating
    live_pivot: Vec3,
    transaction: CompositeTransaction,
}

/// Transform gizmo: mode, space, pivot and the active drag
#[derive(Debug, Clone, Default)]
pub struct GizmoManipulator {
    mode: GizmoMode,
    space: GizmoSpace,
    pivot_mode: PivotMode,
    snap: SnapSettings,
    pivot: Option<Vec3>,
    orientation: Quat,
    drag: Option<DragState>,
}

/// Ray-plane intersection in front of the ray origin
fn ray_plane_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    plane_point: Vec3,
    plane_normal: Vec3,
) -> Option<Vec3> {
    let denom = ray_dir.dot(plane_normal);
    if denom.abs() < 1e-6 {
        return None;
    }

    let t = (plane_point - ray_origin).dot(plane_normal) / denom;
    if t < 0.0 {
        return None;
    }

    Some(ray_origin + ray_dir * t)
}

/// Wrap an angle into `(-PI, PI]`
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Screen-space image of one world unit along `dir` starting at `origin`
fn screen_axis(geometry: &ViewGeometry, origin: Vec3, dir: Vec3) -> Option<Vec2> {
    let a = geometry.world_to_screen(origin)?;
    let b = geometry.world_to_screen(origin + dir)?;
    let s = b - a;
    (s.length_squared() > 1e-6).then_some(s)
}

impl GizmoManipulator {
    pub fn new(snap: SnapSettings) -> Self {
        Self {
            snap,
            orientation: Quat::IDENTITY,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    pub fn space(&self) -> GizmoSpace {
        self.space
    }

    pub fn pivot_mode(&self) -> PivotMode {
        self.pivot_mode
    }

    pub fn snap(&self) -> &SnapSettings {
        &self.snap
    }

    pub fn set_snap(&mut self, snap: SnapSettings) {
        self.snap = snap;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Handle being dragged
    pub fn active_handle(&self) -> Option<GizmoHandle> {
        self.drag.as_ref().map(|drag| drag.handle)
    }

    /// Current gizmo position; `None` when nothing is selected
    pub fn pivot(&self) -> Option<Vec3> {
        match &self.drag {
            Some(drag) => Some(drag.live_pivot),
            None => self.pivot,
        }
    }

    /// Gizmo axes orientation (identity in world space)
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Change the mode; rejected while dragging
    pub fn set_mode(&mut self, mode: GizmoMode) -> Result<(), GizmoError> {
        if self.is_dragging() {
            return Err(GizmoError::DragInProgress);
        }
        self.mode = mode;
        Ok(())
    }

    /// Change the coordinate space; rejected while dragging
    pub fn set_space(&mut self, space: GizmoSpace) -> Result<(), GizmoError> {
        if self.is_dragging() {
            return Err(GizmoError::DragInProgress);
        }
        self.space = space;
        Ok(())
    }

    /// Change the pivot mode, repositioning the gizmo at once when idle
    pub fn set_pivot_mode(
        &mut self,
        pivot_mode: PivotMode,
        selection: &SelectionSet,
        scene: &dyn SceneAccess,
    ) {
        self.pivot_mode = pivot_mode;
        self.refresh_pivot(selection, scene);
    }

    /// Recompute pivot and orientation from the selection.
    ///
    /// Ignored while dragging so the drag keeps its reference frame.
    pub fn refresh_pivot(&mut self, selection: &SelectionSet, scene: &dyn SceneAccess) {
        if self.is_dragging() {
            return;
        }
        let reference = selection
            .active()
            .or_else(|| selection.iter().next())
            .and_then(|id| scene.transform(id));
        let center = selection.compute_center(scene);

        self.pivot = match self.pivot_mode {
            PivotMode::Center => center,
            PivotMode::Active => selection
                .active()
                .and_then(|id| scene.transform(id))
                .map(|xform| xform.position)
                .or(center),
        };
        self.orientation = match (self.space, reference) {
            (GizmoSpace::Local, Some(xform)) => xform.rotation.normalize(),
            _ => Quat::IDENTITY,
        };
    }

    /// Push the overlay state to the renderer
    pub fn sync_backend(&self, backend: &mut dyn RenderBackend) {
        match self.pivot() {
            Some(position) => {
                backend.set_gizmo_visible(true);
                backend.set_gizmo_position(position);
                backend.set_gizmo_mode(self.mode, self.orientation);
            }
            None => backend.set_gizmo_visible(false),
        }
    }

    /// Start dragging `handle` from `pointer` (image-relative pixels)
    pub fn begin_drag(
        &mut self,
        handle: GizmoHandle,
        pointer: Vec2,
        selection: &SelectionSet,
        scene: &dyn SceneAccess,
    ) -> Result<(), GizmoError> {
        if self.is_dragging() {
            return Err(GizmoError::DragInProgress);
        }
        if selection.is_empty() {
            return Err(GizmoError::EmptySelection);
        }
        self.refresh_pivot(selection, scene);
        let pivot = self.pivot.ok_or(GizmoError::NoPivot)?;

        let start_transforms: BTreeMap<EntityId, Xform> = selection
            .iter()
            .filter_map(|id| scene.transform(id).map(|xform| (id, xform)))
            .collect();

        tracing::debug!(
            "Begin {} drag on {:?} with {} entities",
            self.mode.label(),
            handle,
            start_transforms.len()
        );
        self.drag = Some(DragState {
            mode: self.mode,
            handle,
            space: self.space,
            start_pointer: pointer,
            pivot,
            orientation: self.orientation,
            start_transforms,
            last_angle: None,
            accumulated_angle: 0.0,
            live_pivot: pivot,
            transaction: CompositeTransaction::new(self.mode.label()),
        });
        Ok(())
    }

    /// Recompute all dragged transforms for a new pointer position
    pub fn update_drag(
        &mut self,
        pointer: Vec2,
        geometry: &ViewGeometry,
        scene: &mut dyn SceneAccess,
    ) -> Result<(), GizmoError> {
        let settings = self.snap;
        let drag = self.drag.as_mut().ok_or(GizmoError::NotDragging)?;
        if !pointer.is_finite() {
            return Ok(());
        }
        match drag.mode {
            GizmoMode::Translate => drag.update_translate(pointer, geometry, &settings, scene),
            GizmoMode::Rotate => drag.update_rotate(pointer, geometry, &settings, scene),
            GizmoMode::Scale => drag.update_scale(pointer, geometry, &settings, scene),
        }
        Ok(())
    }

    /// Finish the drag.
    ///
    /// Returns the transaction recording every entity whose transform
    /// changed, or `None` when nothing moved.
    pub fn end_drag(
        &mut self,
        scene: &dyn SceneAccess,
    ) -> Result<Option<CompositeTransaction>, GizmoError> {
        let drag = self.drag.take().ok_or(GizmoError::NotDragging)?;
        let mut transaction = drag.transaction;
        for (&id, &before) in &drag.start_transforms {
            let Some(after) = scene.transform(id) else {
                continue;
            };
            if after != before {
                transaction.push(TransformRecord { id, before, after });
            }
        }

        if transaction.is_empty() {
            tracing::debug!("{} drag ended without changes", transaction.label);
            Ok(None)
        } else {
            Ok(Some(transaction))
        }
    }

    /// Abort the drag and restore every snapshot
    pub fn cancel_drag(&mut self, scene: &mut dyn SceneAccess) -> Result<(), GizmoError> {
        let drag = self.drag.take().ok_or(GizmoError::NotDragging)?;
        drag.restore_starts(scene);
        tracing::debug!("Cancelled {} drag", drag.mode.label());
        Ok(())
    }
}

impl DragState {
    fn axis_dir(&self, axis: GizmoAxis) -> Vec3 {
        self.orientation * axis.direction()
    }

    /// Write every snapshot back untouched
    fn restore_starts(&self, scene: &mut dyn SceneAccess) {
        for (&id, &xform) in &self.start_transforms {
            scene.set_transform(id, xform);
        }
    }

    fn update_translate(
        &mut self,
        pointer: Vec2,
        geometry: &ViewGeometry,
        snap_settings: &SnapSettings,
        scene: &mut dyn SceneAccess,
    ) {
        let delta = pointer - self.start_pointer;
        let offset = match self.handle {
            GizmoHandle::Axis(axis) => {
                let dir = self.axis_dir(axis);
                let Some(s) = screen_axis(geometry, self.pivot, dir) else {
                    return;
                };
                dir * (delta.dot(s) / s.length_squared())
            }
            GizmoHandle::Plane(normal) => {
                let normal = self.axis_dir(normal);
                let (o0, d0) = geometry.screen_to_ray(self.start_pointer);
                let (o1, d1) = geometry.screen_to_ray(pointer);
                let (Some(p0), Some(p1)) = (
                    ray_plane_intersection(o0, d0, self.pivot, normal),
                    ray_plane_intersection(o1, d1, self.pivot, normal),
                ) else {
                    return;
                };
                p1 - p0
            }
            GizmoHandle::Center => {
                let Some(world_per_pixel) = geometry.world_per_pixel(self.pivot) else {
                    return;
                };
                (geometry.right() * delta.x - geometry.up() * delta.y) * world_per_pixel
            }
        };

        let offset = if snap_settings.enabled {
            let local = self.orientation.inverse() * offset;
            let step = snap_settings.move_step;
            self.orientation * Vec3::new(snap(local.x, step), snap(local.y, step), snap(local.z, step))
        } else {
            offset
        };
        if offset == Vec3::ZERO {
            self.restore_starts(scene);
            self.live_pivot = self.pivot;
            return;
        }

        for (&id, start) in &self.start_transforms {
            scene.set_transform(
                id,
                Xform {
                    position: start.position + offset,
                    ..*start
                },
            );
        }
        self.live_pivot = self.pivot + offset;
    }

    fn update_rotate(
        &mut self,
        pointer: Vec2,
        geometry: &ViewGeometry,
        snap_settings: &SnapSettings,
        scene: &mut dyn SceneAccess,
    ) {
        let Some(center) = geometry.world_to_screen(self.pivot) else {
            return;
        };
        let (axis_world, local_axis) = match self.handle {
            GizmoHandle::Axis(axis) | GizmoHandle::Plane(axis) => {
                (self.axis_dir(axis), Some(axis.direction()))
            }
            GizmoHandle::Center => (geometry.forward(), None),
        };

        // Seed from the press position, then unwrap incrementally
        if self.last_angle.is_none() {
            let start = self.start_pointer - center;
            if start.length_squared() >= 1.0 {
                self.last_angle = Some(start.y.atan2(start.x));
            }
        }
        let v = pointer - center;
        if v.length_squared() < 1.0 {
            return;
        }
        let angle = v.y.atan2(v.x);
        if let Some(last) = self.last_angle {
            self.accumulated_angle += wrap_angle(angle - last);
        }
        self.last_angle = Some(angle);

        // Screen y points down, so a counter-clockwise sweep lowers the angle
        let facing_viewer = axis_world.dot(geometry.to_viewer(self.pivot)) > 0.0;
        let mut radians = if facing_viewer {
            -self.accumulated_angle
        } else {
            self.accumulated_angle
        };
        if snap_settings.enabled {
            radians = snap(radians, snap_settings.angle_step_deg.to_radians());
        }
        if radians == 0.0 {
            self.restore_starts(scene);
            return;
        }

        let world_delta = Quat::from_axis_angle(axis_world, radians);
        for (&id, start) in &self.start_transforms {
            let xform = match self.space {
                GizmoSpace::World => Xform {
                    position: self.pivot + world_delta * (start.position - self.pivot),
                    rotation: (world_delta * start.rotation).normalize(),
                    scale: start.scale,
                },
                GizmoSpace::Local => {
                    let axis = local_axis
                        .unwrap_or_else(|| (start.rotation.inverse() * axis_world).normalize_or(Vec3::Z));
                    Xform {
                        rotation: (start.rotation * Quat::from_axis_angle(axis, radians)).normalize(),
                        ..*start
                    }
                }
            };
            scene.set_transform(id, xform);
        }
    }

    fn update_scale(
        &mut self,
        pointer: Vec2,
        geometry: &ViewGeometry,
        snap_settings: &SnapSettings,
        scene: &mut dyn SceneAccess,
    ) {
        let delta = pointer - self.start_pointer;
        let screen_dir = |axis: GizmoAxis| {
            screen_axis(geometry, self.pivot, self.axis_dir(axis)).map(|s| s.normalize())
        };
        let (direction, mask) = match self.handle {
            GizmoHandle::Axis(axis) => (screen_dir(axis), axis.direction()),
            GizmoHandle::Plane(normal) => {
                let (u, v) = normal.plane_axes();
                let direction = match (screen_dir(u), screen_dir(v)) {
                    (Some(a), Some(b)) => (a + b).try_normalize().or(Some(a)),
                    (a, b) => a.or(b),
                };
                (direction, u.direction() + v.direction())
            }
            // Up and to the right grows
            GizmoHandle::Center => (Some(Vec2::new(1.0, -1.0).normalize()), Vec3::ONE),
        };
        let Some(direction) = direction else {
            return;
        };

        let mut multiplier = 1.0 + delta.dot(direction) / SCALE_PIXELS_PER_UNIT;
        if snap_settings.enabled {
            multiplier = snap(multiplier, snap_settings.scale_step);
        }
        let multiplier = multiplier.max(SCALE_EPSILON);
        let factor = Vec3::select(mask.cmpgt(Vec3::ZERO), Vec3::splat(multiplier), Vec3::ONE);
        if factor == Vec3::ONE {
            self.restore_starts(scene);
            return;
        }

        for (&id, start) in &self.start_transforms {
            let position = match self.space {
                GizmoSpace::World => self.pivot + (start.position - self.pivot) * factor,
                GizmoSpace::Local => start.position,
            };
            scene.set_transform(
                id,
                Xform {
                    position,
                    rotation: start.rotation,
                    scale: clamp_scale(start.scale * factor),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{EulerRot, Mat4};
    use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};
    use vi_core::{Scene, TransactionLog};

    // Top-down orthographic view, 10 pixels per world unit, origin at (50, 50)
    fn top_down() -> ViewGeometry {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, 0.1, 100.0);
        ViewGeometry::new(view, proj, Vec2::new(100.0, 100.0))
    }

    fn scene_with(positions: &[Vec3]) -> (Scene, SelectionSet) {
        let mut scene = Scene::new();
        let mut selection = SelectionSet::new();
        let ids: Vec<_> = positions
            .iter()
            .map(|&p| scene.spawn("e", Xform::from_position(p)).unwrap())
            .collect();
        selection.add_many(ids);
        (scene, selection)
    }

    fn scene_with_xforms(xforms: &[Xform]) -> (Scene, SelectionSet) {
        let mut scene = Scene::new();
        let mut selection = SelectionSet::new();
        let ids: Vec<_> = xforms
            .iter()
            .map(|&xform| scene.spawn("e", xform).unwrap())
            .collect();
        selection.add_many(ids);
        (scene, selection)
    }

    fn single_rotated(position: Vec3, rotation: Quat) -> (Scene, SelectionSet, EntityId) {
        let (scene, selection) = scene_with_xforms(&[Xform {
            position,
            rotation,
            scale: Vec3::ONE,
        }]);
        let id = selection.iter().next().unwrap();
        (scene, selection, id)
    }

    /// Sweep a quarter turn counter-clockwise on screen around `center`,
    /// continuing a drag pressed 100 px to its right
    fn quarter_turn(
        gizmo: &mut GizmoManipulator,
        center: Vec2,
        geometry: &ViewGeometry,
        scene: &mut Scene,
    ) {
        gizmo
            .update_drag(center + Vec2::new(71.0, -70.0), geometry, scene)
            .unwrap();
        gizmo
            .update_drag(center + Vec2::new(0.0, -100.0), geometry, scene)
            .unwrap();
    }

    #[test]
    fn test_stationary_drag_records_nothing_in_every_mode() {
        let xforms = [
            Xform {
                position: Vec3::new(1.3, -0.7, 0.4),
                rotation: Quat::from_euler(EulerRot::XYZ, 0.3, -1.1, 2.0),
                scale: Vec3::new(1.2, 0.8, 1.5),
            },
            Xform {
                position: Vec3::new(-2.1, 0.9, -0.3),
                rotation: Quat::from_euler(EulerRot::ZYX, 2.7, 0.4, -0.9),
                scale: Vec3::new(0.6, 2.3, 1.0),
            },
            Xform {
                position: Vec3::new(0.2, 1.7, 0.8),
                rotation: Quat::from_axis_angle(Vec3::new(1.0, 2.0, -0.5).normalize(), 1.9),
                scale: Vec3::splat(0.9),
            },
        ];
        let geometry = top_down();
        let handles = [
            GizmoHandle::Axis(GizmoAxis::X),
            GizmoHandle::Plane(GizmoAxis::Z),
            GizmoHandle::Center,
        ];

        for mode in [GizmoMode::Translate, GizmoMode::Rotate, GizmoMode::Scale] {
            for space in [GizmoSpace::World, GizmoSpace::Local] {
                for handle in handles {
                    let (mut scene, selection) = scene_with_xforms(&xforms);
                    let mut gizmo = GizmoManipulator::default();
                    gizmo.set_mode(mode).unwrap();
                    gizmo.set_space(space).unwrap();

                    let press = Vec2::new(63.0, 41.0);
                    gizmo.begin_drag(handle, press, &selection, &scene).unwrap();
                    gizmo.update_drag(press, &geometry, &mut scene).unwrap();
                    gizmo.update_drag(press, &geometry, &mut scene).unwrap();
                    let transaction = gizmo.end_drag(&scene).unwrap();
                    assert!(
                        transaction.is_none(),
                        "{mode:?} {space:?} {handle:?} recorded {transaction:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_translate_back_to_press_records_nothing() {
        let (mut scene, selection) = scene_with_xforms(&[Xform {
            position: Vec3::new(0.7, -0.3, 0.1),
            rotation: Quat::from_euler(EulerRot::XYZ, 0.5, 0.2, -1.4),
            scale: Vec3::new(1.1, 0.9, 1.3),
        }]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();
        let press = Vec2::new(70.0, 50.0);
        gizmo
            .begin_drag(GizmoHandle::Axis(GizmoAxis::X), press, &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(91.0, 50.0), &geometry, &mut scene).unwrap();
        gizmo.update_drag(press, &geometry, &mut scene).unwrap();
        assert_eq!(gizmo.end_drag(&scene), Ok(None));
    }

    #[test]
    fn test_drag_without_motion_records_nothing() {
        let (mut scene, selection) = scene_with(&[Vec3::ZERO]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();
        let mut log = TransactionLog::new();

        let press = Vec2::new(70.0, 50.0);
        gizmo
            .begin_drag(GizmoHandle::Axis(GizmoAxis::X), press, &selection, &scene)
            .unwrap();
        gizmo.update_drag(press, &geometry, &mut scene).unwrap();
        let transaction = gizmo.end_drag(&scene).unwrap();

        assert!(transaction.is_none());
        assert!(!log.can_undo());
        if let Some(tx) = transaction {
            log.commit(tx).unwrap();
        }
        assert!(log.is_empty());
    }

    #[test]
    fn test_translate_moves_every_entity_by_same_offset() {
        let starts = [
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, -2.0, 0.5),
        ];
        let (mut scene, selection) = scene_with(&starts);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();

        gizmo
            .begin_drag(GizmoHandle::Axis(GizmoAxis::X), Vec2::new(60.0, 50.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(70.0, 58.0), &geometry, &mut scene).unwrap();
        // Each update restarts from the snapshots
        gizmo.update_drag(Vec2::new(80.0, 45.0), &geometry, &mut scene).unwrap();

        for (id, start) in selection.iter().zip(starts) {
            let position = scene.transform(id).unwrap().position;
            assert_relative_eq!(position.x, start.x + 2.0, epsilon = 1e-4);
            assert_relative_eq!(position.y, start.y, epsilon = 1e-4);
            assert_relative_eq!(position.z, start.z, epsilon = 1e-4);
        }

        let transaction = gizmo.end_drag(&scene).unwrap().unwrap();
        assert_eq!(transaction.label, "Translate");
        assert_eq!(transaction.len(), 3);
    }

    #[test]
    fn test_translate_snaps_offset() {
        let (mut scene, selection) = scene_with(&[Vec3::new(0.1, 0.0, 0.0)]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::new(SnapSettings {
            enabled: true,
            move_step: 0.5,
            ..SnapSettings::default()
        });

        gizmo
            .begin_drag(GizmoHandle::Center, Vec2::new(51.0, 50.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(58.0, 38.0), &geometry, &mut scene).unwrap();

        let id = selection.iter().next().unwrap();
        let position = scene.transform(id).unwrap().position;
        assert_relative_eq!(position.x, 0.1 + 0.5, epsilon = 1e-4);
        assert_relative_eq!(position.y, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rotate_quarter_turn_snaps_exactly() {
        let (mut scene, selection) = scene_with(&[Vec3::ZERO]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::new(SnapSettings {
            enabled: true,
            ..SnapSettings::default()
        });
        gizmo.set_mode(GizmoMode::Rotate).unwrap();

        gizmo
            .begin_drag(GizmoHandle::Axis(GizmoAxis::Z), Vec2::new(150.0, 50.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(121.0, -20.0), &geometry, &mut scene).unwrap();
        gizmo.update_drag(Vec2::new(50.0, -50.0), &geometry, &mut scene).unwrap();

        let id = selection.iter().next().unwrap();
        let (axis, angle) = scene.transform(id).unwrap().rotation.to_axis_angle();
        assert_relative_eq!(angle, std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(axis.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rotate_unwraps_multiple_turns() {
        let (mut scene, selection) = scene_with(&[Vec3::ZERO]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();
        gizmo.set_mode(GizmoMode::Rotate).unwrap();
        gizmo
            .begin_drag(GizmoHandle::Axis(GizmoAxis::Z), Vec2::new(80.0, 50.0), &selection, &scene)
            .unwrap();

        // Sweep past the -PI/PI seam
        for step in 1..=12 {
            let angle = -(step as f32) * std::f32::consts::FRAC_PI_4;
            let pointer = Vec2::new(50.0, 50.0) + Vec2::new(angle.cos(), angle.sin()) * 30.0;
            gizmo.update_drag(pointer, &geometry, &mut scene).unwrap();
        }
        let drag = gizmo.drag.as_ref().unwrap();
        assert_relative_eq!(drag.accumulated_angle, -3.0 * PI, epsilon = 1e-4);
    }

    #[test]
    fn test_scale_never_collapses() {
        let (mut scene, selection) = scene_with(&[Vec3::ZERO]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();
        gizmo.set_mode(GizmoMode::Scale).unwrap();

        gizmo
            .begin_drag(GizmoHandle::Center, Vec2::new(50.0, 50.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(-400.0, 500.0), &geometry, &mut scene).unwrap();

        let id = selection.iter().next().unwrap();
        let scale = scene.transform(id).unwrap().scale;
        assert!(scale.min_element() >= SCALE_EPSILON);
    }

    #[test]
    fn test_scale_axis_handle_only_changes_that_axis() {
        let (mut scene, selection) = scene_with(&[Vec3::ZERO]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();
        gizmo.set_mode(GizmoMode::Scale).unwrap();

        gizmo
            .begin_drag(GizmoHandle::Axis(GizmoAxis::X), Vec2::new(60.0, 50.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(110.0, 50.0), &geometry, &mut scene).unwrap();

        let id = selection.iter().next().unwrap();
        let scale = scene.transform(id).unwrap().scale;
        assert_relative_eq!(scale.x, 1.5, epsilon = 1e-4);
        assert_relative_eq!(scale.y, 1.0);
        assert_relative_eq!(scale.z, 1.0);
    }

    #[test]
    fn test_mode_change_rejected_while_dragging() {
        let (scene, selection) = scene_with(&[Vec3::ZERO]);
        let mut gizmo = GizmoManipulator::default();
        gizmo
            .begin_drag(GizmoHandle::Center, Vec2::ZERO, &selection, &scene)
            .unwrap();

        assert_eq!(gizmo.set_mode(GizmoMode::Rotate), Err(GizmoError::DragInProgress));
        assert_eq!(gizmo.set_space(GizmoSpace::Local), Err(GizmoError::DragInProgress));
        assert_eq!(gizmo.mode(), GizmoMode::Translate);
        assert_eq!(
            gizmo.begin_drag(GizmoHandle::Center, Vec2::ZERO, &selection, &scene),
            Err(GizmoError::DragInProgress)
        );
    }

    #[test]
    fn test_cancel_restores_snapshots() {
        let (mut scene, selection) = scene_with(&[Vec3::new(1.0, 2.0, 3.0)]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();
        gizmo
            .begin_drag(GizmoHandle::Axis(GizmoAxis::Y), Vec2::new(50.0, 40.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(50.0, 10.0), &geometry, &mut scene).unwrap();
        gizmo.cancel_drag(&mut scene).unwrap();

        let id = selection.iter().next().unwrap();
        assert_eq!(scene.transform(id).unwrap().position, Vec3::new(1.0, 2.0, 3.0));
        assert!(!gizmo.is_dragging());
        assert_eq!(gizmo.end_drag(&scene), Err(GizmoError::NotDragging));
    }

    #[test]
    fn test_pivot_mode_repositions_immediately() {
        let (scene, mut selection) = scene_with(&[Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)]);
        let last = selection.iter().last().unwrap();
        selection.toggle(last);
        selection.toggle(last);
        let mut gizmo = GizmoManipulator::default();
        gizmo.refresh_pivot(&selection, &scene);
        assert_eq!(gizmo.pivot(), Some(Vec3::new(2.0, 0.0, 0.0)));

        gizmo.set_pivot_mode(PivotMode::Active, &selection, &scene);
        assert_eq!(gizmo.pivot(), Some(Vec3::new(4.0, 0.0, 0.0)));
    }

    #[test]
    fn test_begin_requires_selection() {
        let scene = Scene::new();
        let mut gizmo = GizmoManipulator::default();
        assert_eq!(
            gizmo.begin_drag(GizmoHandle::Center, Vec2::ZERO, &SelectionSet::new(), &scene),
            Err(GizmoError::EmptySelection)
        );
    }

    #[test]
    fn test_world_rotate_orbits_positions_around_pivot() {
        let (mut scene, selection) =
            scene_with(&[Vec3::new(1.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::new(SnapSettings {
            enabled: true,
            ..SnapSettings::default()
        });
        gizmo.set_mode(GizmoMode::Rotate).unwrap();

        // Pivot (2, 0, 0) projects to (70, 50)
        let center = Vec2::new(70.0, 50.0);
        gizmo
            .begin_drag(
                GizmoHandle::Axis(GizmoAxis::Z),
                center + Vec2::new(100.0, 0.0),
                &selection,
                &scene,
            )
            .unwrap();
        quarter_turn(&mut gizmo, center, &geometry, &mut scene);

        let positions: Vec<_> = selection
            .iter()
            .map(|id| scene.transform(id).unwrap().position)
            .collect();
        assert!(positions[0].abs_diff_eq(Vec3::new(2.0, -1.0, 0.0), 1e-4));
        assert!(positions[1].abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-4));
    }

    #[test]
    fn test_local_rotate_post_multiplies_start_rotation() {
        let start = Quat::from_rotation_x(0.3);
        let (mut scene, selection, id) = single_rotated(Vec3::ZERO, start);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::new(SnapSettings {
            enabled: true,
            ..SnapSettings::default()
        });
        gizmo.set_mode(GizmoMode::Rotate).unwrap();
        gizmo.set_space(GizmoSpace::Local).unwrap();

        let center = Vec2::new(50.0, 50.0);
        gizmo
            .begin_drag(
                GizmoHandle::Axis(GizmoAxis::Z),
                center + Vec2::new(100.0, 0.0),
                &selection,
                &scene,
            )
            .unwrap();
        quarter_turn(&mut gizmo, center, &geometry, &mut scene);

        let xform = scene.transform(id).unwrap();
        let expected = start * Quat::from_rotation_z(FRAC_PI_2);
        assert!(xform.rotation.abs_diff_eq(expected, 1e-5));
        assert_eq!(xform.position, Vec3::ZERO);
    }

    #[test]
    fn test_rotate_sign_follows_axis_facing() {
        // Local Z points away from the camera after a half turn about X
        let start = Quat::from_rotation_x(PI);
        let (mut scene, selection, id) = single_rotated(Vec3::ZERO, start);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::new(SnapSettings {
            enabled: true,
            ..SnapSettings::default()
        });
        gizmo.set_mode(GizmoMode::Rotate).unwrap();
        gizmo.set_space(GizmoSpace::Local).unwrap();

        let center = Vec2::new(50.0, 50.0);
        gizmo
            .begin_drag(
                GizmoHandle::Axis(GizmoAxis::Z),
                center + Vec2::new(100.0, 0.0),
                &selection,
                &scene,
            )
            .unwrap();
        quarter_turn(&mut gizmo, center, &geometry, &mut scene);

        // Same on-screen sweep as a viewer-facing axis: +90 degrees about world Z
        let world_delta = scene.transform(id).unwrap().rotation * start.inverse();
        let expected = Quat::from_rotation_z(FRAC_PI_2);
        assert!(world_delta.dot(expected).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn test_local_translate_follows_entity_axes() {
        let (mut scene, selection, id) =
            single_rotated(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_z(FRAC_PI_2));
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();
        gizmo.set_space(GizmoSpace::Local).unwrap();

        // Local X is world Y, which points up the screen
        gizmo
            .begin_drag(GizmoHandle::Axis(GizmoAxis::X), Vec2::new(60.0, 40.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(60.0, 20.0), &geometry, &mut scene).unwrap();

        let position = scene.transform(id).unwrap().position;
        assert!(position.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-4));
    }

    #[test]
    fn test_local_scale_keeps_position() {
        let start = Vec3::new(1.0, 0.0, 0.0);
        let (mut scene, selection, id) = single_rotated(start, Quat::from_rotation_z(FRAC_PI_2));
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();
        gizmo.set_mode(GizmoMode::Scale).unwrap();
        gizmo.set_space(GizmoSpace::Local).unwrap();

        gizmo
            .begin_drag(GizmoHandle::Axis(GizmoAxis::X), Vec2::new(60.0, 40.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(60.0, -10.0), &geometry, &mut scene).unwrap();

        let xform = scene.transform(id).unwrap();
        assert_relative_eq!(xform.scale.x, 1.5, epsilon = 1e-4);
        assert_relative_eq!(xform.scale.y, 1.0);
        assert_eq!(xform.position, start);
    }

    #[test]
    fn test_plane_translate_follows_pointer_on_plane() {
        let (mut scene, selection) = scene_with(&[Vec3::ZERO]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();

        gizmo
            .begin_drag(GizmoHandle::Plane(GizmoAxis::Z), Vec2::new(60.0, 50.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(70.0, 30.0), &geometry, &mut scene).unwrap();

        let id = selection.iter().next().unwrap();
        let position = scene.transform(id).unwrap().position;
        assert!(position.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-4));
        assert!(gizmo.pivot().unwrap().abs_diff_eq(position, 1e-4));
    }

    #[test]
    fn test_plane_scale_changes_both_plane_axes() {
        let (mut scene, selection) = scene_with(&[Vec3::ZERO]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::default();
        gizmo.set_mode(GizmoMode::Scale).unwrap();

        gizmo
            .begin_drag(GizmoHandle::Plane(GizmoAxis::Z), Vec2::new(60.0, 40.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(110.0, 40.0), &geometry, &mut scene).unwrap();

        let id = selection.iter().next().unwrap();
        let scale = scene.transform(id).unwrap().scale;
        let expected = 1.0 + 50.0 * FRAC_1_SQRT_2 / 100.0;
        assert_relative_eq!(scale.x, expected, epsilon = 1e-4);
        assert_relative_eq!(scale.y, expected, epsilon = 1e-4);
        assert_relative_eq!(scale.z, 1.0);
    }

    #[test]
    fn test_scale_snaps_multiplier() {
        let (mut scene, selection) = scene_with(&[Vec3::ZERO]);
        let geometry = top_down();
        let mut gizmo = GizmoManipulator::new(SnapSettings {
            enabled: true,
            scale_step: 0.25,
            ..SnapSettings::default()
        });
        gizmo.set_mode(GizmoMode::Scale).unwrap();

        gizmo
            .begin_drag(GizmoHandle::Axis(GizmoAxis::X), Vec2::new(60.0, 50.0), &selection, &scene)
            .unwrap();
        gizmo.update_drag(Vec2::new(97.0, 50.0), &geometry, &mut scene).unwrap();

        let id = selection.iter().next().unwrap();
        assert_relative_eq!(scene.transform(id).unwrap().scale.x, 1.25, epsilon = 1e-5);
    }
}
