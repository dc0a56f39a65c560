//! 3D Viewport panel
//!
//! [`ViewportPanel::frame`] runs the whole interaction loop once per UI
//! frame: camera input, rendering, hover picking, then dispatch of the
//! primary button to the gizmo, the selection or a marquee.

mod input;
mod marquee;

pub use input::{InputFrame, Modifiers, ViewportKey};
pub use marquee::{Marquee, paint_overlays};

use glam::{Mat4, Vec2};

use vi_core::SceneAccess;
use vi_renderer::{GizmoMode, PickId, RenderBackend, ViewGeometry};

use crate::state::{EditorContext, SharedEditorContext, SharedViewportState, ViewportState};

/// What the loop decided this frame, for painting and status display
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    /// Id under the pointer
    pub hover: PickId,
    /// Marquee `(min, max)` in image pixels while a marquee drag is active
    pub marquee: Option<(Vec2, Vec2)>,
    /// Whether a gizmo drag is in progress
    pub dragging: bool,
    /// Label of the transaction committed, undone or redone this frame
    pub committed: Option<String>,
    pub view: Mat4,
    pub proj: Mat4,
}

/// 3D viewport panel
#[derive(Debug, Default)]
pub struct ViewportPanel {
    marquee: Option<Marquee>,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The marquee being drawn, if any
    pub fn marquee(&self) -> Option<&Marquee> {
        self.marquee.as_ref()
    }

    /// Lock both shared states once and run [`frame`](Self::frame)
    pub fn frame_shared(
        &mut self,
        input: &InputFrame,
        context: &SharedEditorContext,
        viewport: &SharedViewportState,
        backend: &mut dyn RenderBackend,
    ) -> FrameOutput {
        let mut ctx = context.lock();
        let mut vp = viewport.lock();
        self.frame(input, &mut ctx, &mut vp, backend)
    }

    /// Run one frame of the interaction loop
    pub fn frame(
        &mut self,
        input: &InputFrame,
        ctx: &mut EditorContext,
        viewport: &mut ViewportState,
        backend: &mut dyn RenderBackend,
    ) -> FrameOutput {
        let mut output = FrameOutput::default();

        // Resize
        let size = input.image_size.max(Vec2::ONE);
        let target = (size.x as u32, size.y as u32);
        if backend.size() != target {
            tracing::debug!("Viewport resized to {}x{}", target.0, target.1);
            backend.resize(target.0, target.1);
            viewport.picking.invalidate();
        }

        // Camera and key commands
        viewport.camera.tick(input.dt);
        self.handle_camera_input(input, viewport);
        for &key in &input.keys {
            if let Some(label) = self.handle_key(key, ctx, viewport) {
                output.committed = Some(label);
            }
        }

        // Render
        viewport.gizmo.refresh_pivot(&ctx.selection, &ctx.scene);
        viewport.gizmo.sync_backend(backend);
        let (view, proj) = viewport.camera.view_projection(size.x / size.y);
        backend.render_scene(&ctx.scene, view, proj);
        let geometry = ViewGeometry::new(view, proj, size);
        output.view = view;
        output.proj = proj;

        // Hover
        let pointer = input.pointer_in_image();
        let pressed = input.primary_pressed && pointer.is_some();
        output.hover = viewport
            .picking
            .query_point(backend, pointer, input.time_ms, pressed);

        // Press
        if let Some(pointer) = pointer.filter(|_| pressed) {
            self.on_press(output.hover, pointer, input, ctx, viewport);
        }

        // Held
        if input.primary_down
            && !input.primary_pressed
            && let Some(pointer) = input.pointer
        {
            if viewport.gizmo.is_dragging() {
                if let Err(e) = viewport.gizmo.update_drag(pointer, &geometry, &mut ctx.scene) {
                    tracing::warn!("Gizmo update rejected: {e}");
                }
            } else if let Some(marquee) = self.marquee.as_mut() {
                marquee.update(pointer, viewport.picking.config().marquee_threshold_px);
            }
        }

        // Release
        if input.primary_released {
            if let Some(label) = self.on_release(ctx, viewport, backend) {
                output.committed = Some(label);
            }
        }

        output.dragging = viewport.gizmo.is_dragging();
        output.marquee = self
            .marquee
            .filter(Marquee::is_dragging)
            .map(|marquee| marquee.rect());
        output
    }

    fn handle_camera_input(&mut self, input: &InputFrame, viewport: &mut ViewportState) {
        let camera = &mut viewport.camera;
        if !viewport.gizmo.is_dragging() {
            if input.middle_down && input.modifiers.shift {
                camera.pan(input.pointer_delta.x, input.pointer_delta.y);
            } else if input.secondary_down || input.middle_down {
                camera.orbit_by_pixels(input.pointer_delta);
            }
        }
        if input.scroll != 0.0 {
            camera.zoom(input.scroll);
        }
        camera.apply_key_nudge(input.nudge, input.dt);
    }

    /// Returns the label of an undone or redone transaction
    fn handle_key(
        &mut self,
        key: ViewportKey,
        ctx: &mut EditorContext,
        viewport: &mut ViewportState,
    ) -> Option<String> {
        let gizmo = &mut viewport.gizmo;
        let result = match key {
            ViewportKey::TranslateMode => gizmo.set_mode(GizmoMode::Translate),
            ViewportKey::RotateMode => gizmo.set_mode(GizmoMode::Rotate),
            ViewportKey::ScaleMode => gizmo.set_mode(GizmoMode::Scale),
            ViewportKey::ToggleSpace => gizmo.set_space(gizmo.space().toggled()),
            ViewportKey::TogglePivot => {
                let pivot_mode = gizmo.pivot_mode().toggled();
                gizmo.set_pivot_mode(pivot_mode, &ctx.selection, &ctx.scene);
                tracing::info!("Pivot: {}", pivot_mode.label());
                Ok(())
            }
            ViewportKey::FrameSelection => {
                viewport.frame_selection(&ctx.selection, &ctx.scene);
                Ok(())
            }
            ViewportKey::TopView => {
                viewport.camera.set_top_view();
                Ok(())
            }
            ViewportKey::FrontView => {
                viewport.camera.set_front_view();
                Ok(())
            }
            ViewportKey::SideView => {
                viewport.camera.set_side_view();
                Ok(())
            }
            ViewportKey::Cancel => {
                if gizmo.is_dragging() {
                    gizmo.cancel_drag(&mut ctx.scene)
                } else {
                    self.marquee = None;
                    Ok(())
                }
            }
            ViewportKey::Undo | ViewportKey::Redo => {
                if gizmo.is_dragging() {
                    tracing::warn!("Undo/redo ignored during a gizmo drag");
                    return None;
                }
                let label = if key == ViewportKey::Undo {
                    ctx.undo()
                } else {
                    ctx.redo()
                };
                viewport.picking.invalidate();
                return label;
            }
        };
        if let Err(e) = result {
            tracing::warn!("Ignored {key:?}: {e}");
        }
        None
    }

    fn on_press(
        &mut self,
        hover: PickId,
        pointer: Vec2,
        input: &InputFrame,
        ctx: &mut EditorContext,
        viewport: &mut ViewportState,
    ) {
        self.marquee = None;

        if let Some(handle) = hover.handle() {
            if let Err(e) = viewport
                .gizmo
                .begin_drag(handle, pointer, &ctx.selection, &ctx.scene)
            {
                tracing::warn!("Gizmo drag rejected: {e}");
            }
            return;
        }

        let Some(id) = hover.entity() else {
            self.marquee = Some(Marquee::new(pointer, input.modifiers));
            return;
        };

        let selection = &mut ctx.selection;
        if input.modifiers.ctrl {
            selection.toggle(id);
        } else if input.modifiers.shift {
            match selection.anchor() {
                Some(anchor) => selection.range_select(anchor, id, &ctx.scene.entity_ids()),
                None => selection.add_many([id]),
            }
        } else {
            selection.set_single(id);
        }
        viewport.gizmo.refresh_pivot(&ctx.selection, &ctx.scene);
    }

    /// Returns the label of a committed transaction
    fn on_release(
        &mut self,
        ctx: &mut EditorContext,
        viewport: &mut ViewportState,
        backend: &dyn RenderBackend,
    ) -> Option<String> {
        if viewport.gizmo.is_dragging() {
            let transaction = match viewport.gizmo.end_drag(&ctx.scene) {
                Ok(transaction) => transaction?,
                Err(e) => {
                    tracing::warn!("Gizmo end rejected: {e}");
                    return None;
                }
            };
            let label = transaction.label.clone();
            viewport.picking.invalidate();
            return match ctx.history.commit(transaction) {
                Ok(true) => Some(label),
                Ok(false) => None,
                Err(e) => {
                    tracing::warn!("Failed to record '{label}': {e}");
                    None
                }
            };
        }

        let marquee = self.marquee.take()?;
        if marquee.is_dragging() {
            let ids = viewport
                .picking
                .query_rect(backend, marquee.start(), marquee.current());
            marquee.resolve(ids, &mut ctx.selection);
        } else if !marquee.modifiers().any() {
            ctx.selection.clear();
        }
        viewport.gizmo.refresh_pivot(&ctx.selection, &ctx.scene);
        None
    }
}
