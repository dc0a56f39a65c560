//! Renderer contract used by the interaction loop
//!
//! The frontend never talks to a concrete renderer. It submits the scene
//! with explicit camera matrices, reads back pick results, and tells the
//! backend where the gizmo overlay sits.

use std::collections::BTreeSet;

use glam::{Mat4, Quat, Vec3};
use vi_core::SceneAccess;

use crate::gizmo::GizmoMode;
use crate::picking::PickId;

/// Borrowed RGBA8 color target
#[derive(Debug, Clone, Copy)]
pub struct ColorTexture<'a> {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Tightly packed RGBA8 rows, top row first
    pub rgba: &'a [u8],
}

/// A renderer that can draw the scene and answer picking queries.
///
/// Pick queries read whatever the last [`render_scene`](Self::render_scene)
/// call produced. Before the first render every query reports nothing.
pub trait RenderBackend {
    /// Resize all render targets
    fn resize(&mut self, width: u32, height: u32);

    /// Current target size in pixels
    fn size(&self) -> (u32, u32);

    /// Draw the scene and the gizmo overlay with the given camera
    fn render_scene(&mut self, scene: &dyn SceneAccess, view: Mat4, proj: Mat4);

    /// Color output of the last render, if the backend keeps one on the CPU
    fn color_texture(&self) -> Option<ColorTexture<'_>>;

    /// Nearest non-zero id within `radius` pixels of `(x, y)`
    fn pick_id_at_fat(&self, x: i32, y: i32, radius: u32) -> PickId;

    /// Every distinct non-zero id inside the rectangle spanned by two corners
    fn pick_ids_in_rect(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> BTreeSet<PickId>;

    /// World position of the surface under a pixel
    fn pick_world_position_at(&self, x: i32, y: i32) -> Option<Vec3>;

    /// Show or hide the gizmo overlay
    fn set_gizmo_visible(&mut self, visible: bool);

    /// Move the gizmo overlay
    fn set_gizmo_position(&mut self, position: Vec3);

    /// Switch the gizmo overlay mode and orientation
    fn set_gizmo_mode(&mut self, mode: GizmoMode, orientation: Quat);
}
