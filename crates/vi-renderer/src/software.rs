//! CPU reference backend
//!
//! Rasterizes each entity's projected world bounds as a flat rectangle
//! and the gizmo handles as an overlay. Good enough for picking, marquee
//! selection and headless tests without a GPU.

use std::collections::BTreeSet;

use glam::{Mat4, Quat, Vec2, Vec3};
use vi_core::{EntityId, SceneAccess};

use crate::backend::{ColorTexture, RenderBackend};
use crate::camera::ViewGeometry;
use crate::config::{GizmoConfig, RendererConfig};
use crate::constants::gizmo::CENTER_RADIUS_FACTOR;
use crate::gizmo::{GizmoAxis, GizmoHandle, GizmoMode, HandleShape, handle_primitives};
use crate::picking::{IdBuffer, PickId};

#[derive(Debug, Clone, Copy)]
struct GizmoOverlay {
    visible: bool,
    position: Vec3,
    mode: GizmoMode,
    orientation: Quat,
}

impl Default for GizmoOverlay {
    fn default() -> Self {
        Self {
            visible: false,
            position: Vec3::ZERO,
            mode: GizmoMode::Translate,
            orientation: Quat::IDENTITY,
        }
    }
}

/// Screen-space rectangle of pixel indices, inclusive
#[derive(Debug, Clone, Copy)]
struct PixelRect {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl PixelRect {
    fn covering(min: Vec2, max: Vec2, width: u32, height: u32) -> Option<Self> {
        let rect = Self {
            x0: (min.x.floor() as i32).max(0),
            y0: (min.y.floor() as i32).max(0),
            x1: (max.x.ceil() as i32 - 1).min(width as i32 - 1),
            y1: (max.y.ceil() as i32 - 1).min(height as i32 - 1),
        };
        (rect.x0 <= rect.x1 && rect.y0 <= rect.y1).then_some(rect)
    }

    fn pixels(self) -> impl Iterator<Item = (i32, i32)> {
        (self.y0..=self.y1).flat_map(move |y| (self.x0..=self.x1).map(move |x| (x, y)))
    }
}

fn pixel_center(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

fn to_rgba8(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Stable flat color for an entity
fn entity_color(id: EntityId) -> [u8; 4] {
    let h = id.raw().wrapping_mul(2_654_435_761);
    [
        0x40 | (h >> 24) as u8,
        0x40 | (h >> 16) as u8,
        0x40 | (h >> 8) as u8,
        0xFF,
    ]
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Inside test for a convex polygon in either winding
fn inside_convex(p: Vec2, corners: &[Vec2; 4]) -> bool {
    let mut sign = 0.0_f32;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let cross = (b - a).perp_dot(p - a);
        if cross.abs() <= f32::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// CPU rasterizer implementing [`RenderBackend`]
#[derive(Debug)]
pub struct SoftwareRenderer {
    ids: IdBuffer,
    color: Vec<u8>,
    background: [u8; 4],
    gizmo_config: GizmoConfig,
    gizmo: GizmoOverlay,
    geometry: Option<ViewGeometry>,
}

impl SoftwareRenderer {
    /// Create a renderer with targets of the given size
    pub fn new(width: u32, height: u32, config: &RendererConfig) -> Self {
        let mut renderer = Self {
            ids: IdBuffer::default(),
            color: Vec::new(),
            background: to_rgba8(config.viewport.background_color),
            gizmo_config: config.gizmo.clone(),
            gizmo: GizmoOverlay::default(),
            geometry: None,
        };
        renderer.resize(width, height);
        renderer
    }

    /// Whether a frame has been rendered since the last resize
    pub fn has_frame(&self) -> bool {
        self.geometry.is_some()
    }

    fn put_color(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        let i = (y as usize * self.ids.width() as usize + x as usize) * 4;
        if let Some(slot) = self.color.get_mut(i..i + 4) {
            slot.copy_from_slice(&rgba);
        }
    }

    fn draw_entity(&mut self, geometry: &ViewGeometry, id: EntityId, scene: &dyn SceneAccess) {
        let Some(bounds) = scene.world_bounds(id) else {
            return;
        };
        if bounds.is_empty() {
            return;
        }

        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        let mut depth = f32::INFINITY;
        for corner in bounds.corners() {
            let clip = geometry.view_proj * corner.extend(1.0);
            if clip.w <= 1e-6 {
                // Straddles the camera plane
                return;
            }
            let ndc = clip.truncate() / clip.w;
            let pixel = Vec2::new(
                (ndc.x + 1.0) * 0.5 * geometry.viewport.x,
                (1.0 - ndc.y) * 0.5 * geometry.viewport.y,
            );
            min = min.min(pixel);
            max = max.max(pixel);
            depth = depth.min(ndc.z);
        }
        if !(0.0..1.0).contains(&depth) {
            return;
        }

        let Some(rect) = PixelRect::covering(min, max, self.ids.width(), self.ids.height()) else {
            return;
        };
        let rgba = entity_color(id);
        for (x, y) in rect.pixels() {
            if self.ids.write(x, y, id.raw(), depth) {
                self.put_color(x, y, rgba);
            }
        }
    }

    fn handle_color(&self, handle: GizmoHandle) -> [u8; 4] {
        let config = &self.gizmo_config;
        to_rgba8(match handle.axis() {
            Some(GizmoAxis::X) => config.x_axis_color,
            Some(GizmoAxis::Y) => config.y_axis_color,
            Some(GizmoAxis::Z) => config.z_axis_color,
            None => config.center_color,
        })
    }

    fn fill_where(
        &mut self,
        rect: PixelRect,
        handle: GizmoHandle,
        covered: impl Fn(Vec2) -> bool,
    ) {
        let id = handle.pick_id().0;
        let rgba = self.handle_color(handle);
        for (x, y) in rect.pixels() {
            if covered(pixel_center(x, y)) && self.ids.write_overlay(x, y, id) {
                self.put_color(x, y, rgba);
            }
        }
    }

    fn draw_gizmo(&mut self, geometry: &ViewGeometry) {
        let overlay = self.gizmo;
        let Some(world_per_pixel) = geometry.world_per_pixel(overlay.position) else {
            return;
        };
        let length = world_per_pixel * self.gizmo_config.size_px;
        let thickness = self.gizmo_config.thickness_px.max(0.5);
        let (width, height) = (self.ids.width(), self.ids.height());

        for primitive in handle_primitives(overlay.mode, overlay.position, overlay.orientation, length) {
            match primitive.shape {
                HandleShape::Segment { a, b } => {
                    let (Some(a), Some(b)) = (geometry.world_to_screen(a), geometry.world_to_screen(b))
                    else {
                        continue;
                    };
                    let pad = Vec2::splat(thickness);
                    if let Some(rect) = PixelRect::covering(a.min(b) - pad, a.max(b) + pad, width, height) {
                        self.fill_where(rect, primitive.handle, |p| {
                            distance_to_segment(p, a, b) <= thickness
                        });
                    }
                }
                HandleShape::Quad(corners) => {
                    let projected = corners.map(|c| geometry.world_to_screen(c));
                    let [Some(c0), Some(c1), Some(c2), Some(c3)] = projected else {
                        continue;
                    };
                    let quad = [c0, c1, c2, c3];
                    let min = quad.iter().copied().fold(Vec2::splat(f32::INFINITY), Vec2::min);
                    let max = quad.iter().copied().fold(Vec2::splat(f32::NEG_INFINITY), Vec2::max);
                    if let Some(rect) = PixelRect::covering(min, max, width, height) {
                        self.fill_where(rect, primitive.handle, |p| inside_convex(p, &quad));
                    }
                }
                HandleShape::Dot { center } => {
                    let Some(center) = geometry.world_to_screen(center) else {
                        continue;
                    };
                    let radius = thickness * CENTER_RADIUS_FACTOR;
                    let pad = Vec2::splat(radius);
                    if let Some(rect) = PixelRect::covering(center - pad, center + pad, width, height) {
                        self.fill_where(rect, primitive.handle, |p| p.distance(center) <= radius);
                    }
                }
            }
        }
    }
}

impl RenderBackend for SoftwareRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.ids.resize(width, height);
        self.color = self.background.repeat(width as usize * height as usize);
        self.geometry = None;
    }

    fn size(&self) -> (u32, u32) {
        (self.ids.width(), self.ids.height())
    }

    fn render_scene(&mut self, scene: &dyn SceneAccess, view: Mat4, proj: Mat4) {
        let (width, height) = self.size();
        let geometry = ViewGeometry::new(view, proj, Vec2::new(width as f32, height as f32));

        self.ids.clear();
        for pixel in self.color.chunks_exact_mut(4) {
            pixel.copy_from_slice(&self.background);
        }

        for id in scene.entity_ids() {
            self.draw_entity(&geometry, id, scene);
        }
        if self.gizmo.visible {
            self.draw_gizmo(&geometry);
        }

        self.geometry = Some(geometry);
    }

    fn color_texture(&self) -> Option<ColorTexture<'_>> {
        self.geometry.as_ref()?;
        Some(ColorTexture {
            width: self.ids.width(),
            height: self.ids.height(),
            rgba: &self.color,
        })
    }

    fn pick_id_at_fat(&self, x: i32, y: i32, radius: u32) -> PickId {
        if self.geometry.is_none() {
            return PickId::NONE;
        }
        self.ids.pick_fat(x, y, radius)
    }

    fn pick_ids_in_rect(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> BTreeSet<PickId> {
        if self.geometry.is_none() {
            return BTreeSet::new();
        }
        self.ids.ids_in_rect(x0, y0, x1, y1)
    }

    fn pick_world_position_at(&self, x: i32, y: i32) -> Option<Vec3> {
        let geometry = self.geometry.as_ref()?;
        let depth = self.ids.depth_at(x, y)?;
        (depth < 1.0).then(|| geometry.unproject(pixel_center(x, y), depth))
    }

    fn set_gizmo_visible(&mut self, visible: bool) {
        self.gizmo.visible = visible;
    }

    fn set_gizmo_position(&mut self, position: Vec3) {
        self.gizmo.position = position;
    }

    fn set_gizmo_mode(&mut self, mode: GizmoMode, orientation: Quat) {
        self.gizmo.mode = mode;
        self.gizmo.orientation = orientation;
    }
}
