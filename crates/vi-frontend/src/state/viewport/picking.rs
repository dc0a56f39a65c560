//! Throttled picking queries against the render backend

use std::collections::BTreeSet;

use glam::{Vec2, Vec3};
use vi_renderer::{PickId, PickingConfig, RenderBackend};

/// Hover and click resolution with a minimum interval between point queries
#[derive(Debug, Clone)]
pub struct PickingService {
    config: PickingConfig,
    last_query_ms: Option<f64>,
    last_id: PickId,
}

impl Default for PickingService {
    fn default() -> Self {
        Self::new(PickingConfig::default())
    }
}

impl PickingService {
    pub fn new(config: PickingConfig) -> Self {
        Self {
            config: config.sanitized(),
            last_query_ms: None,
            last_id: PickId::NONE,
        }
    }

    pub fn config(&self) -> &PickingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PickingConfig) {
        self.config = config.sanitized();
    }

    /// Id returned by the most recent query
    pub fn last_id(&self) -> PickId {
        self.last_id
    }

    /// Forget the cached id so the next query always hits the backend
    pub fn invalidate(&mut self) {
        self.last_query_ms = None;
        self.last_id = PickId::NONE;
    }

    fn throttled(&self, now_ms: f64) -> bool {
        self.last_query_ms
            .is_some_and(|last| now_ms - last < self.config.min_interval_ms)
    }

    /// Id under `pointer` (image-relative pixels).
    ///
    /// Unforced queries within the minimum interval reuse the previous
    /// result. `None` for the pointer means it left the image; hover is
    /// cleared without touching the backend.
    pub fn query_point(
        &mut self,
        backend: &dyn RenderBackend,
        pointer: Option<Vec2>,
        now_ms: f64,
        forced: bool,
    ) -> PickId {
        let Some(pointer) = pointer else {
            self.last_id = PickId::NONE;
            return PickId::NONE;
        };
        if !forced && self.throttled(now_ms) {
            return self.last_id;
        }

        let id = backend.pick_id_at_fat(
            pointer.x.floor() as i32,
            pointer.y.floor() as i32,
            self.config.tolerance_px,
        );
        if id != self.last_id {
            tracing::trace!("Hover changed {:?} -> {:?}", self.last_id, id);
        }
        self.last_query_ms = Some(now_ms);
        self.last_id = id;
        id
    }

    /// Distinct ids inside the rectangle spanned by two image-relative corners
    pub fn query_rect(&self, backend: &dyn RenderBackend, a: Vec2, b: Vec2) -> BTreeSet<PickId> {
        backend.pick_ids_in_rect(
            a.x.floor() as i32,
            a.y.floor() as i32,
            b.x.floor() as i32,
            b.y.floor() as i32,
        )
    }

    /// World position of the surface under `pointer`
    pub fn unproject(&self, backend: &dyn RenderBackend, pointer: Vec2) -> Option<Vec3> {
        backend.pick_world_position_at(pointer.x.floor() as i32, pointer.y.floor() as i32)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use approx::assert_relative_eq;
    use glam::{Mat4, Quat};
    use vi_core::{Scene, SceneAccess, Xform};
    use vi_renderer::{ColorTexture, GizmoMode, RendererConfig, SoftwareRenderer};

    use super::*;

    /// Backend that counts point queries and answers with a fixed id
    struct CountingBackend {
        id: Cell<u32>,
        queries: Cell<u32>,
    }

    impl CountingBackend {
        fn new(id: u32) -> Self {
            Self {
                id: Cell::new(id),
                queries: Cell::new(0),
            }
        }
    }

    impl RenderBackend for CountingBackend {
        fn resize(&mut self, _width: u32, _height: u32) {}
        fn size(&self) -> (u32, u32) {
            (100, 100)
        }
        fn render_scene(&mut self, _scene: &dyn SceneAccess, _view: Mat4, _proj: Mat4) {}
        fn color_texture(&self) -> Option<ColorTexture<'_>> {
            None
        }
        fn pick_id_at_fat(&self, _x: i32, _y: i32, _radius: u32) -> PickId {
            self.queries.set(self.queries.get() + 1);
            PickId(self.id.get())
        }
        fn pick_ids_in_rect(&self, _x0: i32, _y0: i32, _x1: i32, _y1: i32) -> BTreeSet<PickId> {
            BTreeSet::new()
        }
        fn pick_world_position_at(&self, _x: i32, _y: i32) -> Option<Vec3> {
            None
        }
        fn set_gizmo_visible(&mut self, _visible: bool) {}
        fn set_gizmo_position(&mut self, _position: Vec3) {}
        fn set_gizmo_mode(&mut self, _mode: GizmoMode, _orientation: Quat) {}
    }

    #[test]
    fn test_unforced_queries_are_throttled() {
        let backend = CountingBackend::new(3);
        let mut picking = PickingService::default();
        let pointer = Some(Vec2::new(10.0, 10.0));

        assert_eq!(picking.query_point(&backend, pointer, 0.0, false), PickId(3));
        backend.id.set(4);
        assert_eq!(picking.query_point(&backend, pointer, 10.0, false), PickId(3));
        assert_eq!(backend.queries.get(), 1);
        assert_eq!(picking.query_point(&backend, pointer, 40.0, false), PickId(4));
        assert_eq!(backend.queries.get(), 2);
    }

    #[test]
    fn test_forced_query_bypasses_throttle() {
        let backend = CountingBackend::new(3);
        let mut picking = PickingService::default();
        let pointer = Some(Vec2::new(10.0, 10.0));
        picking.query_point(&backend, pointer, 0.0, false);
        backend.id.set(5);
        assert_eq!(picking.query_point(&backend, pointer, 1.0, true), PickId(5));
        assert_eq!(backend.queries.get(), 2);
    }

    #[test]
    fn test_pointer_outside_clears_hover() {
        let backend = CountingBackend::new(3);
        let mut picking = PickingService::default();
        picking.query_point(&backend, Some(Vec2::ZERO), 0.0, false);
        assert_eq!(picking.query_point(&backend, None, 1.0, false), PickId::NONE);
        assert_eq!(picking.last_id(), PickId::NONE);
        assert_eq!(backend.queries.get(), 1);
    }

    #[test]
    fn test_invalidate_forces_next_query() {
        let backend = CountingBackend::new(3);
        let mut picking = PickingService::default();
        picking.query_point(&backend, Some(Vec2::ZERO), 0.0, false);
        picking.invalidate();
        picking.query_point(&backend, Some(Vec2::ZERO), 1.0, false);
        assert_eq!(backend.queries.get(), 2);
    }

    #[test]
    fn test_unproject_reads_surface_under_pointer() {
        let mut scene = Scene::new();
        scene.spawn("box", Xform::IDENTITY).unwrap();
        let mut renderer = SoftwareRenderer::new(100, 100, &RendererConfig::default());
        let picking = PickingService::default();
        let pointer = Vec2::new(50.9, 50.2);
        assert!(picking.unproject(&renderer, pointer).is_none());

        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, 0.1, 100.0);
        renderer.render_scene(&scene, view, proj);

        // Fractional pointers resolve to the pixel they fall in
        let hit = picking.unproject(&renderer, pointer).unwrap();
        assert_relative_eq!(hit.x, 0.05, epsilon = 1e-3);
        assert_relative_eq!(hit.y, -0.05, epsilon = 1e-3);
        assert_relative_eq!(hit.z, 0.5, epsilon = 1e-3);
        assert!(picking.unproject(&renderer, Vec2::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_oversized_tolerance_is_capped() {
        let picking = PickingService::new(PickingConfig {
            tolerance_px: u32::MAX,
            ..PickingConfig::default()
        });
        assert_eq!(
            picking.config().tolerance_px,
            vi_renderer::constants::picking::MAX_TOLERANCE_PX
        );
    }
}
