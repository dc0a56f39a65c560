//! Rectangle selection and viewport overlay painting

use glam::Vec2;
use vi_renderer::PickId;

use super::FrameOutput;
use super::input::Modifiers;
use crate::state::SelectionSet;

/// Rubber-band selection started by a press on empty space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marquee {
    start: Vec2,
    current: Vec2,
    modifiers: Modifiers,
    dragging: bool,
}

impl Marquee {
    pub fn new(start: Vec2, modifiers: Modifiers) -> Self {
        Self {
            start,
            current: start,
            modifiers,
            dragging: false,
        }
    }

    /// Follow the pointer; becomes a drag once it travels past `threshold_px`
    pub fn update(&mut self, pointer: Vec2, threshold_px: f32) {
        self.current = pointer;
        if !self.dragging && self.start.distance(pointer) > threshold_px {
            self.dragging = true;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn current(&self) -> Vec2 {
        self.current
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Normalized `(min, max)` corners
    pub fn rect(&self) -> (Vec2, Vec2) {
        (self.start.min(self.current), self.start.max(self.current))
    }

    /// Apply the picked ids to the selection.
    ///
    /// Gizmo handle ids are ignored. Shift adds, ctrl toggles each id and a
    /// plain release replaces the selection.
    pub fn resolve(&self, ids: impl IntoIterator<Item = PickId>, selection: &mut SelectionSet) {
        let entities: Vec<_> = ids.into_iter().filter_map(PickId::entity).collect();
        tracing::debug!("Marquee resolved {} entities", entities.len());
        if self.modifiers.shift {
            selection.add_many(entities);
        } else if self.modifiers.ctrl {
            for id in entities {
                selection.toggle(id);
            }
        } else {
            selection.replace_many(entities);
        }
    }
}

/// Draw viewport overlays on top of the rendered image
pub fn paint_overlays(painter: &egui::Painter, image_rect: egui::Rect, output: &FrameOutput) {
    let Some((min, max)) = output.marquee else {
        return;
    };
    let rect = egui::Rect::from_min_max(
        image_rect.min + egui::vec2(min.x, min.y),
        image_rect.min + egui::vec2(max.x, max.y),
    )
    .intersect(image_rect);

    painter.rect_filled(rect, 0.0, egui::Color32::from_rgba_unmultiplied(80, 140, 255, 40));
    painter.rect_stroke(
        rect,
        0.0,
        egui::Stroke::new(1.0, egui::Color32::from_rgb(80, 140, 255)),
    );
}
