//! Per-frame input snapshot
//!
//! The loop reads input exactly once per frame from an [`InputFrame`], so it
//! can be driven by egui or synthesized in tests.

use glam::Vec2;

/// Wheel delta in egui points that counts as one zoom step
const SCROLL_POINTS_PER_STEP: f32 = 50.0;

/// Modifier keys held this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl, or Cmd on macOS
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
    };

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt
    }
}

impl From<egui::Modifiers> for Modifiers {
    fn from(m: egui::Modifiers) -> Self {
        Self {
            shift: m.shift,
            ctrl: m.command || m.ctrl,
            alt: m.alt,
        }
    }
}

/// Viewport key commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportKey {
    /// T
    TranslateMode,
    /// R
    RotateMode,
    /// S
    ScaleMode,
    /// L: toggle world/local
    ToggleSpace,
    /// P: toggle center/active pivot
    TogglePivot,
    /// F: frame the selection
    FrameSelection,
    /// Escape: cancel drag or marquee
    Cancel,
    /// 7: look straight down
    TopView,
    /// 1: look along -X
    FrontView,
    /// 3: look along -Y
    SideView,
    Undo,
    Redo,
}

/// Everything the interaction loop reads in one frame
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    /// Frame timestamp in milliseconds
    pub time_ms: f64,
    /// Seconds since the previous frame
    pub dt: f32,
    /// Image size in pixels
    pub image_size: Vec2,
    /// Pointer relative to the image's top-left corner, possibly outside it
    pub pointer: Option<Vec2>,
    /// Pointer motion since the previous frame
    pub pointer_delta: Vec2,
    pub primary_pressed: bool,
    pub primary_down: bool,
    pub primary_released: bool,
    pub secondary_down: bool,
    pub middle_down: bool,
    /// Zoom steps, positive toward the scene
    pub scroll: f32,
    /// Arrow keys held: x = right - left, y = up - down
    pub nudge: Vec2,
    pub modifiers: Modifiers,
    pub keys: Vec<ViewportKey>,
}

impl InputFrame {
    /// Pointer position if it is over the image
    pub fn pointer_in_image(&self) -> Option<Vec2> {
        self.pointer.filter(|p| {
            p.x >= 0.0 && p.y >= 0.0 && p.x < self.image_size.x && p.y < self.image_size.y
        })
    }

    /// Build the snapshot from egui input and the viewport image response.
    ///
    /// Keys, scroll and arrow nudges are only read while the image is
    /// hovered so other panels keep their shortcuts.
    pub fn from_egui(input: &egui::InputState, response: &egui::Response) -> Self {
        use egui::{Key, PointerButton};

        let rect = response.rect;
        let pointer = input
            .pointer
            .latest_pos()
            .map(|p| Vec2::new(p.x - rect.min.x, p.y - rect.min.y));
        let delta = input.pointer.delta();
        let modifiers = Modifiers::from(input.modifiers);
        let hovered = response.hovered() || response.dragged();

        let mut keys = Vec::new();
        let mut nudge = Vec2::ZERO;
        let mut scroll = 0.0;
        if hovered {
            let bindings = [
                (Key::T, ViewportKey::TranslateMode),
                (Key::R, ViewportKey::RotateMode),
                (Key::S, ViewportKey::ScaleMode),
                (Key::L, ViewportKey::ToggleSpace),
                (Key::P, ViewportKey::TogglePivot),
                (Key::F, ViewportKey::FrameSelection),
                (Key::Escape, ViewportKey::Cancel),
                (Key::Num7, ViewportKey::TopView),
                (Key::Num1, ViewportKey::FrontView),
                (Key::Num3, ViewportKey::SideView),
            ];
            if input.modifiers.command && input.key_pressed(Key::Z) {
                keys.push(if input.modifiers.shift {
                    ViewportKey::Redo
                } else {
                    ViewportKey::Undo
                });
            } else if input.modifiers.command && input.key_pressed(Key::Y) {
                keys.push(ViewportKey::Redo);
            } else if !input.modifiers.command {
                keys.extend(
                    bindings
                        .into_iter()
                        .filter(|(key, _)| input.key_pressed(*key))
                        .map(|(_, command)| command),
                );
            }

            let held = |key: Key| if input.key_down(key) { 1.0 } else { 0.0 };
            nudge = Vec2::new(
                held(Key::ArrowRight) - held(Key::ArrowLeft),
                held(Key::ArrowUp) - held(Key::ArrowDown),
            );
            scroll = input.smooth_scroll_delta.y / SCROLL_POINTS_PER_STEP;
        }

        Self {
            time_ms: input.time * 1000.0,
            dt: input.stable_dt,
            image_size: Vec2::new(rect.width(), rect.height()),
            pointer,
            pointer_delta: Vec2::new(delta.x, delta.y),
            primary_pressed: hovered && input.pointer.button_pressed(PointerButton::Primary),
            primary_down: input.pointer.button_down(PointerButton::Primary),
            primary_released: input.pointer.button_released(PointerButton::Primary),
            secondary_down: hovered && input.pointer.button_down(PointerButton::Secondary),
            middle_down: hovered && input.pointer.button_down(PointerButton::Middle),
            scroll,
            nudge,
            modifiers,
            keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_in_image_bounds() {
        let mut input = InputFrame {
            image_size: Vec2::new(100.0, 50.0),
            pointer: Some(Vec2::new(99.5, 10.0)),
            ..InputFrame::default()
        };
        assert!(input.pointer_in_image().is_some());
        input.pointer = Some(Vec2::new(100.0, 10.0));
        assert!(input.pointer_in_image().is_none());
        input.pointer = Some(Vec2::new(10.0, -1.0));
        assert!(input.pointer_in_image().is_none());
        input.pointer = None;
        assert!(input.pointer_in_image().is_none());
    }

    #[test]
    fn test_command_counts_as_ctrl() {
        let modifiers = Modifiers::from(egui::Modifiers {
            command: true,
            ..egui::Modifiers::default()
        });
        assert!(modifiers.ctrl);
        assert!(modifiers.any());
        assert!(!Modifiers::NONE.any());
    }
}
