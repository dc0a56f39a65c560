//! Viewport configuration structures
//!
//! This module provides configurable settings for the camera, gizmo and
//! picking that can be serialized and loaded from configuration files.

use serde::{Deserialize, Serialize};

use crate::constants::picking::{
    DEFAULT_TOLERANCE_PX, MARQUEE_THRESHOLD_PX, MAX_TOLERANCE_PX, MIN_PICK_INTERVAL_MS,
};
use crate::gizmo::SnapSettings;

/// Viewport background configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewportConfig {
    /// Background clear color (RGBA)
    pub background_color: [f32; 4],
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            background_color: [0.15, 0.15, 0.18, 1.0],
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Field of view in degrees
    pub fov_degrees: f32,
    /// Near clipping plane distance
    pub near_plane: f32,
    /// Far clipping plane distance
    pub far_plane: f32,
    /// Closest allowed orbit distance
    pub min_distance: f32,
    /// Farthest allowed orbit distance
    pub max_distance: f32,
    /// Pan sensitivity multiplier (world units per pixel per unit distance)
    pub pan_sensitivity: f32,
    /// Orbit sensitivity (radians per pixel)
    pub orbit_sensitivity: f32,
    /// Fraction of the remaining goal distance covered each frame
    pub smooth_factor: f32,
    /// Arrow-key nudge acceleration
    pub nudge_acceleration: f32,
    /// Per-frame velocity multiplier while no nudge key is held
    pub nudge_damping: f32,
    /// Nudge velocity limit
    pub nudge_max_speed: f32,
    /// Duration of the frame-selection animation in seconds
    pub frame_duration: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 40.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            min_distance: 0.05,
            max_distance: 10000.0,
            pan_sensitivity: 0.002,
            orbit_sensitivity: 0.005,
            smooth_factor: 0.2,
            nudge_acceleration: 4.0,
            nudge_damping: 0.85,
            nudge_max_speed: 2.0,
            frame_duration: 0.35,
        }
    }
}

impl CameraConfig {
    /// Copy with out-of-range values repaired
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f32, d: f32| if v.is_finite() { v } else { d };
        let min_distance = finite_or(self.min_distance, defaults.min_distance).max(1e-4);
        let near_plane = finite_or(self.near_plane, defaults.near_plane).max(0.001);
        Self {
            fov_degrees: finite_or(self.fov_degrees, defaults.fov_degrees).clamp(10.0, 120.0),
            near_plane,
            far_plane: finite_or(self.far_plane, defaults.far_plane).max(near_plane + 1.0),
            min_distance,
            max_distance: finite_or(self.max_distance, defaults.max_distance)
                .max(min_distance),
            pan_sensitivity: finite_or(self.pan_sensitivity, defaults.pan_sensitivity),
            orbit_sensitivity: finite_or(self.orbit_sensitivity, defaults.orbit_sensitivity),
            smooth_factor: finite_or(self.smooth_factor, defaults.smooth_factor).clamp(0.01, 1.0),
            nudge_acceleration: finite_or(self.nudge_acceleration, defaults.nudge_acceleration)
                .max(0.0),
            nudge_damping: finite_or(self.nudge_damping, defaults.nudge_damping).clamp(0.0, 1.0),
            nudge_max_speed: finite_or(self.nudge_max_speed, defaults.nudge_max_speed).max(0.0),
            frame_duration: finite_or(self.frame_duration, defaults.frame_duration).max(0.0),
        }
    }
}

/// Gizmo configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GizmoConfig {
    /// Handle length in screen pixels
    pub size_px: f32,
    /// Half-thickness of line handles in pixels
    pub thickness_px: f32,
    /// Default snapping steps
    pub snap: SnapSettings,
    /// X-axis color (RGBA)
    pub x_axis_color: [f32; 4],
    /// Y-axis color (RGBA)
    pub y_axis_color: [f32; 4],
    /// Z-axis color (RGBA)
    pub z_axis_color: [f32; 4],
    /// Center handle color (RGBA)
    pub center_color: [f32; 4],
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            size_px: 90.0,
            thickness_px: 2.0,
            snap: SnapSettings::default(),
            x_axis_color: [1.0, 0.2, 0.2, 1.0],
            y_axis_color: [0.2, 1.0, 0.2, 1.0],
            z_axis_color: [0.2, 0.2, 1.0, 1.0],
            center_color: [0.9, 0.9, 0.9, 1.0],
        }
    }
}

/// Picking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PickingConfig {
    /// Minimum interval between unforced point queries in milliseconds
    pub min_interval_ms: f64,
    /// Fat-pixel tolerance radius for point queries
    pub tolerance_px: u32,
    /// Pointer travel before a press on empty space becomes a marquee
    pub marquee_threshold_px: f32,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: MIN_PICK_INTERVAL_MS,
            tolerance_px: DEFAULT_TOLERANCE_PX,
            marquee_threshold_px: MARQUEE_THRESHOLD_PX,
        }
    }
}

impl PickingConfig {
    /// Copy with the tolerance capped and negative or non-finite values replaced
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        Self {
            min_interval_ms: if self.min_interval_ms.is_finite() {
                self.min_interval_ms.max(0.0)
            } else {
                defaults.min_interval_ms
            },
            tolerance_px: self.tolerance_px.min(MAX_TOLERANCE_PX),
            marquee_threshold_px: if self.marquee_threshold_px.is_finite() {
                self.marquee_threshold_px.max(0.0)
            } else {
                defaults.marquee_threshold_px
            },
        }
    }
}

/// Complete renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RendererConfig {
    /// Viewport settings
    #[serde(default)]
    pub viewport: ViewportConfig,
    /// Camera settings
    #[serde(default)]
    pub camera: CameraConfig,
    /// Gizmo settings
    #[serde(default)]
    pub gizmo: GizmoConfig,
    /// Picking settings
    #[serde(default)]
    pub picking: PickingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_config_sanitized() {
        let broken = CameraConfig {
            min_distance: -1.0,
            max_distance: f32::NAN,
            smooth_factor: 3.0,
            ..CameraConfig::default()
        };
        let fixed = broken.sanitized();
        assert!(fixed.min_distance > 0.0);
        assert!(fixed.max_distance >= fixed.min_distance);
        assert_eq!(fixed.smooth_factor, 1.0);
    }

    #[test]
    fn test_picking_config_sanitized() {
        let broken = PickingConfig {
            min_interval_ms: f64::INFINITY,
            tolerance_px: u32::MAX,
            marquee_threshold_px: -2.0,
        };
        let fixed = broken.sanitized();
        assert_eq!(fixed.tolerance_px, MAX_TOLERANCE_PX);
        assert_eq!(fixed.min_interval_ms, MIN_PICK_INTERVAL_MS);
        assert_eq!(fixed.marquee_threshold_px, 0.0);
        assert_eq!(PickingConfig::default().sanitized(), PickingConfig::default());
    }
}
