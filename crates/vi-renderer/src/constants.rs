//! Global constants for vi-renderer

/// Camera tuning
pub mod camera {
    /// Default yaw in degrees
    pub const DEFAULT_YAW_DEG: f32 = 45.0;
    /// Default pitch in degrees
    pub const DEFAULT_PITCH_DEG: f32 = 30.0;
    /// Default orbit distance
    pub const DEFAULT_DISTANCE: f32 = 5.0;
    /// Pitch limit in degrees, keeps the view matrix away from the pole
    pub const PITCH_LIMIT_DEG: f32 = 89.0;
    /// Zoom factor applied per wheel step
    pub const ZOOM_STEP: f32 = 0.9;
    /// Realized values closer than this to their goal snap onto it
    pub const SNAP_EPSILON: f32 = 1e-5;
    /// Nudge velocities below this are flushed to zero
    pub const NUDGE_REST_SPEED: f32 = 1e-4;
    /// Distance multiplier used when framing a bounding sphere
    pub const FRAME_DISTANCE_FACTOR: f32 = 2.5;
}

/// Gizmo geometry
pub mod gizmo {
    /// Segments used to approximate a rotation ring
    pub const RING_SEGMENTS: usize = 48;
    /// Axis handles start this fraction along the handle, leaving the center free
    pub const AXIS_START: f32 = 0.2;
    /// Inner edge of plane handles as a fraction of the handle length
    pub const PLANE_INNER: f32 = 0.25;
    /// Outer edge of plane handles as a fraction of the handle length
    pub const PLANE_OUTER: f32 = 0.45;
    /// Center handle radius as a multiple of the line thickness
    pub const CENTER_RADIUS_FACTOR: f32 = 3.0;
}

/// Picking
pub mod picking {
    /// Minimum time between two unforced point queries (~30 Hz)
    pub const MIN_PICK_INTERVAL_MS: f64 = 33.0;
    /// Default fat-pixel tolerance radius
    pub const DEFAULT_TOLERANCE_PX: u32 = 4;
    /// Largest accepted tolerance radius
    pub const MAX_TOLERANCE_PX: u32 = 32;
    /// Pointer travel before a press on empty space becomes a marquee
    pub const MARQUEE_THRESHOLD_PX: f32 = 3.0;
}
