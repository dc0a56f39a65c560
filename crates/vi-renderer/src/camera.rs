//! Orbit camera for the 3D viewport
//!
//! The camera keeps two copies of its orbit parameters: the *goal* values
//! written by user input and the *realized* values used for rendering.
//! [`OrbitCamera::tick`] moves the realized values toward the goals.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::constants::camera::{
    DEFAULT_DISTANCE, DEFAULT_PITCH_DEG, DEFAULT_YAW_DEG, FRAME_DISTANCE_FACTOR,
    NUDGE_REST_SPEED, PITCH_LIMIT_DEG, SNAP_EPSILON, ZOOM_STEP,
};

/// Projection used to build the projection matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionMode {
    /// Perspective projection with a vertical field of view
    Perspective {
        /// Vertical field of view in degrees
        fov_degrees: f32,
    },
    /// Orthographic projection; half-height is `half_size * distance`
    Orthographic {
        /// Half-height per unit of orbit distance
        half_size: f32,
    },
    /// Orthographic view locked straight down the Z axis
    TopDown2D {
        /// Half-height per unit of orbit distance
        half_size: f32,
    },
}

impl Default for ProjectionMode {
    fn default() -> Self {
        ProjectionMode::Perspective { fov_degrees: 40.0 }
    }
}

impl ProjectionMode {
    /// Whether the projection is orthographic
    pub fn is_orthographic(&self) -> bool {
        !matches!(self, ProjectionMode::Perspective { .. })
    }
}

/// Persistable orbit state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitCameraState {
    /// Realized yaw in radians
    pub yaw: f32,
    /// Realized pitch in radians
    pub pitch: f32,
    /// Realized distance from the target
    pub distance: f32,
    /// Orbit target
    pub target: Vec3,
    /// Yaw the camera is smoothing toward
    pub goal_yaw: f32,
    /// Pitch the camera is smoothing toward
    pub goal_pitch: f32,
    /// Distance the camera is smoothing toward
    pub goal_distance: f32,
    /// True while a frame-selection animation drives the camera
    pub is_animating: bool,
}

impl Default for OrbitCameraState {
    fn default() -> Self {
        let yaw = DEFAULT_YAW_DEG.to_radians();
        let pitch = DEFAULT_PITCH_DEG.to_radians();
        Self {
            yaw,
            pitch,
            distance: DEFAULT_DISTANCE,
            target: Vec3::ZERO,
            goal_yaw: yaw,
            goal_pitch: pitch,
            goal_distance: DEFAULT_DISTANCE,
            is_animating: false,
        }
    }
}

/// Frame-selection animation in progress
#[derive(Debug, Clone, Copy)]
struct CameraAnimation {
    from_target: Vec3,
    to_target: Vec3,
    from_distance: f32,
    to_distance: f32,
    elapsed: f32,
    duration: f32,
}

/// Orbit camera
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    state: OrbitCameraState,
    projection: ProjectionMode,
    config: CameraConfig,
    animation: Option<CameraAnimation>,
    nudge_velocity: Vec2,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

/// Input values that are not finite count as no input
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

fn pitch_limit() -> f32 {
    PITCH_LIMIT_DEG.to_radians()
}

/// One smoothing step, snapping onto the goal once close enough
fn approach(current: f32, goal: f32, factor: f32) -> f32 {
    let next = current + (goal - current) * factor;
    if (goal - next).abs() < SNAP_EPSILON {
        goal
    } else {
        next
    }
}

impl OrbitCamera {
    /// Create a new camera with default orbit parameters
    pub fn new(config: CameraConfig) -> Self {
        let config = config.sanitized();
        Self {
            state: OrbitCameraState::default(),
            projection: ProjectionMode::Perspective {
                fov_degrees: config.fov_degrees,
            },
            config,
            animation: None,
            nudge_velocity: Vec2::ZERO,
        }
    }

    /// Camera configuration
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Replace the configuration, re-clamping distances
    pub fn set_config(&mut self, config: CameraConfig) {
        self.config = config.sanitized();
        self.state.distance = self.clamp_distance(self.state.distance);
        self.state.goal_distance = self.clamp_distance(self.state.goal_distance);
    }

    /// Realized yaw in radians
    pub fn yaw(&self) -> f32 {
        self.state.yaw
    }

    /// Realized pitch in radians
    pub fn pitch(&self) -> f32 {
        self.state.pitch
    }

    /// Realized orbit distance
    pub fn distance(&self) -> f32 {
        self.state.distance
    }

    /// Distance the camera is smoothing toward
    pub fn distance_goal(&self) -> f32 {
        self.state.goal_distance
    }

    /// Orbit target
    pub fn target(&self) -> Vec3 {
        self.state.target
    }

    /// Whether a frame-selection animation is running
    pub fn is_animating(&self) -> bool {
        self.state.is_animating
    }

    /// Current arrow-key nudge velocity
    pub fn nudge_velocity(&self) -> Vec2 {
        self.nudge_velocity
    }

    /// Current projection mode
    pub fn projection(&self) -> ProjectionMode {
        self.projection
    }

    /// Switch projection mode
    pub fn set_projection(&mut self, projection: ProjectionMode) {
        self.projection = projection;
    }

    fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.config.min_distance, self.config.max_distance)
    }

    // ============== Input ==============

    /// Accumulate orbit deltas into the goal yaw/pitch
    pub fn set_orbit_targets(&mut self, delta_yaw: f32, delta_pitch: f32) {
        if matches!(self.projection, ProjectionMode::TopDown2D { .. }) {
            return;
        }
        let delta_yaw = finite_or_zero(delta_yaw);
        let delta_pitch = finite_or_zero(delta_pitch);
        if delta_yaw == 0.0 && delta_pitch == 0.0 {
            return;
        }
        self.cancel_animation();
        self.state.goal_yaw += delta_yaw;
        self.state.goal_pitch =
            (self.state.goal_pitch + delta_pitch).clamp(-pitch_limit(), pitch_limit());
    }

    /// Orbit from a pointer drag in pixels
    pub fn orbit_by_pixels(&mut self, delta: Vec2) {
        let sensitivity = self.config.orbit_sensitivity;
        self.set_orbit_targets(-delta.x * sensitivity, delta.y * sensitivity);
    }

    /// Exponential zoom: each wheel step scales the goal distance by 0.9
    pub fn zoom(&mut self, wheel_delta: f32) {
        let wheel_delta = finite_or_zero(wheel_delta);
        if wheel_delta == 0.0 {
            return;
        }
        self.cancel_animation();
        let goal = self.state.goal_distance * ZOOM_STEP.powf(wheel_delta);
        self.state.goal_distance = self.clamp_distance(goal);
    }

    /// Pan the target in the camera plane, scaled by the current distance
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let delta_x = finite_or_zero(delta_x);
        let delta_y = finite_or_zero(delta_y);
        if delta_x == 0.0 && delta_y == 0.0 {
            return;
        }
        self.cancel_animation();
        let (right, up) = self.pan_basis();
        let scale = self.state.distance * self.config.pan_sensitivity;
        self.state.target += right * (-delta_x * scale) + up * (delta_y * scale);
    }

    /// Arrow-key nudge: damped velocity driving pan (x) and dolly (y)
    pub fn apply_key_nudge(&mut self, held: Vec2, dt: f32) {
        let dt = finite_or_zero(dt).max(0.0);
        let held = Vec2::new(finite_or_zero(held.x), finite_or_zero(held.y))
            .clamp(Vec2::NEG_ONE, Vec2::ONE);

        let accel = self.config.nudge_acceleration;
        let damping = self.config.nudge_damping;
        let max_speed = self.config.nudge_max_speed;
        let step = |v: f32, h: f32| {
            let v = if h != 0.0 { v + accel * h * dt } else { v * damping };
            let v = v.clamp(-max_speed, max_speed);
            if v.abs() < NUDGE_REST_SPEED { 0.0 } else { v }
        };
        self.nudge_velocity = Vec2::new(
            step(self.nudge_velocity.x, held.x),
            step(self.nudge_velocity.y, held.y),
        );

        if self.nudge_velocity == Vec2::ZERO || dt == 0.0 {
            return;
        }
        self.cancel_animation();
        let (right, _) = self.pan_basis();
        self.state.target += right * (self.nudge_velocity.x * dt * self.state.distance);
        let dolly = (1.0 - self.nudge_velocity.y * dt).max(0.05);
        self.state.goal_distance = self.clamp_distance(self.state.goal_distance * dolly);
    }

    // ============== Presets and animation ==============

    /// Animate target and distance so the sphere fills the view
    pub fn frame_bounds(&mut self, center: Vec3, radius: f32) {
        if !center.is_finite() || !radius.is_finite() {
            return;
        }
        let to_distance = self.clamp_distance((radius.abs() * FRAME_DISTANCE_FACTOR).max(1.0));
        self.animation = Some(CameraAnimation {
            from_target: self.state.target,
            to_target: center,
            from_distance: self.state.distance,
            to_distance,
            elapsed: 0.0,
            duration: self.config.frame_duration,
        });
        self.state.is_animating = true;
        self.state.goal_distance = to_distance;
    }

    /// Stop a running animation where it currently is
    pub fn cancel_animation(&mut self) {
        if self.animation.take().is_some() {
            tracing::debug!("Camera animation cancelled at distance {}", self.state.distance);
            self.state.goal_distance = self.state.distance;
        }
        self.state.is_animating = false;
    }

    fn set_goal_angles(&mut self, yaw: f32, pitch: f32) {
        self.cancel_animation();
        self.state.goal_yaw = yaw;
        self.state.goal_pitch = pitch.clamp(-pitch_limit(), pitch_limit());
    }

    /// Look straight down
    pub fn set_top_view(&mut self) {
        self.set_goal_angles(0.0, pitch_limit());
    }

    /// View from the +X side
    pub fn set_front_view(&mut self) {
        self.set_goal_angles(0.0, 0.0);
    }

    /// View from the +Y side
    pub fn set_side_view(&mut self) {
        self.set_goal_angles(90.0_f32.to_radians(), 0.0);
    }

    // ============== Per-frame update ==============

    /// Advance smoothing and animation by one frame.
    ///
    /// The smoothing factor is applied per call, not per second, so the
    /// camera settles faster at higher frame rates.
    pub fn tick(&mut self, dt: f32) {
        let dt = finite_or_zero(dt).max(0.0);
        let factor = self.config.smooth_factor;

        self.state.yaw = approach(self.state.yaw, self.state.goal_yaw, factor);
        self.state.pitch = approach(self.state.pitch, self.state.goal_pitch, factor);

        match self.animation.as_mut() {
            Some(anim) => {
                anim.elapsed += dt;
                let t = if anim.duration > 0.0 {
                    (anim.elapsed / anim.duration).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                let s = t * t * (3.0 - 2.0 * t);
                self.state.target = anim.from_target.lerp(anim.to_target, s);
                self.state.distance =
                    anim.from_distance + (anim.to_distance - anim.from_distance) * s;
                self.state.goal_distance = anim.to_distance;
                if t >= 1.0 {
                    self.animation = None;
                    self.state.is_animating = false;
                }
            }
            None => {
                self.state.distance =
                    approach(self.state.distance, self.state.goal_distance, factor);
            }
        }
        self.state.distance = self.clamp_distance(self.state.distance);
    }

    // ============== Matrices ==============

    /// Camera position
    pub fn eye(&self) -> Vec3 {
        let s = &self.state;
        if let ProjectionMode::TopDown2D { .. } = self.projection {
            return s.target + Vec3::Z * s.distance;
        }
        let offset = Vec3::new(
            s.distance * s.pitch.cos() * s.yaw.cos(),
            s.distance * s.pitch.cos() * s.yaw.sin(),
            s.distance * s.pitch.sin(),
        );
        s.target + offset
    }

    fn up_vector(&self) -> Vec3 {
        match self.projection {
            ProjectionMode::TopDown2D { .. } => Vec3::Y,
            _ => Vec3::Z,
        }
    }

    fn pan_basis(&self) -> (Vec3, Vec3) {
        let forward = (self.state.target - self.eye()).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(self.up_vector()).normalize_or(Vec3::X);
        let up = right.cross(forward).normalize_or(Vec3::Z);
        (right, up)
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.state.target, self.up_vector())
    }

    /// Get projection matrix for the given aspect ratio
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        let near = self.config.near_plane;
        let far = self.config.far_plane;
        match self.projection {
            ProjectionMode::Perspective { fov_degrees } => Mat4::perspective_rh(
                finite_or_zero(fov_degrees).clamp(10.0, 120.0).to_radians(),
                aspect,
                near,
                far,
            ),
            ProjectionMode::Orthographic { half_size } | ProjectionMode::TopDown2D { half_size } => {
                let half_height = (half_size.abs() * self.state.distance).max(1e-4);
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(-half_width, half_width, -half_height, half_height, near, far)
            }
        }
    }

    /// View and projection matrices
    pub fn view_projection(&self, aspect: f32) -> (Mat4, Mat4) {
        (self.view_matrix(), self.projection_matrix(aspect))
    }

    /// Snapshot of the camera geometry for a viewport of the given size
    pub fn view_geometry(&self, viewport: Vec2) -> ViewGeometry {
        let viewport = viewport.max(Vec2::ONE);
        let (view, proj) = self.view_projection(viewport.x / viewport.y);
        ViewGeometry::new(view, proj, viewport)
    }

    // ============== Persistence ==============

    /// Orbit state for persistence
    pub fn state(&self) -> OrbitCameraState {
        self.state
    }

    /// Restore a persisted orbit state, repairing invalid fields
    pub fn apply_state(&mut self, state: OrbitCameraState) {
        let defaults = OrbitCameraState::default();
        let angle = |v: f32, d: f32| if v.is_finite() { v } else { d };
        let pitch = |v: f32, d: f32| angle(v, d).clamp(-pitch_limit(), pitch_limit());
        let distance = |v: f32, d: f32| self.clamp_distance(if v.is_finite() { v } else { d });

        let restored = OrbitCameraState {
            yaw: angle(state.yaw, defaults.yaw),
            pitch: pitch(state.pitch, defaults.pitch),
            distance: distance(state.distance, defaults.distance),
            target: if state.target.is_finite() {
                state.target
            } else {
                defaults.target
            },
            goal_yaw: angle(state.goal_yaw, defaults.goal_yaw),
            goal_pitch: pitch(state.goal_pitch, defaults.goal_pitch),
            goal_distance: distance(state.goal_distance, defaults.goal_distance),
            is_animating: false,
        };
        self.state = restored;
        self.animation = None;
        self.nudge_velocity = Vec2::ZERO;
    }
}

/// Camera matrices and viewport size captured for one frame
#[derive(Debug, Clone, Copy)]
pub struct ViewGeometry {
    /// View matrix
    pub view: Mat4,
    /// Projection matrix
    pub proj: Mat4,
    /// `proj * view`
    pub view_proj: Mat4,
    /// Inverse of `view_proj`
    pub inv_view_proj: Mat4,
    /// Camera world transform (inverse view)
    pub camera_world: Mat4,
    /// Viewport size in pixels
    pub viewport: Vec2,
}

impl ViewGeometry {
    /// Build from view and projection matrices
    pub fn new(view: Mat4, proj: Mat4, viewport: Vec2) -> Self {
        let view_proj = proj * view;
        Self {
            view,
            proj,
            view_proj,
            inv_view_proj: view_proj.inverse(),
            camera_world: view.inverse(),
            viewport: viewport.max(Vec2::ONE),
        }
    }

    /// Camera position
    pub fn eye(&self) -> Vec3 {
        self.camera_world.w_axis.xyz()
    }

    /// Camera right vector in world space
    pub fn right(&self) -> Vec3 {
        self.camera_world.x_axis.xyz().normalize_or(Vec3::X)
    }

    /// Camera up vector in world space
    pub fn up(&self) -> Vec3 {
        self.camera_world.y_axis.xyz().normalize_or(Vec3::Y)
    }

    /// Camera viewing direction in world space
    pub fn forward(&self) -> Vec3 {
        (-self.camera_world.z_axis.xyz()).normalize_or(Vec3::NEG_Z)
    }

    /// Whether the projection is orthographic
    pub fn is_orthographic(&self) -> bool {
        self.proj.w_axis.w == 1.0
    }

    /// Direction from a point toward the viewer
    pub fn to_viewer(&self, point: Vec3) -> Vec3 {
        if self.is_orthographic() {
            -self.forward()
        } else {
            (self.eye() - point).normalize_or(-self.forward())
        }
    }

    /// Project a world point to pixel coordinates (origin top-left).
    ///
    /// Returns `None` for points behind the camera.
    pub fn world_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_proj * point.extend(1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        ))
    }

    /// Pixel coordinates to normalized device coordinates
    pub fn screen_to_ndc(&self, pixel: Vec2) -> Vec2 {
        Vec2::new(
            2.0 * pixel.x / self.viewport.x - 1.0,
            1.0 - 2.0 * pixel.y / self.viewport.y,
        )
    }

    /// World position at a pixel and NDC depth (0 = near, 1 = far)
    pub fn unproject(&self, pixel: Vec2, depth: f32) -> Vec3 {
        let ndc = self.screen_to_ndc(pixel);
        self.inv_view_proj.project_point3(Vec3::new(ndc.x, ndc.y, depth))
    }

    /// Convert a pixel to a world-space ray (origin, normalized direction)
    pub fn screen_to_ray(&self, pixel: Vec2) -> (Vec3, Vec3) {
        let near = self.unproject(pixel, 0.0);
        let far = self.unproject(pixel, 1.0);
        (near, (far - near).normalize_or(self.forward()))
    }

    /// World units covered by one pixel at the depth of `point`
    pub fn world_per_pixel(&self, point: Vec3) -> Option<f32> {
        let a = self.world_to_screen(point)?;
        let b = self.world_to_screen(point + self.right())?;
        let pixels = a.distance(b);
        (pixels > 1e-6).then(|| 1.0 / pixels)
    }
}
