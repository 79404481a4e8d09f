//! Orbit camera controller: spherical offset around a target, smoothed zoom,
//! and look-ahead auto-follow of a moving subject.
//!
//! Angles are kept in degrees. `theta` is the azimuth around world `+Y`
//! (0 = camera on the target's `+Z` side), `phi` the elevation above the
//! horizon.

use std::time::Duration;

use glam::{EulerRot, Quat, Vec2, Vec3};
use sketchbook_config::CameraConfig;
use tracing::{debug, trace};

use crate::subject::FollowedSubject;
use crate::view::{CameraView, look_rotation};

/// Elevation limit in degrees; keeps the camera off the poles.
pub const PHI_LIMIT: f32 = 85.0;
/// Smallest orbit radius a zoom request may ask for.
pub const MIN_TARGET_RADIUS: f32 = 0.001;
/// Per-frame factor pulling the radius toward its target.
pub const RADIUS_LERP: f32 = 0.1;
/// Once the camera is this close (radians) to its follow goal, slow down.
const SETTLED_ANGLE: f32 = 0.05;
/// Slerp factor used once settled.
const SETTLED_LERP: f32 = 0.025;
/// Zoom goal scale per wheel line.
const ZOOM_STEP: f32 = 1.1;

/// What drove the camera orientation during the last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitMode {
    /// Looking straight at the orbit target.
    Manual,
    /// Slerping toward a point ahead of the followed subject.
    AutoFollow,
}

/// Orbit camera state. Drives a [`CameraView`] each frame.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Point being orbited.
    pub target: Vec3,
    /// Pointer sensitivity per axis.
    pub sensitivity: Vec2,
    /// Free-fly base speed.
    pub movement_speed: f32,
    /// Quiet period after manual rotation before auto-follow takes over.
    pub auto_rotate_delay: Duration,
    /// Slerp factor while auto-follow converges.
    pub auto_rotate_lerp: f32,
    pub(crate) radius: f32,
    pub(crate) target_radius: f32,
    pub(crate) theta: f32,
    pub(crate) phi: f32,
    pub(crate) velocity: Vec3,
    clock: Duration,
    last_manual_input: Duration,
    mode: OrbitMode,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(1.0, 0.8)
    }
}

impl OrbitCamera {
    /// A camera three units in front of the origin.
    pub fn new(sensitivity_x: f32, sensitivity_y: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            sensitivity: Vec2::new(sensitivity_x, sensitivity_y),
            movement_speed: 0.06,
            auto_rotate_delay: Duration::from_millis(400),
            auto_rotate_lerp: 0.1,
            radius: 3.0,
            target_radius: 3.0,
            theta: 0.0,
            phi: 0.0,
            velocity: Vec3::ZERO,
            clock: Duration::ZERO,
            last_manual_input: Duration::ZERO,
            mode: OrbitMode::Manual,
        }
    }

    /// Build from the `camera` config section.
    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self::new(config.sensitivity_x, config.sensitivity_y);
        camera.movement_speed = config.movement_speed;
        camera.auto_rotate_delay = Duration::from_millis(config.auto_rotate_delay_ms);
        camera.auto_rotate_lerp = config.auto_rotate_lerp;
        camera.set_radius(config.radius, true);
        camera
    }

    /// Azimuth in degrees. [`move_by`](Self::move_by) keeps it within
    /// `(-360, 360)`; [`update`](Self::update) re-derives it from the view
    /// rotation, which leaves it within `[-180, 180]`.
    pub fn theta(&self) -> f32 {
        self.theta
    }

    /// Elevation in degrees, within `[-85, 85]`.
    pub fn phi(&self) -> f32 {
        self.phi
    }

    /// Current (smoothed) radius.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Radius the current radius is easing toward.
    pub fn target_radius(&self) -> f32 {
        self.target_radius
    }

    /// Mode chosen by the last [`update`](Self::update).
    pub fn mode(&self) -> OrbitMode {
        self.mode
    }

    /// Time accumulated through [`update`](Self::update).
    pub fn elapsed(&self) -> Duration {
        self.clock
    }

    /// Replace both sensitivities.
    pub fn set_sensitivity(&mut self, x: f32, y: f32) {
        self.sensitivity = Vec2::new(x, y);
    }

    /// Set the zoom goal. With `instantly` the radius jumps there too.
    pub fn set_radius(&mut self, value: f32, instantly: bool) {
        self.target_radius = value.max(MIN_TARGET_RADIUS);
        if instantly {
            self.radius = value;
        }
    }

    /// Scale the zoom goal by wheel input. Positive `lines` move closer.
    pub fn zoom(&mut self, lines: f32) {
        if lines != 0.0 {
            self.set_radius(self.target_radius * ZOOM_STEP.powf(-lines), false);
        }
    }

    /// Set both angles directly, applying the usual wrap and clamp.
    pub fn set_angles(&mut self, theta: f32, phi: f32) {
        self.theta = theta % 360.0;
        self.phi = phi.clamp(-PHI_LIMIT, PHI_LIMIT);
    }

    /// Apply a pointer delta. Counts as manual input for auto-follow timing.
    pub fn move_by(&mut self, delta_x: f32, delta_y: f32) {
        self.theta -= delta_x * (self.sensitivity.x / 2.0);
        self.theta %= 360.0;
        self.phi += delta_y * (self.sensitivity.y / 2.0);
        self.phi = self.phi.clamp(-PHI_LIMIT, PHI_LIMIT);
        self.last_manual_input = self.clock;
    }

    /// Camera position implied by the target, radius and angles.
    pub fn orbit_position(&self) -> Vec3 {
        let (sin_t, cos_t) = self.theta.to_radians().sin_cos();
        let (sin_p, cos_p) = self.phi.to_radians().sin_cos();
        self.target + self.radius * Vec3::new(sin_t * cos_p, sin_p, cos_t * cos_p)
    }

    /// Advance one frame and write the resulting pose into `view`.
    ///
    /// `subject` is the object being followed this frame, if any.
    pub fn update(
        &mut self,
        dt: Duration,
        view: &mut CameraView,
        subject: Option<&dyn FollowedSubject>,
    ) -> OrbitMode {
        self.clock += dt;
        self.radius += (self.target_radius - self.radius) * RADIUS_LERP;
        view.position = self.orbit_position();

        let quiet_for = self.clock.saturating_sub(self.last_manual_input);
        let follow = subject
            .filter(|s| s.allows_auto_follow())
            .filter(|_| quiet_for > self.auto_rotate_delay);

        self.mode = if let Some(subject) = follow {
            let look_ahead = self.target + subject.forward();
            match look_rotation(view.position, look_ahead, Vec3::Y) {
                Some(goal) => {
                    let factor = if view.rotation.angle_between(goal) < SETTLED_ANGLE {
                        SETTLED_LERP
                    } else {
                        self.auto_rotate_lerp
                    };
                    view.rotation = view.rotation.slerp(goal, factor).normalize();
                    trace!(factor, "auto-follow slerp");
                }
                None => view.look_at(self.target, Vec3::Y),
            }
            OrbitMode::AutoFollow
        } else {
            view.look_at(self.target, Vec3::Y);
            OrbitMode::Manual
        };

        self.sync_angles(view.rotation);
        self.mode
    }

    /// Re-derive `theta`/`phi` from a camera orientation so the next orbit
    /// position agrees with where the camera is looking.
    fn sync_angles(&mut self, rotation: Quat) {
        let (yaw, pitch, _roll) = rotation.to_euler(EulerRot::YXZ);
        let theta = yaw.to_degrees();
        let phi = -pitch.to_degrees();
        if theta.is_finite() && phi.is_finite() {
            self.set_angles(theta, phi);
        } else {
            debug!(?rotation, "skipping angle sync for non-finite rotation");
        }
    }
}
