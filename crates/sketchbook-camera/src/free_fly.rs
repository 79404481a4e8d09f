//! Free-fly mode: the orbit target is flown around with movement keys while
//! the orbit controller keeps handling look and zoom.

use glam::Vec3;
use sketchbook_input::{CameraAction, CameraActionState};
use tracing::debug;

use crate::orbit::OrbitCamera;
use crate::view::CameraView;

/// Per-frame factor pulling velocities toward the key signals.
pub const VELOCITY_LERP: f32 = 0.3;
/// Frame-rate normalisation for regular speed.
const BASE_RATE: f32 = 60.0;
/// Frame-rate normalisation while the fast modifier is held.
const FAST_RATE: f32 = 600.0;

impl OrbitCamera {
    /// Detach from any subject: orbit the current camera position with zero
    /// radius so the view turns in place.
    pub fn enter_free_camera(&mut self, view: &CameraView) {
        self.target = view.position;
        self.set_radius(0.0, true);
        self.velocity = Vec3::ZERO;
        debug!(target = ?self.target, "entered free camera");
    }

    /// Smoothed movement velocity (x = right, y = up, z = forward).
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Move the target from held movement actions. Call before
    /// [`update`](Self::update) each frame.
    ///
    /// `time_step` is the frame time in seconds; `speed_scale` multiplies the
    /// configured movement speed.
    pub fn update_free_fly(
        &mut self,
        actions: &CameraActionState,
        time_step: f32,
        speed_scale: f32,
        view: &CameraView,
    ) {
        let signal = Vec3::new(
            actions.signal(CameraAction::Right, CameraAction::Left),
            actions.signal(CameraAction::Up, CameraAction::Down),
            actions.signal(CameraAction::Forward, CameraAction::Back),
        );
        self.velocity += (signal - self.velocity) * VELOCITY_LERP;

        let rate = if actions.is_pressed(CameraAction::Fast) {
            FAST_RATE
        } else {
            BASE_RATE
        };
        let speed = self.movement_speed * time_step * rate * speed_scale;

        self.target += view.up() * (self.velocity.y * speed);
        self.target += view.forward() * (self.velocity.z * speed);
        self.target += view.right() * (self.velocity.x * speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f32 = 1.0 / 60.0;

    #[test]
    fn test_enter_free_camera_orbits_in_place() {
        let mut cam = OrbitCamera::new(1.0, 1.0);
        let mut view = CameraView::default();
        view.position = Vec3::new(4.0, 1.0, -2.0);
        cam.enter_free_camera(&view);
        assert_eq!(cam.target, view.position);
        assert_eq!(cam.radius(), 0.0);
        assert_eq!(cam.target_radius(), crate::orbit::MIN_TARGET_RADIUS);
    }

    #[test]
    fn test_velocity_eases_toward_signal() {
        let mut cam = OrbitCamera::new(1.0, 1.0);
        let view = CameraView::default();
        let forward = CameraActionState::default().with(CameraAction::Forward, true);
        cam.update_free_fly(&forward, STEP, 1.0, &view);
        assert!((cam.velocity().z - 0.3).abs() < 1e-6);
        cam.update_free_fly(&forward, STEP, 1.0, &view);
        assert!((cam.velocity().z - 0.51).abs() < 1e-6);
    }

    #[test]
    fn test_forward_moves_along_view_direction() {
        let mut cam = OrbitCamera::new(1.0, 1.0);
        let view = CameraView::default();
        let forward = CameraActionState::default().with(CameraAction::Forward, true);
        cam.update_free_fly(&forward, STEP, 1.0, &view);
        // 0.06 * (1/60 * 60) * 1.0 * 0.3
        assert!((cam.target - Vec3::new(0.0, 0.0, -0.018)).length() < 1e-6);
    }

    #[test]
    fn test_fast_modifier_is_ten_times_faster() {
        let view = CameraView::default();
        let right = CameraActionState::default().with(CameraAction::Right, true);
        let fast = right.with(CameraAction::Fast, true);

        let mut slow_cam = OrbitCamera::new(1.0, 1.0);
        let mut fast_cam = OrbitCamera::new(1.0, 1.0);
        slow_cam.update_free_fly(&right, STEP, 1.0, &view);
        fast_cam.update_free_fly(&fast, STEP, 1.0, &view);
        assert!(slow_cam.target.x > 0.0);
        assert!((fast_cam.target.x - 10.0 * slow_cam.target.x).abs() < 1e-6);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut cam = OrbitCamera::new(1.0, 1.0);
        let view = CameraView::default();
        let both = CameraActionState::default()
            .with(CameraAction::Up, true)
            .with(CameraAction::Down, true);
        for _ in 0..10 {
            cam.update_free_fly(&both, STEP, 1.0, &view);
        }
        assert_eq!(cam.target, Vec3::ZERO);
    }

    #[test]
    fn test_velocity_decays_after_release() {
        let mut cam = OrbitCamera::new(1.0, 1.0);
        let view = CameraView::default();
        let up = CameraActionState::default().with(CameraAction::Up, true);
        cam.update_free_fly(&up, STEP, 1.0, &view);
        let idle = CameraActionState::default();
        for _ in 0..60 {
            cam.update_free_fly(&idle, STEP, 1.0, &view);
        }
        assert!(cam.velocity().y.abs() < 1e-6);
        assert!(cam.target.y > 0.0);
    }
}
