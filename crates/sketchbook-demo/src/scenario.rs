//! Scripted input and a subject driving in circles, standing in for a window
//! and gameplay.

use std::f32::consts::PI;

use glam::{Quat, Vec2, Vec3};
use sketchbook_camera::SubjectSnapshot;
use sketchbook_input::RawKeyEvent;
use winit::keyboard::KeyCode;

/// Input arriving during one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub keys: Vec<RawKeyEvent>,
    /// Raw pointer motion in pixels.
    pub motion: Vec2,
    /// Wheel lines.
    pub wheel: f32,
}

/// Fixed timeline: drag to orbit, zoom, then pan with the movement keys.
/// After frame 100 the input goes quiet so auto-follow can kick in.
pub fn input_for_frame(frame: u32) -> FrameInput {
    let mut input = FrameInput::default();
    if frame < 20 {
        input.motion = Vec2::new(6.0, -2.0);
    }
    if frame == 25 {
        input.wheel = 2.0;
    }
    match frame {
        40 => input.keys.push(RawKeyEvent::pressed(KeyCode::KeyW)),
        50 => input.keys.push(RawKeyEvent::pressed(KeyCode::ShiftLeft)),
        60 => input.keys.push(RawKeyEvent::released(KeyCode::ShiftLeft)),
        70 => input.keys.push(RawKeyEvent::released(KeyCode::KeyW)),
        80 => input.keys.push(RawKeyEvent::pressed(KeyCode::KeyE)),
        90 => input.keys.push(RawKeyEvent::released(KeyCode::KeyE)),
        _ => {}
    }
    input
}

/// A subject circling the origin counter-clockwise seen from above.
#[derive(Debug, Clone, Copy)]
pub struct CircuitDriver {
    pub radius: f32,
    /// Radians per second.
    pub angular_speed: f32,
    angle: f32,
}

impl CircuitDriver {
    pub fn new(radius: f32, angular_speed: f32) -> Self {
        Self {
            radius,
            angular_speed,
            angle: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.angle = (self.angle + self.angular_speed * dt) % (2.0 * PI);
    }

    pub fn snapshot(&self) -> SubjectSnapshot {
        let (sin, cos) = self.angle.sin_cos();
        let position = Vec3::new(self.radius * cos, 0.0, self.radius * sin);
        // Local -Z along the tangent (-sin, 0, cos).
        let orientation = Quat::from_rotation_y(PI - self.angle);
        SubjectSnapshot::new(position, orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchbook_camera::FollowedSubject;

    #[test]
    fn test_driver_faces_along_its_path() {
        let mut driver = CircuitDriver::new(10.0, 1.0);
        for _ in 0..7 {
            driver.advance(0.3);
            let s = driver.snapshot();
            let (sin, cos) = driver.angle.sin_cos();
            let tangent = Vec3::new(-sin, 0.0, cos);
            assert!((s.forward() - tangent).length() < 1e-4);
            assert!((s.position().length() - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_timeline_goes_quiet() {
        assert_ne!(input_for_frame(0).motion, Vec2::ZERO);
        assert_eq!(input_for_frame(25).wheel, 2.0);
        assert_eq!(input_for_frame(40).keys.len(), 1);
        assert_eq!(input_for_frame(150), FrameInput::default());
    }
}
