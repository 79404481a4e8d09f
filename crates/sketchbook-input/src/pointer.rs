//! Frame-coherent pointer state for orbit input.
//!
//! [`PointerState`] sums pointer motion and wheel input for a frame. While
//! the pointer is captured only raw device motion counts; otherwise cursor
//! position differences are used.

use glam::Vec2;
use winit::event::MouseScrollDelta;

/// Pixels of precise scrolling treated as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

/// Accumulated pointer input for the current frame.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    position: Option<Vec2>,
    delta: Vec2,
    wheel: f32,
    captured: bool,
}

impl PointerState {
    /// Creates an uncaptured pointer with no recorded position.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a `CursorMoved` event. The first sample only records position.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        if !self.captured
            && let Some(prev) = self.position
        {
            self.delta += new_pos - prev;
        }
        self.position = Some(new_pos);
    }

    /// Process a `DeviceEvent::MouseMotion` delta.
    pub fn on_raw_motion(&mut self, dx: f64, dy: f64) {
        if self.captured {
            self.delta += Vec2::new(dx as f32, dy as f32);
        }
    }

    /// Process a `MouseWheel` event.
    pub fn on_wheel(&mut self, delta: MouseScrollDelta) {
        self.wheel += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
        };
    }

    /// Switch between raw-motion (captured) and cursor-difference input.
    pub fn set_captured(&mut self, captured: bool) {
        self.captured = captured;
    }

    /// Whether raw motion is currently used.
    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Motion accumulated this frame.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    /// Motion in orbit convention, optionally with the vertical axis flipped.
    #[must_use]
    pub fn orbit_delta(&self, invert_y: bool) -> Vec2 {
        if invert_y {
            Vec2::new(self.delta.x, -self.delta.y)
        } else {
            self.delta
        }
    }

    /// Wheel lines accumulated this frame (positive = away from the user).
    #[must_use]
    pub fn wheel(&self) -> f32 {
        self.wheel
    }

    /// Whether any motion arrived this frame.
    #[must_use]
    pub fn moved(&self) -> bool {
        self.delta != Vec2::ZERO
    }

    /// Clears per-frame motion and wheel input.
    pub fn end_frame(&mut self) {
        self.delta = Vec2::ZERO;
        self.wheel = 0.0;
    }
}
