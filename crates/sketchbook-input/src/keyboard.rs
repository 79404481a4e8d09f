//! Frame-coherent keyboard state tracker.
//!
//! [`KeyboardState`] accumulates key events during a frame and answers, for
//! any physical key, whether it is held and whether it went down this frame.
//! Physical key codes are used so WASD panning works the same on every
//! keyboard layout.

use rustc_hash::FxHashSet;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Minimal description of a key event for processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    /// The physical key involved.
    pub key: PhysicalKey,
    /// Whether the key was pressed or released.
    pub state: ElementState,
    /// Whether this is an auto-repeat event.
    pub repeat: bool,
}

impl RawKeyEvent {
    /// A non-repeating press of `code`.
    pub fn pressed(code: KeyCode) -> Self {
        Self {
            key: PhysicalKey::Code(code),
            state: ElementState::Pressed,
            repeat: false,
        }
    }

    /// A release of `code`.
    pub fn released(code: KeyCode) -> Self {
        Self {
            key: PhysicalKey::Code(code),
            state: ElementState::Released,
            repeat: false,
        }
    }
}

/// Tracks held keys plus the keys that went down during the current frame.
///
/// Forward events with [`process_event`](Self::process_event) or
/// [`process_raw`](Self::process_raw) and call
/// [`end_frame`](Self::end_frame) once the frame has consumed them.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: FxHashSet<KeyCode>,
    went_down: FxHashSet<KeyCode>,
}

impl KeyboardState {
    /// Creates a state with no keys held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes a winit [`KeyEvent`].
    pub fn process_event(&mut self, event: &KeyEvent) {
        self.process_raw(RawKeyEvent {
            key: event.physical_key,
            state: event.state,
            repeat: event.repeat,
        });
    }

    /// Processes a [`RawKeyEvent`]. Repeats and unidentified keys are ignored.
    pub fn process_raw(&mut self, event: RawKeyEvent) {
        let PhysicalKey::Code(code) = event.key else {
            return;
        };
        if event.repeat {
            return;
        }
        match event.state {
            ElementState::Pressed => {
                if self.held.insert(code) {
                    self.went_down.insert(code);
                }
            }
            ElementState::Released => {
                self.held.remove(&code);
            }
        }
    }

    /// Returns `true` while the key is held down.
    #[must_use]
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    /// Returns `true` only during the frame the key went down.
    #[must_use]
    pub fn went_down(&self, code: KeyCode) -> bool {
        self.went_down.contains(&code)
    }

    /// Either shift key is held.
    #[must_use]
    pub fn shift_held(&self) -> bool {
        self.is_held(KeyCode::ShiftLeft) || self.is_held(KeyCode::ShiftRight)
    }

    /// Drops every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.went_down.clear();
    }

    /// Clears per-frame edges. Held keys stay held.
    pub fn end_frame(&mut self) {
        self.went_down.clear();
    }
}
