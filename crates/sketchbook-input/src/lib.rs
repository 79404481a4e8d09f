//! Input plumbing for the camera: frame-coherent keyboard and pointer state
//! plus the rebindable key table for free-fly camera actions.

pub mod bindings;
pub mod keyboard;
pub mod pointer;

pub use bindings::{
    BindingError, CameraAction, CameraActionState, CameraBindings, KeyBinding, key_code_name,
    parse_key_code,
};
pub use keyboard::{KeyboardState, RawKeyEvent};
pub use pointer::PointerState;
