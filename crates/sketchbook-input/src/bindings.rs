//! Rebindable key table for the free-fly camera.
//!
//! Each [`CameraAction`] owns a [`KeyBinding`] listing the physical keys that
//! trigger it. [`CameraBindings::resolve`] turns the current keyboard state
//! into a [`CameraActionState`] once per frame.

use crate::keyboard::KeyboardState;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};
use winit::keyboard::KeyCode;

/// Errors raised while applying binding overrides.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// The action name is not one of [`CameraAction::ALL`].
    #[error("unknown camera action: {0}")]
    UnknownAction(String),
    /// The key name has no matching physical key.
    #[error("unknown key: {0}")]
    UnknownKey(String),
}

/// Camera movement actions driven by the keyboard.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum CameraAction {
    /// Pan the orbit target forward.
    Forward,
    /// Pan backward.
    Back,
    /// Pan left.
    Left,
    /// Pan right.
    Right,
    /// Raise the orbit target.
    Up,
    /// Lower the orbit target.
    Down,
    /// Speed multiplier while held.
    Fast,
}

impl CameraAction {
    /// Every action, in index order.
    pub const ALL: [CameraAction; 7] = [
        CameraAction::Forward,
        CameraAction::Back,
        CameraAction::Left,
        CameraAction::Right,
        CameraAction::Up,
        CameraAction::Down,
        CameraAction::Fast,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// The lowercase name used in config files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CameraAction::Forward => "forward",
            CameraAction::Back => "back",
            CameraAction::Left => "left",
            CameraAction::Right => "right",
            CameraAction::Up => "up",
            CameraAction::Down => "down",
            CameraAction::Fast => "fast",
        }
    }

    /// Look up an action by its config name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

mod key_codes_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use winit::keyboard::KeyCode;

    pub fn serialize<S: Serializer>(codes: &[KeyCode], s: S) -> Result<S::Ok, S::Error> {
        codes
            .iter()
            .map(|c| super::key_code_name(*c))
            .collect::<Vec<_>>()
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<KeyCode>, D::Error> {
        Vec::<String>::deserialize(d)?
            .into_iter()
            .map(|name| {
                super::parse_key_code(&name)
                    .ok_or_else(|| serde::de::Error::custom(format!("unknown key: {name}")))
            })
            .collect()
    }
}

/// The physical keys bound to one action. Any of them triggers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    /// Bound keys.
    #[serde(with = "key_codes_serde")]
    pub codes: Vec<KeyCode>,
}

impl KeyBinding {
    /// A binding with a single key.
    #[must_use]
    pub fn single(code: KeyCode) -> Self {
        Self { codes: vec![code] }
    }

    /// Whether any bound key is held.
    #[must_use]
    pub fn is_active(&self, keyboard: &KeyboardState) -> bool {
        self.codes.iter().any(|c| keyboard.is_held(*c))
    }
}

/// Per-frame pressed flags for every [`CameraAction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraActionState {
    pressed: [bool; 7],
}

impl CameraActionState {
    /// Mark an action pressed or released.
    pub fn set(&mut self, action: CameraAction, pressed: bool) {
        self.pressed[action.index()] = pressed;
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, action: CameraAction, pressed: bool) -> Self {
        self.set(action, pressed);
        self
    }

    /// Whether the action is pressed.
    #[must_use]
    pub fn is_pressed(&self, action: CameraAction) -> bool {
        self.pressed[action.index()]
    }

    /// `+1`, `-1` or `0` from a positive/negative action pair.
    #[must_use]
    pub fn signal(&self, positive: CameraAction, negative: CameraAction) -> f32 {
        f32::from(u8::from(self.is_pressed(positive))) - f32::from(u8::from(self.is_pressed(negative)))
    }
}

/// Action → key table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraBindings {
    /// The binding table.
    pub bindings: FxHashMap<CameraAction, KeyBinding>,
}

impl Default for CameraBindings {
    fn default() -> Self {
        let mut bindings = FxHashMap::default();
        bindings.insert(CameraAction::Forward, KeyBinding::single(KeyCode::KeyW));
        bindings.insert(CameraAction::Back, KeyBinding::single(KeyCode::KeyS));
        bindings.insert(CameraAction::Left, KeyBinding::single(KeyCode::KeyA));
        bindings.insert(CameraAction::Right, KeyBinding::single(KeyCode::KeyD));
        bindings.insert(CameraAction::Up, KeyBinding::single(KeyCode::KeyE));
        bindings.insert(CameraAction::Down, KeyBinding::single(KeyCode::KeyQ));
        bindings.insert(CameraAction::Fast, KeyBinding::single(KeyCode::ShiftLeft));
        Self { bindings }
    }
}

impl CameraBindings {
    /// Keys bound to an action (empty if unbound).
    #[must_use]
    pub fn keys(&self, action: CameraAction) -> &[KeyCode] {
        self.bindings
            .get(&action)
            .map_or(&[], |b| b.codes.as_slice())
    }

    /// Replace the keys for an action.
    pub fn rebind(&mut self, action: CameraAction, binding: KeyBinding) {
        debug!(action = action.name(), keys = ?binding.codes, "rebinding camera action");
        self.bindings.insert(action, binding);
    }

    /// Apply `action name -> key name` overrides from the config file.
    ///
    /// Every entry is validated before any is applied.
    pub fn apply_overrides(
        &mut self,
        overrides: &HashMap<String, String>,
    ) -> Result<(), BindingError> {
        let mut parsed = Vec::with_capacity(overrides.len());
        for (action_name, key_name) in overrides {
            let action = CameraAction::from_name(action_name)
                .ok_or_else(|| BindingError::UnknownAction(action_name.clone()))?;
            let code =
                parse_key_code(key_name).ok_or_else(|| BindingError::UnknownKey(key_name.clone()))?;
            parsed.push((action, code));
        }
        for (action, code) in parsed {
            self.rebind(action, KeyBinding::single(code));
        }
        Ok(())
    }

    /// Actions sharing at least one key with another action.
    #[must_use]
    pub fn conflicts(&self) -> Vec<(KeyCode, Vec<CameraAction>)> {
        let mut by_key: FxHashMap<KeyCode, Vec<CameraAction>> = FxHashMap::default();
        for action in CameraAction::ALL {
            for code in self.keys(action) {
                by_key.entry(*code).or_default().push(action);
            }
        }
        let mut conflicts: Vec<_> = by_key
            .into_iter()
            .filter(|(_, actions)| actions.len() > 1)
            .collect();
        conflicts.sort_by_key(|(_, actions)| actions[0].index());
        for (code, actions) in &conflicts {
            warn!(key = ?code, ?actions, "camera key bound to several actions");
        }
        conflicts
    }

    /// Read pressed flags for every action from the keyboard.
    #[must_use]
    pub fn resolve(&self, keyboard: &KeyboardState) -> CameraActionState {
        let mut state = CameraActionState::default();
        for (action, binding) in &self.bindings {
            state.set(*action, binding.is_active(keyboard));
        }
        state
    }

    /// Serialize to a RON string.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize from a RON string.
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

/// Stable name for a key, matching its `Debug` output (e.g. `"KeyW"`).
#[must_use]
pub fn key_code_name(code: KeyCode) -> String {
    format!("{code:?}")
}

/// Parse a key name as written by [`key_code_name`].
#[must_use]
pub fn parse_key_code(s: &str) -> Option<KeyCode> {
    Some(match s {
        "KeyA" => KeyCode::KeyA,
        "KeyB" => KeyCode::KeyB,
        "KeyC" => KeyCode::KeyC,
        "KeyD" => KeyCode::KeyD,
        "KeyE" => KeyCode::KeyE,
        "KeyF" => KeyCode::KeyF,
        "KeyG" => KeyCode::KeyG,
        "KeyH" => KeyCode::KeyH,
        "KeyI" => KeyCode::KeyI,
        "KeyJ" => KeyCode::KeyJ,
        "KeyK" => KeyCode::KeyK,
        "KeyL" => KeyCode::KeyL,
        "KeyM" => KeyCode::KeyM,
        "KeyN" => KeyCode::KeyN,
        "KeyO" => KeyCode::KeyO,
        "KeyP" => KeyCode::KeyP,
        "KeyQ" => KeyCode::KeyQ,
        "KeyR" => KeyCode::KeyR,
        "KeyS" => KeyCode::KeyS,
        "KeyT" => KeyCode::KeyT,
        "KeyU" => KeyCode::KeyU,
        "KeyV" => KeyCode::KeyV,
        "KeyW" => KeyCode::KeyW,
        "KeyX" => KeyCode::KeyX,
        "KeyY" => KeyCode::KeyY,
        "KeyZ" => KeyCode::KeyZ,
        "Space" => KeyCode::Space,
        "ShiftLeft" => KeyCode::ShiftLeft,
        "ShiftRight" => KeyCode::ShiftRight,
        "ControlLeft" => KeyCode::ControlLeft,
        "ControlRight" => KeyCode::ControlRight,
        "AltLeft" => KeyCode::AltLeft,
        "AltRight" => KeyCode::AltRight,
        "ArrowUp" => KeyCode::ArrowUp,
        "ArrowDown" => KeyCode::ArrowDown,
        "ArrowLeft" => KeyCode::ArrowLeft,
        "ArrowRight" => KeyCode::ArrowRight,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        _ => return None,
    })
}
