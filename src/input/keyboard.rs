//! Keyboard source.
//!
//! Fixed key set: W jump, S vertical neutral, A left, D right, J attack,
//! ESC start. Movement and attack are read from held keys; start fires on
//! the key-down edge only.

use super::device::{keys, DeviceContext, DeviceEvent, KeyCode, ListenerId, ListenerTopic};
use super::{DeviceKind, InputError, InputSource, InputUpdate};
use crate::core::movement::{Action, HorizontalMovement, VerticalMovement};

/// Default key set, in evaluation order.
pub const DEFAULT_KEYS: [KeyCode; 6] = [keys::W, keys::A, keys::S, keys::D, keys::J, keys::ESC];

/// What a key contributes to an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySlot {
    /// Sets the vertical intent
    Vertical(VerticalMovement),
    /// Sets (or cancels) the horizontal intent
    Horizontal(HorizontalMovement),
    /// Adds an action
    Action(Action),
}

/// A key code resolved to its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBinding {
    /// Raw key code
    pub code: KeyCode,
    /// Slot filled while held
    pub slot: KeySlot,
}

impl KeyBinding {
    /// Resolve a key code.
    pub fn for_code(code: KeyCode) -> Result<Self, InputError> {
        let slot = match code {
            keys::W => KeySlot::Vertical(VerticalMovement::Jump),
            keys::S => KeySlot::Vertical(VerticalMovement::Stationary),
            keys::A => KeySlot::Horizontal(HorizontalMovement::Left),
            keys::D => KeySlot::Horizontal(HorizontalMovement::Right),
            keys::J => KeySlot::Action(Action::Attack),
            keys::ESC => KeySlot::Action(Action::Start),
            _ => {
                return Err(InputError::UnmappedInput {
                    device: DeviceKind::Keyboard,
                    code,
                })
            }
        };
        Ok(Self { code, slot })
    }
}

/// Keyboard input source.
pub struct KeyboardSource {
    codes: Vec<KeyCode>,
    bindings: Vec<KeyBinding>,
    listener: Option<ListenerId>,
    start_pressed: bool,
}

impl Default for KeyboardSource {
    fn default() -> Self {
        Self::with_keys(DEFAULT_KEYS.to_vec())
    }
}

impl KeyboardSource {
    /// Keyboard with the default key set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyboard with a custom key list. Codes are validated by `configure`.
    pub fn with_keys(codes: Vec<KeyCode>) -> Self {
        Self {
            codes,
            bindings: Vec::new(),
            listener: None,
            start_pressed: false,
        }
    }

    /// Check if the source is attached to a device context.
    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    fn collect_edges(&mut self, devices: &mut DeviceContext) {
        let Some(listener) = self.listener else {
            return;
        };
        for event in devices.drain(listener) {
            if let DeviceEvent::KeyDown(code) = event {
                let is_start = self
                    .bindings
                    .iter()
                    .any(|b| b.code == code && b.slot == KeySlot::Action(Action::Start));
                if is_start {
                    self.start_pressed = true;
                }
            }
        }
    }

    /// Fold the held bindings into an update.
    ///
    /// Opposing directions cancel: the first held direction wins, the second
    /// resets the slot to stationary.
    pub fn keys_to_update(held: &[KeyBinding], start_pressed: bool, time: f64) -> Option<InputUpdate> {
        if held.is_empty() && !start_pressed {
            return None;
        }

        let mut update = InputUpdate::idle(time);
        for binding in held {
            match binding.slot {
                KeySlot::Vertical(vertical) => update.vertical = vertical,
                KeySlot::Horizontal(horizontal) => {
                    update.horizontal = if update.horizontal == HorizontalMovement::Stationary {
                        horizontal
                    } else {
                        HorizontalMovement::Stationary
                    };
                }
                KeySlot::Action(Action::Start) => {}
                KeySlot::Action(action) => {
                    update.actions.insert(action);
                }
            }
        }
        if start_pressed {
            update.actions.insert(Action::Start);
        }
        Some(update)
    }
}

impl InputSource for KeyboardSource {
    fn name(&self) -> &str {
        "keyboard"
    }

    fn configure(&mut self, devices: &mut DeviceContext) -> Result<(), InputError> {
        let bindings = self
            .codes
            .iter()
            .map(|&code| KeyBinding::for_code(code))
            .collect::<Result<Vec<_>, _>>()?;

        self.remove_from(devices);
        self.bindings = bindings;
        self.listener = Some(devices.add_listener(ListenerTopic::Keyboard));
        Ok(())
    }

    fn remove_from(&mut self, devices: &mut DeviceContext) {
        if let Some(listener) = self.listener.take() {
            devices.remove_listener(listener);
        }
        self.start_pressed = false;
    }

    fn update(&mut self, devices: &mut DeviceContext, time: f64, _delta: f64) -> Option<InputUpdate> {
        if !self.is_attached() {
            return None;
        }
        self.collect_edges(devices);

        let held: Vec<KeyBinding> = self
            .bindings
            .iter()
            .filter(|b| devices.is_key_down(b.code))
            .copied()
            .collect();

        let update = Self::keys_to_update(&held, self.start_pressed, time);
        self.start_pressed = false;
        update
    }
}
