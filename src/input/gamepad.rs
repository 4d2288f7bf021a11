//! Gamepad source.
//!
//! Reads the left stick every tick and feeds it through the
//! [`StickClassifier`]; buttons map to actions. Held buttons are gated by a
//! [`Debounce`] so one press does not fire the same action on every tick.

use super::debounce::Debounce;
use super::device::{ButtonIndex, DeviceContext, DeviceEvent, ListenerId, ListenerTopic};
use super::stick::StickClassifier;
use super::{DeviceKind, InputError, InputSource, InputUpdate};
use crate::core::movement::{Action, HorizontalMovement, MovementStyle, VerticalMovement};
use crate::core::vec2::Vec2;

/// Button that attacks.
pub const BUTTON_ATTACK: ButtonIndex = 0;

/// Button that toggles pause.
pub const BUTTON_START: ButtonIndex = 9;

/// Stick y below this is a jump (y is down-positive).
pub const JUMP_THRESHOLD: f32 = -0.9;

/// Resolve a button index to its action.
pub fn action_for_button(button: ButtonIndex) -> Result<Action, InputError> {
    match button {
        BUTTON_ATTACK => Ok(Action::Attack),
        BUTTON_START => Ok(Action::Start),
        _ => Err(InputError::UnmappedInput {
            device: DeviceKind::Gamepad,
            code: button as u32,
        }),
    }
}

/// Gamepad input source.
pub struct GamepadSource {
    buttons: Vec<ButtonIndex>,
    bindings: Vec<(ButtonIndex, Action)>,
    classifier: StickClassifier,
    gate: Debounce,
    listener: Option<ListenerId>,
    connected: bool,
    start_pressed: bool,
}

impl Default for GamepadSource {
    fn default() -> Self {
        Self::new(Debounce::default(), StickClassifier::default())
    }
}

impl GamepadSource {
    /// Gamepad with the default buttons (0 attack, 9 start).
    pub fn new(gate: Debounce, classifier: StickClassifier) -> Self {
        Self::with_buttons(vec![BUTTON_ATTACK, BUTTON_START], gate, classifier)
    }

    /// Gamepad with a custom button list. Indices are validated by `configure`.
    pub fn with_buttons(buttons: Vec<ButtonIndex>, gate: Debounce, classifier: StickClassifier) -> Self {
        Self {
            buttons,
            bindings: Vec::new(),
            classifier,
            gate,
            listener: None,
            connected: false,
            start_pressed: false,
        }
    }

    /// Check if a pad is attached and readable.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn collect_edges(&mut self, devices: &mut DeviceContext) {
        let Some(listener) = self.listener else {
            return;
        };
        for event in devices.drain(listener) {
            match event {
                DeviceEvent::GamepadConnected => self.connected = true,
                DeviceEvent::GamepadDisconnected => {
                    self.connected = false;
                    self.classifier.clear();
                    self.gate.reset();
                }
                DeviceEvent::ButtonDown(button) => {
                    if self.bindings.contains(&(button, Action::Start)) {
                        self.start_pressed = true;
                    }
                }
                _ => {}
            }
        }
    }

    /// Decode a stick position and its movement style.
    pub fn stick_to_movement(stick: Vec2, style: MovementStyle) -> (HorizontalMovement, VerticalMovement, Option<Action>) {
        let horizontal = HorizontalMovement::from_axis(stick.x);
        let vertical = if stick.y < JUMP_THRESHOLD {
            VerticalMovement::Jump
        } else {
            VerticalMovement::Stationary
        };
        let dash = (style == MovementStyle::Dash).then_some(Action::Dash);
        (horizontal, vertical, dash)
    }
}

impl InputSource for GamepadSource {
    fn name(&self) -> &str {
        "gamepad"
    }

    fn configure(&mut self, devices: &mut DeviceContext) -> Result<(), InputError> {
        let bindings = self
            .buttons
            .iter()
            .map(|&b| action_for_button(b).map(|a| (b, a)))
            .collect::<Result<Vec<_>, _>>()?;

        self.remove_from(devices);
        self.bindings = bindings;
        self.listener = Some(devices.add_listener(ListenerTopic::Gamepad));
        // A pad plugged in before we attached never sends a connect edge
        self.connected = devices.gamepad().is_some();
        Ok(())
    }

    fn remove_from(&mut self, devices: &mut DeviceContext) {
        if let Some(listener) = self.listener.take() {
            devices.remove_listener(listener);
        }
        self.connected = false;
        self.start_pressed = false;
    }

    fn update(&mut self, devices: &mut DeviceContext, time: f64, _delta: f64) -> Option<InputUpdate> {
        self.listener?;
        self.collect_edges(devices);
        if !self.connected {
            return None;
        }
        let pad = devices.gamepad()?;

        let stick = pad.left_stick;
        let style = self.classifier.push(stick);
        let (horizontal, vertical, dash) = Self::stick_to_movement(stick, style);

        let mut update = InputUpdate::new(horizontal, vertical, dash, time);
        for &(button, action) in &self.bindings {
            if action != Action::Start && pad.is_button_down(button) {
                update.actions.insert(action);
            }
        }
        if std::mem::take(&mut self.start_pressed) {
            update.actions.insert(Action::Start);
        }

        if !self.gate.admit(&update) {
            update.actions.clear();
        }
        Some(update)
    }
}
