//! Device Context
//!
//! Stand-in for the host's device layer: level state that sources poll, and
//! edge events delivered to registered listeners. Listeners only queue
//! events; the owning source drains its queue on its next `update`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::core::vec2::Vec2;

/// Raw keyboard key code.
pub type KeyCode = u32;

/// Raw gamepad button index.
pub type ButtonIndex = u8;

/// Key codes understood by the keyboard source.
pub mod keys {
    use super::KeyCode;

    /// Escape
    pub const ESC: KeyCode = 27;
    /// A
    pub const A: KeyCode = 65;
    /// D
    pub const D: KeyCode = 68;
    /// J
    pub const J: KeyCode = 74;
    /// S
    pub const S: KeyCode = 83;
    /// W
    pub const W: KeyCode = 87;
}

/// Edge event from a device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeviceEvent {
    /// Key went down
    KeyDown(KeyCode),
    /// Key went up
    KeyUp(KeyCode),
    /// A gamepad became available
    GamepadConnected,
    /// The gamepad went away
    GamepadDisconnected,
    /// Button went down
    ButtonDown(ButtonIndex),
    /// Button went up
    ButtonUp(ButtonIndex),
}

impl DeviceEvent {
    fn topic(&self) -> ListenerTopic {
        match self {
            DeviceEvent::KeyDown(_) | DeviceEvent::KeyUp(_) => ListenerTopic::Keyboard,
            _ => ListenerTopic::Gamepad,
        }
    }
}

/// Which family of events a listener receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerTopic {
    /// Key edges
    Keyboard,
    /// Connection and button edges
    Gamepad,
}

/// Handle returned when registering a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

struct Listener {
    topic: ListenerTopic,
    queue: VecDeque<DeviceEvent>,
}

/// Polled gamepad state.
#[derive(Clone, Debug, Default)]
pub struct GamepadState {
    /// Left stick deflection, each axis in [-1, 1], y down
    pub left_stick: Vec2,
    buttons: BTreeSet<ButtonIndex>,
}

impl GamepadState {
    /// Check if a button is held.
    pub fn is_button_down(&self, button: ButtonIndex) -> bool {
        self.buttons.contains(&button)
    }
}

/// Device state shared by all input sources of a match.
#[derive(Default)]
pub struct DeviceContext {
    keys_down: BTreeSet<KeyCode>,
    gamepad: Option<GamepadState>,
    listeners: BTreeMap<ListenerId, Listener>,
    next_listener: u64,
}

impl DeviceContext {
    /// Create an empty context (no keys down, no gamepad).
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Register an edge listener.
    pub fn add_listener(&mut self, topic: ListenerTopic) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, Listener { topic, queue: VecDeque::new() });
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Take every queued event for a listener.
    pub fn drain(&mut self, id: ListenerId) -> Vec<DeviceEvent> {
        self.listeners
            .get_mut(&id)
            .map(|l| l.queue.drain(..).collect())
            .unwrap_or_default()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn dispatch(&mut self, event: DeviceEvent) {
        let topic = event.topic();
        for listener in self.listeners.values_mut() {
            if listener.topic == topic {
                listener.queue.push_back(event);
            }
        }
    }

    // =========================================================================
    // Keyboard
    // =========================================================================

    /// Key pressed.
    pub fn press_key(&mut self, code: KeyCode) {
        if self.keys_down.insert(code) {
            self.dispatch(DeviceEvent::KeyDown(code));
        }
    }

    /// Key released.
    pub fn release_key(&mut self, code: KeyCode) {
        if self.keys_down.remove(&code) {
            self.dispatch(DeviceEvent::KeyUp(code));
        }
    }

    /// Check if a key is held.
    pub fn is_key_down(&self, code: KeyCode) -> bool {
        self.keys_down.contains(&code)
    }

    // =========================================================================
    // Gamepad
    // =========================================================================

    /// Plug in a gamepad (no-op if one is present).
    pub fn connect_gamepad(&mut self) {
        if self.gamepad.is_none() {
            self.gamepad = Some(GamepadState::default());
            self.dispatch(DeviceEvent::GamepadConnected);
        }
    }

    /// Unplug the gamepad.
    pub fn disconnect_gamepad(&mut self) {
        if self.gamepad.take().is_some() {
            self.dispatch(DeviceEvent::GamepadDisconnected);
        }
    }

    /// Current gamepad state, if connected.
    pub fn gamepad(&self) -> Option<&GamepadState> {
        self.gamepad.as_ref()
    }

    /// Move the left stick. Ignored without a gamepad.
    pub fn set_left_stick(&mut self, x: f32, y: f32) {
        if let Some(pad) = self.gamepad.as_mut() {
            pad.left_stick = Vec2::new(x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0));
        }
    }

    /// Button pressed. Ignored without a gamepad.
    pub fn press_button(&mut self, button: ButtonIndex) {
        let inserted = match self.gamepad.as_mut() {
            Some(pad) => pad.buttons.insert(button),
            None => false,
        };
        if inserted {
            self.dispatch(DeviceEvent::ButtonDown(button));
        }
    }

    /// Button released.
    pub fn release_button(&mut self, button: ButtonIndex) {
        let removed = match self.gamepad.as_mut() {
            Some(pad) => pad.buttons.remove(&button),
            None => false,
        };
        if removed {
            self.dispatch(DeviceEvent::ButtonUp(button));
        }
    }
}
