//! Input Capture and Normalization
//!
//! Every device is decoded into the same [`InputUpdate`] vocabulary once per
//! tick. The match loop pulls from an [`InputSource`]; sources never push
//! into character state.
//!
//! ## Module Structure
//!
//! - `device`: level state and edge listeners of the raw devices
//! - `stick`: dash / run / stationary classification of the left stick
//! - `debounce`: acceptance-window gate for repeated updates
//! - `keyboard`, `gamepad`, `scripted`: the concrete sources

use std::collections::BTreeSet;
use std::fmt;
use serde::{Deserialize, Serialize};

use crate::core::movement::{Action, HorizontalMovement, VerticalMovement};

pub mod device;
pub mod stick;
pub mod debounce;
pub mod keyboard;
pub mod gamepad;
pub mod scripted;

pub use device::{ButtonIndex, DeviceContext, DeviceEvent, KeyCode, ListenerId};
pub use stick::StickClassifier;
pub use debounce::Debounce;
pub use keyboard::KeyboardSource;
pub use gamepad::GamepadSource;
pub use scripted::ScriptedSource;

// =============================================================================
// INPUT UPDATE
// =============================================================================

/// Normalized input for one tick.
///
/// Equality compares the intents only; `timestamp` is ignored so repeated
/// identical inputs can be recognised across ticks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputUpdate {
    /// Direction of travel
    pub horizontal: HorizontalMovement,
    /// Jump or nothing
    pub vertical: VerticalMovement,
    /// Actions held or fired this tick
    pub actions: BTreeSet<Action>,
    /// Time the update was produced (ms)
    pub timestamp: f64,
}

impl InputUpdate {
    /// Create a new update.
    pub fn new(
        horizontal: HorizontalMovement,
        vertical: VerticalMovement,
        actions: impl IntoIterator<Item = Action>,
        timestamp: f64,
    ) -> Self {
        Self {
            horizontal,
            vertical,
            actions: actions.into_iter().collect(),
            timestamp,
        }
    }

    /// An explicit "nothing held" update.
    pub fn idle(timestamp: f64) -> Self {
        Self::new(
            HorizontalMovement::Stationary,
            VerticalMovement::Stationary,
            [],
            timestamp,
        )
    }

    /// Copy with a different timestamp.
    pub fn at(&self, timestamp: f64) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    /// Check if an action is present.
    #[inline]
    pub fn has_action(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    /// Check if the update carries no intent at all.
    pub fn is_idle(&self) -> bool {
        self.horizontal == HorizontalMovement::Stationary
            && self.vertical == VerticalMovement::Stationary
            && self.actions.iter().all(|a| *a == Action::None)
    }
}

impl PartialEq for InputUpdate {
    fn eq(&self, other: &Self) -> bool {
        self.horizontal == other.horizontal
            && self.vertical == other.vertical
            && self.actions == other.actions
    }
}

impl Eq for InputUpdate {}

// =============================================================================
// INPUT SOURCE
// =============================================================================

/// A device reader polled once per tick.
pub trait InputSource {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Attach to the device context and validate bindings.
    ///
    /// Calling this again while attached replaces the previous listeners.
    fn configure(&mut self, devices: &mut DeviceContext) -> Result<(), InputError>;

    /// Detach all listeners. Safe to call more than once.
    fn remove_from(&mut self, devices: &mut DeviceContext);

    /// Produce this tick's update, or `None` when the device has nothing to say.
    fn update(&mut self, devices: &mut DeviceContext, time: f64, delta: f64) -> Option<InputUpdate>;
}

// =============================================================================
// ERRORS
// =============================================================================

/// Device family a binding belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    /// Keyboard key codes
    Keyboard,
    /// Gamepad button indices
    Gamepad,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Keyboard => write!(f, "key"),
            DeviceKind::Gamepad => write!(f, "gamepad button"),
        }
    }
}

/// Input configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// A configured key or button has no meaning in the movement vocabulary.
    #[error("unmapped {device} code {code}")]
    UnmappedInput {
        /// Device family
        device: DeviceKind,
        /// Raw code
        code: u32,
    },
}
