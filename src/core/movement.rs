//! Movement Vocabulary
//!
//! Discrete intents every input source decodes into, and the movement
//! styles the stick classifier derives from them.

use serde::{Deserialize, Serialize};

/// Direction a character is asked to move along the ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum HorizontalMovement {
    /// Move toward negative x
    Left,
    /// Move toward positive x
    Right,
    /// No horizontal intent
    #[default]
    Stationary,
}

impl HorizontalMovement {
    /// Sign of the movement along x (-1, 0, +1).
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            HorizontalMovement::Left => -1.0,
            HorizontalMovement::Right => 1.0,
            HorizontalMovement::Stationary => 0.0,
        }
    }

    /// Classify a raw horizontal axis value by rounding to the nearest integer.
    pub fn from_axis(x: f32) -> Self {
        let rounded = x.round();
        if rounded < 0.0 {
            HorizontalMovement::Left
        } else if rounded > 0.0 {
            HorizontalMovement::Right
        } else {
            HorizontalMovement::Stationary
        }
    }
}

/// Vertical intent. Only jumping is expressible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum VerticalMovement {
    /// Start a jump
    Jump,
    /// No vertical intent
    #[default]
    Stationary,
}

/// Discrete action intents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Quick directional burst (derived from the stick)
    Dash,
    /// Basic attack
    Attack,
    /// Special move
    Special,
    /// Start / pause toggle
    Start,
    /// Explicit "nothing pressed"
    None,
}

/// How a horizontal deflection should be carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementStyle {
    /// Sustained hold
    Run,
    /// Direction, neutral, same direction within the buffer window
    Dash,
    /// Stick at rest
    Stationary,
}
