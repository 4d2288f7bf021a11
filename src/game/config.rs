//! Match Configuration
//!
//! Every tunable of a match in one serde record. Missing JSON fields fall
//! back to the defaults below.

use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::input::debounce::{Debounce, DEFAULT_WINDOW_MS};
use crate::input::device::{ButtonIndex, KeyCode};
use crate::input::gamepad::{GamepadSource, BUTTON_ATTACK, BUTTON_START};
use crate::input::keyboard::{KeyboardSource, DEFAULT_KEYS};
use crate::input::stick::StickClassifier;
use crate::physics::{DEFAULT_GRAVITY, DEFAULT_WORLD_SCALE};
use crate::TICK_RATE;

/// Accepted range of the input debounce window (ms).
pub const INPUT_DEBOUNCE_RANGE: (f64, f64) = (20.0, 50.0);

/// Static floor box, presentation units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundConfig {
    /// Centre x
    pub x: f32,
    /// Centre y
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            x: 400.0,
            y: 576.0,
            width: 800.0,
            height: 48.0,
        }
    }
}

/// Configuration for a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Horizontal step per tick while running (px)
    pub run_step: f32,
    /// Horizontal step per tick while dashing (px)
    pub dash_step: f32,
    /// Upward jump speed (px/s)
    pub jump_speed: f32,
    /// Horizontal speed carried into a jump (px/s)
    pub jump_horizontal_speed: f32,
    /// Downward gravity (m/s²)
    pub gravity: f32,
    /// Pixels per metre
    pub world_scale: f32,
    /// Character box width (px)
    pub character_width: f32,
    /// Character box height (px)
    pub character_height: f32,
    /// Floor
    pub ground: GroundConfig,
    /// Gamepad action debounce window (ms)
    pub input_debounce_ms: f64,
    /// Minimum time between pause toggles (ms)
    pub pause_debounce_ms: f64,
    /// Stick samples kept for dash detection
    pub stick_buffer: usize,
    /// Recent inputs kept in the match log
    pub input_log_len: usize,
    /// Keyboard key codes to bind
    pub keyboard_keys: Vec<KeyCode>,
    /// Gamepad button indices to bind
    pub gamepad_buttons: Vec<ButtonIndex>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            run_step: 1.2,
            dash_step: 3.6,
            jump_speed: 450.0,
            jump_horizontal_speed: 300.0,
            gravity: DEFAULT_GRAVITY,
            world_scale: DEFAULT_WORLD_SCALE,
            character_width: 30.0,
            character_height: 70.0,
            ground: GroundConfig::default(),
            input_debounce_ms: DEFAULT_WINDOW_MS,
            pause_debounce_ms: 2000.0,
            stick_buffer: TICK_RATE as usize,
            input_log_len: 14,
            keyboard_keys: DEFAULT_KEYS.to_vec(),
            gamepad_buttons: vec![BUTTON_ATTACK, BUTTON_START],
        }
    }
}

impl MatchConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Keyboard source bound to `keyboard_keys`.
    pub fn keyboard_source(&self) -> KeyboardSource {
        KeyboardSource::with_keys(self.keyboard_keys.clone())
    }

    /// Gamepad source bound to `gamepad_buttons`, gated and buffered per this config.
    pub fn gamepad_source(&self) -> GamepadSource {
        GamepadSource::with_buttons(
            self.gamepad_buttons.clone(),
            Debounce::new(self.input_debounce_ms),
            StickClassifier::new(self.stick_buffer),
        )
    }

    /// Nominal tick length (ms).
    pub fn tick_ms(&self) -> f64 {
        1000.0 / f64::from(self.tick_rate.max(1))
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (low, high) = INPUT_DEBOUNCE_RANGE;
        if !(low..=high).contains(&self.input_debounce_ms) {
            return Err(ConfigError::Invalid {
                field: "input_debounce_ms",
                reason: format!("{} not in {low}..={high}", self.input_debounce_ms),
            });
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_rate",
                reason: "must be positive".into(),
            });
        }
        if self.world_scale <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "world_scale",
                reason: "must be positive".into(),
            });
        }
        if self.character_width <= 0.0 || self.character_height <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "character_width/character_height",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON was malformed.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid config field {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// What is wrong
        reason: String,
    },
}
