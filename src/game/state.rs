//! Match State Definitions
//!
//! Everything one match owns: fighters, their input sources, the device
//! context and the physics world. Uses BTreeMap so every pass over the
//! fighters runs in the same order.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::hash::{CommitDigest, CommitHasher};
use crate::core::movement::Action;
use crate::core::vec2::Vec2;
use crate::game::asset::CharacterAsset;
use crate::game::changes::SpriteChanges;
use crate::game::character::CharacterState;
use crate::game::config::{ConfigError, MatchConfig};
use crate::input::device::{DeviceEvent, ListenerId, ListenerTopic};
use crate::input::gamepad::action_for_button;
use crate::input::keyboard::{KeyBinding, KeySlot};
use crate::input::{DeviceContext, InputError, InputSource, InputUpdate};
use crate::physics::{PhysicsBridge, PhysicsError};
use crate::render::Sprite;

/// Body id of the floor.
pub const GROUND_ID: &str = "ground";

// =============================================================================
// CHARACTER ID
// =============================================================================

/// Unique fighter identifier.
///
/// Joins character state, sprite, input source and physics body.
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CharacterId(String);

impl CharacterId {
    /// Create from a name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// FIGHTER
// =============================================================================

/// A fighter: logic plus the sprite it drives.
pub struct Fighter {
    /// Character logic
    pub state: CharacterState,
    /// Visible sprite
    pub sprite: Box<dyn Sprite>,
}

// =============================================================================
// MATCH PHASE
// =============================================================================

/// Current phase of the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Active gameplay
    #[default]
    Playing,
    /// Frozen; only Start is honoured
    Paused,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Match setup errors.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// A fighter with this id is already registered.
    #[error("duplicate character: {0}")]
    DuplicateCharacter(CharacterId),

    /// No fighter with this id.
    #[error("unknown character: {0}")]
    UnknownCharacter(CharacterId),

    /// Input binding error.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Physics world error.
    #[error("physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// MATCH CONTEXT
// =============================================================================

/// Complete state of a match.
pub struct MatchContext {
    /// Match identifier
    pub match_id: Uuid,

    /// Tunables
    pub config: MatchConfig,

    /// Ticks run so far (paused ticks included)
    pub tick: u32,

    /// Current phase
    pub phase: MatchPhase,

    /// Raw device state shared by all sources
    pub devices: DeviceContext,

    /// Physics world
    pub physics: PhysicsBridge,

    /// Fighters by id
    pub(crate) fighters: BTreeMap<CharacterId, Fighter>,

    /// Input source per fighter
    pub(crate) sources: BTreeMap<CharacterId, Box<dyn InputSource>>,

    /// Time of the last pause toggle (ms)
    last_pause_toggle: Option<f64>,

    /// Listeners watching for Start while paused
    pause_watch: Vec<ListenerId>,

    /// Recent distinct inputs, newest first
    input_log: VecDeque<(CharacterId, InputUpdate)>,

    /// Digest over every committed write
    hasher: CommitHasher,
}

impl MatchContext {
    /// Create a match with an empty roster and a floor.
    pub fn new(config: MatchConfig) -> Result<Self, MatchError> {
        config.validate()?;

        let mut physics = PhysicsBridge::new(config.gravity, config.world_scale);
        let ground = config.ground;
        physics.create_box(
            ground.x,
            ground.y,
            ground.width,
            ground.height,
            false,
            CharacterId::new(GROUND_ID),
        )?;

        let match_id = Uuid::new_v4();
        info!(%match_id, "Match created");

        Ok(Self {
            match_id,
            config,
            tick: 0,
            phase: MatchPhase::Playing,
            devices: DeviceContext::new(),
            physics,
            fighters: BTreeMap::new(),
            sources: BTreeMap::new(),
            last_pause_toggle: None,
            pause_watch: Vec::new(),
            input_log: VecDeque::new(),
            hasher: CommitHasher::for_match(),
        })
    }

    /// Add a fighter at `spawn` with a dynamic physics body.
    pub fn add_character(
        &mut self,
        id: CharacterId,
        asset: CharacterAsset,
        spawn: Vec2,
        facing_left: bool,
        mut sprite: Box<dyn Sprite>,
    ) -> Result<(), MatchError> {
        if self.fighters.contains_key(&id) {
            return Err(MatchError::DuplicateCharacter(id));
        }
        self.physics.create_box(
            spawn.x,
            spawn.y,
            self.config.character_width,
            self.config.character_height,
            true,
            id.clone(),
        )?;

        sprite.set_position(spawn);
        sprite.set_flip_x(facing_left);
        info!(character = %id, name = %asset.name, %spawn, "Character added");

        let state = CharacterState::new(id.clone(), asset, facing_left);
        self.fighters.insert(id, Fighter { state, sprite });
        Ok(())
    }

    /// Bind an input source to a fighter, replacing any previous one.
    ///
    /// The source is attached immediately unless the match is paused.
    pub fn attach_input(&mut self, id: &CharacterId, mut source: Box<dyn InputSource>) -> Result<(), MatchError> {
        if !self.fighters.contains_key(id) {
            return Err(MatchError::UnknownCharacter(id.clone()));
        }
        if self.phase == MatchPhase::Playing {
            source.configure(&mut self.devices)?;
        }
        debug!(character = %id, source = source.name(), "Input attached");
        if let Some(mut previous) = self.sources.insert(id.clone(), source) {
            previous.remove_from(&mut self.devices);
        }
        Ok(())
    }

    /// Drop a fighter mid-match. Returns false if it was not registered.
    pub fn remove_character(&mut self, id: &CharacterId) -> bool {
        if let Some(mut source) = self.sources.remove(id) {
            source.remove_from(&mut self.devices);
        }
        self.physics.remove_body(id);
        let removed = self.fighters.remove(id).is_some();
        if removed {
            info!(character = %id, "Character removed");
        }
        removed
    }

    /// Get a fighter by id.
    pub fn fighter(&self, id: &CharacterId) -> Option<&Fighter> {
        self.fighters.get(id)
    }

    /// Get a fighter mutably by id.
    pub fn fighter_mut(&mut self, id: &CharacterId) -> Option<&mut Fighter> {
        self.fighters.get_mut(id)
    }

    /// Ids of all fighters, sorted.
    pub fn character_ids(&self) -> impl Iterator<Item = &CharacterId> {
        self.fighters.keys()
    }

    /// Check if the match is paused.
    pub fn is_paused(&self) -> bool {
        self.phase == MatchPhase::Paused
    }

    /// Flip between playing and paused.
    ///
    /// Toggles closer together than `pause_debounce_ms` are ignored and
    /// return `None`. Pausing detaches every source from the devices and
    /// leaves only a Start watcher; resuming attaches the sources again.
    pub fn toggle_pause(&mut self, time: f64) -> Result<Option<MatchPhase>, MatchError> {
        if let Some(last) = self.last_pause_toggle {
            if time - last < self.config.pause_debounce_ms {
                debug!(time, last, "Pause toggle debounced");
                return Ok(None);
            }
        }
        self.last_pause_toggle = Some(time);

        self.phase = match self.phase {
            MatchPhase::Playing => {
                for source in self.sources.values_mut() {
                    source.remove_from(&mut self.devices);
                }
                self.pause_watch = vec![
                    self.devices.add_listener(ListenerTopic::Keyboard),
                    self.devices.add_listener(ListenerTopic::Gamepad),
                ];
                MatchPhase::Paused
            }
            MatchPhase::Paused => {
                for listener in self.pause_watch.drain(..) {
                    self.devices.remove_listener(listener);
                }
                for source in self.sources.values_mut() {
                    source.configure(&mut self.devices)?;
                }
                MatchPhase::Playing
            }
        };
        info!(match_id = %self.match_id, phase = ?self.phase, "Pause toggled");
        Ok(Some(self.phase))
    }

    /// Drain the pause watcher. True if Start went down since the last call.
    pub(crate) fn start_pressed_while_paused(&mut self) -> bool {
        let mut pressed = false;
        for &listener in &self.pause_watch {
            for event in self.devices.drain(listener) {
                pressed |= match event {
                    DeviceEvent::KeyDown(code) => KeyBinding::for_code(code)
                        .is_ok_and(|b| b.slot == KeySlot::Action(Action::Start)),
                    DeviceEvent::ButtonDown(button) => action_for_button(button) == Ok(Action::Start),
                    _ => false,
                };
            }
        }
        pressed
    }

    /// Record an input if it differs from that fighter's latest entry.
    pub fn record_input(&mut self, id: &CharacterId, update: &InputUpdate) {
        let latest = self.input_log.iter().find(|(logged, _)| logged == id);
        if matches!(latest, Some((_, last)) if last == update) {
            return;
        }
        self.input_log.push_front((id.clone(), update.clone()));
        self.input_log.truncate(self.config.input_log_len);
    }

    /// Recent distinct inputs, newest first.
    pub fn input_log(&self) -> impl Iterator<Item = &(CharacterId, InputUpdate)> {
        self.input_log.iter()
    }

    /// Fold a committed write into the digest.
    pub(crate) fn record_commit(&mut self, id: &CharacterId, changes: &SpriteChanges) {
        self.hasher.update_u32(self.tick);
        self.hasher.update_str(id.as_str());
        self.hasher.update_vec2(changes.position);
        self.hasher.update_f32(changes.angle);
        match &changes.texture {
            Some(texture) => {
                self.hasher.update_bool(true);
                self.hasher.update_str(&texture.texture_key);
                self.hasher.update_str(&texture.animation_key);
                self.hasher.update_u32(texture.animation_frame as u32);
            }
            None => self.hasher.update_bool(false),
        }
        self.hasher.end_commit();
    }

    /// Number of writes so far.
    pub fn commit_count(&self) -> u64 {
        self.hasher.commit_count()
    }

    /// Digest over every write so far.
    pub fn commit_digest(&self) -> CommitDigest {
        self.hasher.clone().finalize()
    }
}

// =============================================================================
// TESTS
// =============================================================================
