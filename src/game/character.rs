//! Character State
//!
//! Turns one tick of input into a proposal for one fighter. Proposing is
//! pure; the state only changes when the match loop commits the intent
//! after reconciliation.
//!
//! Priority, highest first:
//! 1. An attack in progress plays out until its last frame, which always
//!    returns the fighter to idle.
//! 2. `Attack` starts an attack. The character does not move.
//! 3. `Jump` while grounded requests a velocity impulse.
//! 4. Left / right runs (or dashes). Ignored while airborne.
//! 5. Otherwise idle.

use serde::{Deserialize, Serialize};

use crate::core::movement::{Action, HorizontalMovement, VerticalMovement};
use crate::core::vec2::Vec2;
use crate::game::asset::{AnimationAsset, CharacterAsset};
use crate::game::changes::{SpriteChanges, TextureChange};
use crate::game::config::MatchConfig;
use crate::game::state::CharacterId;
use crate::input::InputUpdate;
use crate::physics::PhysicsUpdate;
use crate::render::Sprite;

/// Upward speed below which a grounded body counts as landed (px/s).
const LANDING_SPEED: f32 = 1.0;

/// Discrete phase of a fighter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharacterPhase {
    /// Standing (or falling) without intent
    #[default]
    Idle,
    /// Moving horizontally
    Running,
    /// Attack animation playing
    Attacking,
}

/// What a fighter wants to happen this tick.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacterIntent {
    /// Phase after commit
    pub phase: CharacterPhase,
    /// Proposed sprite mutation
    pub changes: SpriteChanges,
    /// One-shot velocity for the physics body (px/s)
    pub jump: Option<Vec2>,
    /// Facing after commit
    pub facing_left: bool,
}

/// Per-fighter state.
#[derive(Clone, Debug)]
pub struct CharacterState {
    /// Unique id within the match
    id: CharacterId,
    /// Animations
    asset: CharacterAsset,
    /// Current phase
    phase: CharacterPhase,
    /// Facing left (sprite mirrored)
    facing_left: bool,
    /// Airborne after a jump
    is_jumping: bool,
}

impl CharacterState {
    /// Create an idle fighter.
    pub fn new(id: CharacterId, asset: CharacterAsset, facing_left: bool) -> Self {
        Self {
            id,
            asset,
            phase: CharacterPhase::Idle,
            facing_left,
            is_jumping: false,
        }
    }

    /// Character id.
    pub fn id(&self) -> &CharacterId {
        &self.id
    }

    /// Animations of this fighter.
    pub fn asset(&self) -> &CharacterAsset {
        &self.asset
    }

    /// Current phase.
    pub fn phase(&self) -> CharacterPhase {
        self.phase
    }

    /// Check if facing left.
    pub fn facing_left(&self) -> bool {
        self.facing_left
    }

    /// Check if airborne after a jump.
    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    /// Check if an attack is in progress.
    pub fn is_attacking(&self) -> bool {
        self.phase == CharacterPhase::Attacking
    }

    /// Check if `frame` of the attack can land a hit.
    pub fn is_in_damage_frame(&self, frame: usize) -> bool {
        self.is_attacking() && self.asset.attack.damage_frames.contains(&frame)
    }

    /// Idle texture at frame zero, used when a sprite plays nothing.
    pub fn idle_texture(&self) -> TextureChange {
        self.asset.idle.texture_change()
    }

    /// Texture for `animation`, keeping the frame if it is already showing.
    fn texture_for(animation: &AnimationAsset, before: &SpriteChanges) -> TextureChange {
        match &before.texture {
            Some(t) if t.animation_key == animation.animation_key => {
                animation.texture_change_at(t.animation_frame)
            }
            _ => animation.texture_change(),
        }
    }

    fn attack_finished(&self, sprite: &dyn Sprite) -> bool {
        sprite.current_animation() == Some(self.asset.attack.animation.animation_key.as_str())
            && sprite.is_last_frame()
    }

    /// Build this tick's intent from input and the sprite as it is now.
    pub fn propose(&self, input: Option<&InputUpdate>, sprite: &dyn Sprite, config: &MatchConfig) -> CharacterIntent {
        let before = SpriteChanges::from_sprite(sprite, &self.idle_texture());
        let mut intent = CharacterIntent {
            phase: CharacterPhase::Idle,
            changes: SpriteChanges {
                texture: Some(Self::texture_for(&self.asset.idle, &before)),
                ..before.clone()
            },
            jump: None,
            facing_left: self.facing_left,
        };

        if self.is_attacking() {
            if self.attack_finished(sprite) {
                // Back to idle for one tick; a held attack starts over on the next.
                return intent;
            }
            intent.phase = CharacterPhase::Attacking;
            intent.changes.texture = Some(Self::texture_for(&self.asset.attack.animation, &before));
            return intent;
        }

        let Some(input) = input else {
            return intent;
        };

        if input.has_action(Action::Attack) {
            intent.phase = CharacterPhase::Attacking;
            intent.changes.texture = Some(self.asset.attack.animation.texture_change());
            return intent;
        }

        if input.vertical == VerticalMovement::Jump && !self.is_jumping {
            intent.jump = Some(Vec2::new(
                input.horizontal.sign() * config.jump_horizontal_speed,
                -config.jump_speed,
            ));
            if input.horizontal != HorizontalMovement::Stationary {
                intent.facing_left = input.horizontal == HorizontalMovement::Left;
            }
            return intent;
        }

        if self.is_jumping {
            return intent;
        }

        if input.horizontal != HorizontalMovement::Stationary {
            let step = if input.has_action(Action::Dash) {
                config.dash_step
            } else {
                config.run_step
            };
            intent.phase = CharacterPhase::Running;
            intent.changes.position = before.position.offset_x(input.horizontal.sign() * step);
            intent.changes.texture = Some(Self::texture_for(&self.asset.run, &before));
            intent.facing_left = input.horizontal == HorizontalMovement::Left;
        }
        intent
    }

    /// Adopt a reconciled intent.
    pub fn commit(&mut self, intent: &CharacterIntent) {
        self.phase = intent.phase;
        self.facing_left = intent.facing_left;
        if intent.jump.is_some() {
            self.is_jumping = true;
        }
    }

    /// Clear the jump flag once the body is back on the ground.
    ///
    /// Returns true on the tick the fighter lands.
    pub fn observe_physics(&mut self, update: &PhysicsUpdate) -> bool {
        if self.is_jumping && update.grounded && update.velocity.y >= -LANDING_SPEED {
            self.is_jumping = false;
            return true;
        }
        false
    }
}
