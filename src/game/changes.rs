//! Proposed Sprite Changes
//!
//! A [`SpriteChanges`] is what one authority would like the visible
//! character to look like after this tick. The reconciler decides which
//! proposal, if any, is committed.

use serde::{Deserialize, Serialize};

use crate::core::vec2::Vec2;
use crate::game::state::CharacterId;
use crate::physics::PhysicsUpdate;
use crate::render::Sprite;

/// Texture and animation a sprite should show.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureChange {
    /// Texture (sprite sheet) key
    pub texture_key: String,
    /// Animation key
    pub animation_key: String,
    /// Frame within the animation
    pub animation_frame: usize,
}

/// A proposed mutation of a character's sprite.
///
/// Two proposals are equal iff position, angle and texture all match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteChanges {
    /// Position in presentation units
    pub position: Vec2,
    /// Rotation (radians)
    pub angle: f32,
    /// Texture / animation, if any
    pub texture: Option<TextureChange>,
}

impl SpriteChanges {
    /// Create a new proposal.
    pub fn new(position: Vec2, angle: f32, texture: Option<TextureChange>) -> Self {
        Self { position, angle, texture }
    }

    /// Snapshot what a sprite currently shows.
    ///
    /// A sprite with no animation reports `fallback` (normally the idle
    /// animation) as its texture.
    pub fn from_sprite(sprite: &dyn Sprite, fallback: &TextureChange) -> Self {
        let texture = match sprite.current_animation() {
            Some(animation_key) => TextureChange {
                texture_key: sprite.texture_key().to_string(),
                animation_key: animation_key.to_string(),
                animation_frame: sprite.current_frame(),
            },
            None => fallback.clone(),
        };
        Self {
            position: sprite.position(),
            angle: sprite.angle(),
            texture: Some(texture),
        }
    }

    /// Check if position or angle differ.
    #[inline]
    pub fn pose_differs(&self, other: &Self) -> bool {
        self.position != other.position || self.angle != other.angle
    }

    /// Animation key, if a texture is set.
    pub fn animation_key(&self) -> Option<&str> {
        self.texture.as_ref().map(|t| t.animation_key.as_str())
    }
}

/// A proposal addressed to one character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterUpdate {
    /// Target character
    pub character_id: CharacterId,
    /// Time the proposal was made (ms)
    pub timestamp: f64,
    /// The proposal, or `None` for "nothing to say"
    pub changes: Option<SpriteChanges>,
}

impl CharacterUpdate {
    /// Create a new update.
    pub fn new(character_id: CharacterId, timestamp: f64, changes: Option<SpriteChanges>) -> Self {
        Self {
            character_id,
            timestamp,
            changes,
        }
    }

    /// Build the physics-driven proposal.
    ///
    /// Position and angle come from the physics step; the texture is the one
    /// already proposed by input logic for the same character. Physics never
    /// chooses an animation.
    pub fn merge_physics(physics: &PhysicsUpdate, texture: Option<TextureChange>) -> Self {
        Self {
            character_id: physics.character_id.clone(),
            timestamp: physics.timestamp,
            changes: Some(SpriteChanges::new(physics.position, physics.angle, texture)),
        }
    }
}
