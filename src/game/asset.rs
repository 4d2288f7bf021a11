//! Character Assets
//!
//! Data records describing a fighter's animations. Loaded from JSON or built
//! in code; the runtime only reads them.

use serde::{Deserialize, Serialize};

use crate::game::changes::TextureChange;

/// One animation on one texture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationAsset {
    /// Texture (sprite sheet) key
    pub texture_key: String,
    /// Animation key registered with the renderer
    pub animation_key: String,
    /// Number of frames
    pub frame_count: usize,
    /// Frames per second
    pub frame_rate: f32,
    /// Loop when finished
    #[serde(default)]
    pub repeat: bool,
}

impl AnimationAsset {
    /// Texture change that starts this animation at its first frame.
    pub fn texture_change(&self) -> TextureChange {
        self.texture_change_at(0)
    }

    /// Texture change positioned at a given frame.
    pub fn texture_change_at(&self, frame: usize) -> TextureChange {
        TextureChange {
            texture_key: self.texture_key.clone(),
            animation_key: self.animation_key.clone(),
            animation_frame: frame,
        }
    }

    /// Index of the final frame.
    pub fn last_frame(&self) -> usize {
        self.frame_count.saturating_sub(1)
    }
}

/// Attack animation plus the frames that can land a hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackAsset {
    /// The attack animation
    #[serde(flatten)]
    pub animation: AnimationAsset,
    /// Frame indices during which a hit registers
    pub damage_frames: Vec<usize>,
}

/// Everything the runtime needs to animate one fighter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterAsset {
    /// Display name
    pub name: String,
    /// Standing still
    pub idle: AnimationAsset,
    /// Running
    pub run: AnimationAsset,
    /// Attacking
    pub attack: AttackAsset,
}

impl CharacterAsset {
    /// Parse an asset descriptor from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Every animation of this asset.
    pub fn animations(&self) -> [&AnimationAsset; 3] {
        [&self.idle, &self.run, &self.attack.animation]
    }

    /// Look up an animation by key.
    pub fn animation(&self, animation_key: &str) -> Option<&AnimationAsset> {
        self.animations()
            .into_iter()
            .find(|a| a.animation_key == animation_key)
    }
}

/// Built-in fighters for the demo binary, benches and tests.
pub mod fixtures {
    use super::*;

    /// The witch with `witch_*` textures.
    pub fn witch() -> CharacterAsset {
        witch_skin("witch")
    }

    /// The witch with textures named `<skin>_idle`, `<skin>_run`, `<skin>_attack`.
    pub fn witch_skin(skin: &str) -> CharacterAsset {
        let animation = |name: &str, frame_count, frame_rate, repeat| AnimationAsset {
            texture_key: format!("{skin}_{name}"),
            animation_key: name.to_string(),
            frame_count,
            frame_rate,
            repeat,
        };
        CharacterAsset {
            name: skin.to_string(),
            idle: animation("idle", 6, 8.0, true),
            run: animation("run", 8, 12.0, true),
            attack: AttackAsset {
                animation: animation("attack", 9, 18.0, false),
                damage_frames: vec![6, 7, 8],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_json() {
        let json = r#"{
            "name": "blue witch",
            "idle":   { "texture_key": "b_idle", "animation_key": "idle", "frame_count": 6, "frame_rate": 8, "repeat": true },
            "run":    { "texture_key": "b_run", "animation_key": "run", "frame_count": 8, "frame_rate": 12, "repeat": true },
            "attack": { "texture_key": "b_attack", "animation_key": "attack", "frame_count": 9, "frame_rate": 9,
                        "damage_frames": [6, 7, 8] }
        }"#;

        let asset = CharacterAsset::from_json_str(json).unwrap();
        assert_eq!(asset.attack.damage_frames, vec![6, 7, 8]);
        assert!(!asset.attack.animation.repeat);
        assert_eq!(asset.attack.animation.last_frame(), 8);
    }

    #[test]
    fn test_witch_skin_names_textures() {
        let blue = fixtures::witch_skin("blue_witch");
        assert_eq!(blue.idle.texture_key, "blue_witch_idle");
        assert_eq!(blue.attack.animation.texture_key, "blue_witch_attack");
        assert_eq!(blue.attack.animation.animation_key, fixtures::witch().attack.animation.animation_key);
    }

    #[test]
    fn test_animation_lookup() {
        let asset = fixtures::witch();
        assert_eq!(asset.animation("run").unwrap().texture_key, "witch_run");
        assert!(asset.animation("fly").is_none());
    }

    #[test]
    fn test_texture_change_starts_at_zero() {
        let asset = fixtures::witch();
        let change = asset.idle.texture_change();
        assert_eq!(change.animation_frame, 0);
        assert_eq!(change.animation_key, "idle");
        assert_eq!(asset.idle.texture_change_at(3).animation_frame, 3);
    }
}
