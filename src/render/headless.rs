//! Headless sprite.

use std::collections::BTreeMap;
use tracing::debug;

use super::Sprite;
use crate::core::vec2::Vec2;
use crate::game::asset::{AnimationAsset, CharacterAsset};

/// Sprite state without a renderer behind it.
///
/// Playback follows the asset: `frame_rate` frames per second, wrapping when
/// `repeat` is set and holding the final frame otherwise.
#[derive(Clone, Debug)]
pub struct HeadlessSprite {
    /// Animations by key
    library: BTreeMap<String, AnimationAsset>,
    position: Vec2,
    angle: f32,
    texture_key: String,
    animation: Option<String>,
    frame: usize,
    /// Time spent on the current frame (ms)
    frame_elapsed: f64,
    finished: bool,
    flip_x: bool,
}

impl HeadlessSprite {
    /// Create a sprite for `asset`, bound to its idle texture with nothing playing.
    pub fn new(asset: &CharacterAsset, position: Vec2) -> Self {
        let library = asset
            .animations()
            .into_iter()
            .map(|a| (a.animation_key.clone(), a.clone()))
            .collect();
        Self {
            library,
            position,
            angle: 0.0,
            texture_key: asset.idle.texture_key.clone(),
            animation: None,
            frame: 0,
            frame_elapsed: 0.0,
            finished: false,
            flip_x: false,
        }
    }

    /// Check if a non-repeating animation has run out.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn current_asset(&self) -> Option<&AnimationAsset> {
        self.animation.as_deref().and_then(|key| self.library.get(key))
    }
}

impl Sprite for HeadlessSprite {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn angle(&self) -> f32 {
        self.angle
    }

    fn texture_key(&self) -> &str {
        &self.texture_key
    }

    fn current_animation(&self) -> Option<&str> {
        self.animation.as_deref()
    }

    fn current_frame(&self) -> usize {
        self.frame
    }

    fn is_last_frame(&self) -> bool {
        self.current_asset()
            .is_some_and(|a| self.frame == a.last_frame())
    }

    fn flip_x(&self) -> bool {
        self.flip_x
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    fn set_texture(&mut self, texture_key: &str) {
        self.texture_key = texture_key.to_string();
    }

    fn play(&mut self, animation_key: &str) {
        if !self.library.contains_key(animation_key) {
            debug!(animation_key, "Ignoring unknown animation");
            return;
        }
        self.animation = Some(animation_key.to_string());
        self.frame = 0;
        self.frame_elapsed = 0.0;
        self.finished = false;
    }

    fn set_flip_x(&mut self, flip: bool) {
        self.flip_x = flip;
    }

    fn advance(&mut self, delta: f64) {
        if self.finished || delta <= 0.0 {
            return;
        }
        let Some(asset) = self.current_asset() else {
            return;
        };
        if asset.frame_count == 0 || asset.frame_rate <= 0.0 {
            return;
        }
        let frame_duration = 1000.0 / f64::from(asset.frame_rate);
        let (frame_count, repeat) = (asset.frame_count, asset.repeat);

        self.frame_elapsed += delta;
        while self.frame_elapsed >= frame_duration {
            self.frame_elapsed -= frame_duration;
            if self.frame + 1 < frame_count {
                self.frame += 1;
            } else if repeat {
                self.frame = 0;
            } else {
                self.finished = true;
                self.frame_elapsed = 0.0;
                break;
            }
        }
    }
}
