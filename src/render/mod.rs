//! Rendering Collaborator
//!
//! The runtime never draws. It mutates sprites through the [`Sprite`] trait
//! and reads back the few things reconciliation needs: pose, texture,
//! animation key, frame and whether the last frame is showing.
//!
//! [`HeadlessSprite`] tracks the same state without a renderer. The demo
//! binary and the tests drive it.

use crate::core::vec2::Vec2;

pub mod headless;

pub use headless::HeadlessSprite;

/// A visible character as the rendering engine exposes it.
pub trait Sprite {
    /// Current position (presentation units).
    fn position(&self) -> Vec2;

    /// Current rotation (radians).
    fn angle(&self) -> f32;

    /// Key of the texture currently bound.
    fn texture_key(&self) -> &str;

    /// Key of the current animation, `None` if nothing was ever played.
    fn current_animation(&self) -> Option<&str>;

    /// Frame index within the current animation.
    fn current_frame(&self) -> usize;

    /// Check if the current animation is on its final frame.
    fn is_last_frame(&self) -> bool;

    /// Check if the sprite is mirrored horizontally.
    fn flip_x(&self) -> bool;

    /// Move the sprite.
    fn set_position(&mut self, position: Vec2);

    /// Rotate the sprite.
    fn set_angle(&mut self, angle: f32);

    /// Bind a texture.
    fn set_texture(&mut self, texture_key: &str);

    /// Start an animation from its first frame.
    fn play(&mut self, animation_key: &str);

    /// Mirror horizontally.
    fn set_flip_x(&mut self, flip: bool);

    /// Advance animation playback by `delta` ms.
    ///
    /// Renderers that animate on their own leave this as a no-op.
    fn advance(&mut self, _delta: f64) {}
}
