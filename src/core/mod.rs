//! Core primitives.
//!
//! Vocabulary and value types shared by the input, physics and game layers.

pub mod vec2;
pub mod movement;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use movement::{Action, HorizontalMovement, MovementStyle, VerticalMovement};
pub use hash::{CommitDigest, CommitHasher};
