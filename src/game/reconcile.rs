//! Reconciler
//!
//! Decides, per character per tick, which authority writes the sprite.
//!
//! ```text
//!   input proposal ──┐
//!                    ├──► merge(baseline) ──► at most one write
//!   physics update ──┘
//!
//!   1. input pose moved, or sprite plays nothing  → INPUT commits
//!   2. physics pose + input texture != baseline   → PHYSICS commits
//!   3. otherwise                                  → no write
//! ```
//!
//! Input owns intended movement and animation. Physics only corrects the
//! pose when input did not move the character, and never picks a texture.

use serde::{Deserialize, Serialize};
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::game::changes::{CharacterUpdate, SpriteChanges, TextureChange};
use crate::physics::PhysicsUpdate;
use crate::render::Sprite;

/// Which side wrote the sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Authority {
    /// Character logic driven by input
    Input,
    /// The physics step
    Physics,
}

/// What the sprite showed right before its merge.
#[derive(Clone, Debug, PartialEq)]
pub struct Baseline {
    /// Committed pose and texture
    pub changes: SpriteChanges,
    /// An animation is playing
    pub animating: bool,
}

impl Baseline {
    /// Snapshot a sprite. `fallback` stands in for the texture when nothing plays.
    pub fn capture(sprite: &dyn Sprite, fallback: &TextureChange) -> Self {
        Self {
            changes: SpriteChanges::from_sprite(sprite, fallback),
            animating: sprite.current_animation().is_some(),
        }
    }
}

/// Outcome of one merge.
#[derive(Clone, Debug, PartialEq)]
pub struct Merge {
    /// Committed changes, or the unchanged baseline
    pub changes: SpriteChanges,
    /// A write happened
    pub applied: bool,
    /// Who wrote, if anyone
    pub authority: Option<Authority>,
}

impl Merge {
    fn commit(changes: SpriteChanges, authority: Authority) -> Self {
        Self {
            changes,
            applied: true,
            authority: Some(authority),
        }
    }

    fn unchanged(baseline: &Baseline) -> Self {
        Self {
            changes: baseline.changes.clone(),
            applied: false,
            authority: None,
        }
    }
}

/// Merge the input proposal and the physics update for one character.
///
/// When input commits, the physics update is discarded for this tick.
pub fn merge(input: &CharacterUpdate, physics: Option<&PhysicsUpdate>, baseline: &Baseline) -> Merge {
    if let Some(proposal) = &input.changes {
        if proposal.pose_differs(&baseline.changes) || !baseline.animating {
            #[cfg(feature = "debug-tracing")]
            trace!(character = %input.character_id, ?proposal, "Input commits");
            return Merge::commit(proposal.clone(), Authority::Input);
        }
    }

    if let Some(physics) = physics {
        let texture = input.changes.as_ref().and_then(|c| c.texture.clone());
        let merged = CharacterUpdate::merge_physics(physics, texture);
        if let Some(changes) = merged.changes {
            if changes != baseline.changes {
                #[cfg(feature = "debug-tracing")]
                trace!(character = %input.character_id, ?changes, "Physics commits");
                return Merge::commit(changes, Authority::Physics);
            }
        }
    }

    Merge::unchanged(baseline)
}

/// Write committed changes to a sprite.
///
/// The texture is only swapped when its key differs. The animation is
/// started when its key differs, or restarted when frame 0 is requested
/// while a later frame shows.
pub fn apply(sprite: &mut dyn Sprite, changes: &SpriteChanges) {
    sprite.set_position(changes.position);
    sprite.set_angle(changes.angle);

    let Some(texture) = &changes.texture else {
        return;
    };
    if sprite.texture_key() != texture.texture_key {
        sprite.set_texture(&texture.texture_key);
    }
    let same_animation = sprite.current_animation() == Some(texture.animation_key.as_str());
    let restart = texture.animation_frame == 0 && sprite.current_frame() != 0;
    if !same_animation || restart {
        sprite.play(&texture.animation_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::asset::fixtures;
    use crate::game::state::CharacterId;
    use crate::render::HeadlessSprite;
    use proptest::prelude::*;

    fn texture(animation: &str, frame: usize) -> TextureChange {
        TextureChange {
            texture_key: format!("witch_{animation}"),
            animation_key: animation.into(),
            animation_frame: frame,
        }
    }

    fn proposal(x: f32, y: f32, animation: &str) -> CharacterUpdate {
        CharacterUpdate::new(
            CharacterId::new("player1"),
            0.0,
            Some(SpriteChanges::new(Vec2::new(x, y), 0.0, Some(texture(animation, 0)))),
        )
    }

    fn physics_at(x: f32, y: f32) -> PhysicsUpdate {
        PhysicsUpdate {
            position: Vec2::new(x, y),
            angle: 0.0,
            velocity: Vec2::ZERO,
            timestamp: 0.0,
            character_id: CharacterId::new("player1"),
            body: rapier2d::prelude::RigidBodyHandle::invalid(),
            grounded: false,
        }
    }

    fn baseline(x: f32, y: f32, animation: &str, animating: bool) -> Baseline {
        Baseline {
            changes: SpriteChanges::new(Vec2::new(x, y), 0.0, Some(texture(animation, 0))),
            animating,
        }
    }

    #[test]
    fn test_input_move_commits_input() {
        let merge = merge(
            &proposal(101.2, 200.0, "run"),
            Some(&physics_at(100.0, 205.0)),
            &baseline(100.0, 200.0, "idle", true),
        );
        assert!(merge.applied);
        assert_eq!(merge.authority, Some(Authority::Input));
        assert_eq!(merge.changes.position, Vec2::new(101.2, 200.0));
    }

    #[test]
    fn test_nothing_playing_forces_input() {
        let merge = merge(
            &proposal(100.0, 200.0, "idle"),
            Some(&physics_at(100.0, 205.0)),
            &baseline(100.0, 200.0, "idle", false),
        );
        assert_eq!(merge.authority, Some(Authority::Input));
        assert_eq!(merge.changes.position, Vec2::new(100.0, 200.0));
    }

    #[test]
    fn test_physics_corrects_resting_character() {
        let merge = merge(
            &proposal(100.0, 200.0, "idle"),
            Some(&physics_at(100.0, 205.0)),
            &baseline(100.0, 200.0, "idle", true),
        );
        assert_eq!(merge.authority, Some(Authority::Physics));
        assert_eq!(merge.changes.position, Vec2::new(100.0, 205.0));
        assert_eq!(merge.changes.animation_key(), Some("idle"));
    }

    #[test]
    fn test_texture_change_rides_physics_merge() {
        let merge = merge(
            &proposal(100.0, 200.0, "idle"),
            Some(&physics_at(100.0, 200.0)),
            &baseline(100.0, 200.0, "run", true),
        );
        assert_eq!(merge.authority, Some(Authority::Physics));
        assert_eq!(merge.changes.animation_key(), Some("idle"));
    }

    #[test]
    fn test_no_difference_no_write() {
        let merge = merge(
            &proposal(100.0, 200.0, "idle"),
            Some(&physics_at(100.0, 200.0)),
            &baseline(100.0, 200.0, "idle", true),
        );
        assert!(!merge.applied);
        assert_eq!(merge.authority, None);
        assert_eq!(merge.changes, baseline(100.0, 200.0, "idle", true).changes);
    }

    #[test]
    fn test_missing_physics_update() {
        let merge = merge(&proposal(100.0, 200.0, "idle"), None, &baseline(100.0, 200.0, "idle", true));
        assert!(!merge.applied);
    }

    #[test]
    fn test_apply_swaps_only_on_key_change() {
        let asset = fixtures::witch();
        let mut sprite = HeadlessSprite::new(&asset, Vec2::new(100.0, 200.0));
        sprite.play("run");
        sprite.set_texture("witch_run");
        sprite.advance(200.0);
        let frame = sprite.current_frame();

        assert!(frame > 0);

        apply(&mut sprite, &SpriteChanges::new(Vec2::new(101.2, 200.0), 0.0, Some(texture("run", frame))));
        assert_eq!(sprite.position(), Vec2::new(101.2, 200.0));
        assert_eq!(sprite.current_frame(), frame, "same animation must not restart");

        apply(&mut sprite, &SpriteChanges::new(Vec2::new(101.2, 200.0), 0.0, Some(texture("idle", 0))));
        assert_eq!(sprite.texture_key(), "witch_idle");
        assert_eq!(sprite.current_animation(), Some("idle"));
    }

    #[test]
    fn test_apply_restarts_finished_animation_at_frame_zero() {
        let asset = fixtures::witch();
        let mut sprite = HeadlessSprite::new(&asset, Vec2::new(100.0, 200.0));
        sprite.set_texture("witch_attack");
        sprite.play("attack");
        sprite.advance(2000.0);
        assert!(sprite.is_last_frame());
        assert!(sprite.is_finished());

        apply(&mut sprite, &SpriteChanges::new(Vec2::new(100.0, 200.0), 0.0, Some(texture("attack", 0))));
        assert_eq!(sprite.current_animation(), Some("attack"));
        assert_eq!(sprite.current_frame(), 0);
        assert!(!sprite.is_finished());
    }

    /// Two ticks: RIGHT from rest, then STATIONARY while physics reports a fall.
    #[test]
    fn test_two_tick_scenario() {
        let asset = fixtures::witch();
        let idle = asset.idle.texture_change();
        let mut sprite = HeadlessSprite::new(&asset, Vec2::new(100.0, 200.0));
        sprite.play("idle");

        // Tick 1: RIGHT
        let before = Baseline::capture(&sprite, &idle);
        let m1 = merge(
            &proposal(101.2, 200.0, "run"),
            Some(&physics_at(100.0, 200.5)),
            &before,
        );
        assert_eq!(m1.authority, Some(Authority::Input));
        apply(&mut sprite, &m1.changes);
        assert_eq!(sprite.position(), Vec2::new(101.2, 200.0));
        assert_eq!(sprite.current_animation(), Some("run"));

        // Tick 2: STATIONARY, physics says y = 205
        let before = Baseline::capture(&sprite, &idle);
        let m2 = merge(
            &proposal(101.2, 200.0, "idle"),
            Some(&physics_at(101.2, 205.0)),
            &before,
        );
        assert_eq!(m2.authority, Some(Authority::Physics));
        apply(&mut sprite, &m2.changes);
        assert_eq!(sprite.position(), Vec2::new(101.2, 205.0));
        assert_eq!(sprite.current_animation(), Some("idle"));
    }

    fn pose() -> impl Strategy<Value = (f32, f32)> {
        (-500.0f32..500.0, -500.0f32..500.0)
    }

    fn animation() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("idle"), Just("run"), Just("attack")]
    }

    proptest! {
        /// Applying a merge and re-merging the settled proposals writes nothing.
        #[test]
        fn prop_merge_is_idempotent(
            (ix, iy) in pose(),
            (px, py) in pose(),
            (bx, by) in pose(),
            input_anim in animation(),
            base_anim in animation(),
            animating in any::<bool>(),
        ) {
            let asset = fixtures::witch();
            let idle = asset.idle.texture_change();
            let mut sprite = HeadlessSprite::new(&asset, Vec2::new(bx, by));
            if animating {
                sprite.set_texture(&format!("witch_{base_anim}"));
                sprite.play(base_anim);
            }

            let input = proposal(ix, iy, input_anim);
            let physics = physics_at(px, py);
            let first = merge(&input, Some(&physics), &Baseline::capture(&sprite, &idle));
            apply(&mut sprite, &first.changes);

            // Next tick sees the committed pose on both sides
            let settled = sprite.position();
            let input = proposal(settled.x, settled.y, input_anim);
            let physics = physics_at(settled.x, settled.y);
            let second = merge(&input, Some(&physics), &Baseline::capture(&sprite, &idle));

            prop_assert!(!second.applied);
            prop_assert_eq!(second.changes, first.changes);
        }

        /// A moving input proposal always wins over physics.
        #[test]
        fn prop_input_move_excludes_physics(
            (ix, iy) in pose(),
            (px, py) in pose(),
            (bx, by) in pose(),
            input_anim in animation(),
            base_anim in animation(),
            animating in any::<bool>(),
        ) {
            prop_assume!(ix != bx || iy != by);
            let result = merge(
                &proposal(ix, iy, input_anim),
                Some(&physics_at(px, py)),
                &baseline(bx, by, base_anim, animating),
            );
            prop_assert_eq!(result.authority, Some(Authority::Input));
            prop_assert_eq!(result.changes.position, Vec2::new(ix, iy));
        }
    }
}
