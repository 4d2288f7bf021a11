//! Match Tick
//!
//! One frame of the match, in a fixed order:
//!
//! 1. Poll every input source
//! 2. Handle Start (pause / resume)
//! 3. Each fighter proposes an intent; jumps go to physics
//! 4. Step physics
//! 5. Reconcile input and physics per fighter, write sprites
//! 6. Commit intents, advance animations
//!
//! Input is always polled before the physics step, so the reconciler sees
//! both snapshots of the same tick.

use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

use crate::core::movement::Action;
use crate::game::changes::{CharacterUpdate, SpriteChanges};
use crate::game::character::{CharacterIntent, CharacterPhase};
use crate::game::events::MatchEvent;
use crate::game::reconcile::{self, Authority, Baseline};
use crate::game::state::{CharacterId, MatchContext, MatchPhase};
use crate::input::InputUpdate;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, sorted
    pub events: Vec<MatchEvent>,
    /// Sprite writes this tick
    pub commits: usize,
}

/// Run one tick at `time` (ms), `delta` ms after the previous one.
pub fn tick(ctx: &mut MatchContext, time: f64, delta: f64) -> TickResult {
    let mut result = TickResult::default();
    ctx.tick += 1;

    // 1. Poll inputs
    let inputs = poll_inputs(ctx, time, delta);

    // 2. Pause handling
    match ctx.phase {
        MatchPhase::Paused => {
            if ctx.start_pressed_while_paused() {
                toggle_pause(ctx, time, &mut result);
            }
            return result;
        }
        MatchPhase::Playing => {
            if inputs.values().any(|u| u.has_action(Action::Start)) {
                toggle_pause(ctx, time, &mut result);
                if ctx.phase == MatchPhase::Paused {
                    return result;
                }
            }
        }
    }

    for (id, update) in &inputs {
        ctx.record_input(id, update);
    }

    // 3. Propose
    let intents: BTreeMap<CharacterId, CharacterIntent> = ctx
        .fighters
        .iter()
        .map(|(id, fighter)| {
            let intent = fighter.state.propose(inputs.get(id), fighter.sprite.as_ref(), &ctx.config);
            (id.clone(), intent)
        })
        .collect();

    for (id, intent) in &intents {
        if let Some(velocity) = intent.jump {
            match ctx.physics.set_velocity(id, velocity) {
                Ok(()) => result.events.push(MatchEvent::jumped(ctx.tick, id.clone(), velocity)),
                Err(err) => trace!(character = %id, %err, "Jump skipped"),
            }
        }
    }

    // 4. Physics
    let physics_updates = ctx.physics.step(time, delta);

    // 5. Reconcile
    let mut committed: Vec<(CharacterId, SpriteChanges)> = Vec::new();
    for (id, intent) in &intents {
        let Some(fighter) = ctx.fighters.get_mut(id) else {
            trace!(character = %id, "Skipping update for removed character");
            continue;
        };

        let baseline = Baseline::capture(fighter.sprite.as_ref(), &fighter.state.idle_texture());
        let input = CharacterUpdate::new(id.clone(), time, Some(intent.changes.clone()));
        let physics = physics_updates.get(id);
        let merge = reconcile::merge(&input, physics, &baseline);

        if let Some(authority) = merge.authority {
            reconcile::apply(fighter.sprite.as_mut(), &merge.changes);
            if authority == Authority::Input {
                if let Err(err) = ctx.physics.set_position(id, merge.changes.position) {
                    trace!(character = %id, %err, "Body sync skipped");
                }
            }
            debug!(
                tick = ctx.tick,
                character = %id,
                ?authority,
                position = %merge.changes.position,
                animation = merge.changes.animation_key().unwrap_or("-"),
                "Committed"
            );
            result
                .events
                .push(MatchEvent::committed(ctx.tick, id.clone(), authority, merge.changes.position));
            committed.push((id.clone(), merge.changes));
        }

        // 6. Commit intent
        let was = fighter.state.phase();
        fighter.state.commit(intent);
        let now = fighter.state.phase();
        if was != CharacterPhase::Attacking && now == CharacterPhase::Attacking {
            result.events.push(MatchEvent::attack_started(ctx.tick, id.clone()));
        } else if was == CharacterPhase::Attacking && now != CharacterPhase::Attacking {
            result.events.push(MatchEvent::attack_ended(ctx.tick, id.clone()));
        }

        if fighter.sprite.flip_x() != intent.facing_left {
            fighter.sprite.set_flip_x(intent.facing_left);
        }
        if let Some(physics) = physics {
            if fighter.state.observe_physics(physics) {
                result.events.push(MatchEvent::landed(ctx.tick, id.clone()));
            }
        }
    }

    for id in physics_updates.keys().filter(|id| !intents.contains_key(*id)) {
        trace!(body = %id, "Physics update without character");
    }

    for fighter in ctx.fighters.values_mut() {
        fighter.sprite.advance(delta);
    }

    result.commits = committed.len();
    for (id, changes) in &committed {
        ctx.record_commit(id, changes);
    }
    result.events.sort();
    result
}

/// Poll every attached source once.
fn poll_inputs(ctx: &mut MatchContext, time: f64, delta: f64) -> BTreeMap<CharacterId, InputUpdate> {
    let mut inputs = BTreeMap::new();
    for (id, source) in ctx.sources.iter_mut() {
        if let Some(update) = source.update(&mut ctx.devices, time, delta) {
            inputs.insert(id.clone(), update);
        }
    }
    inputs
}

fn toggle_pause(ctx: &mut MatchContext, time: f64, result: &mut TickResult) {
    match ctx.toggle_pause(time) {
        Ok(Some(phase)) => result.events.push(MatchEvent::pause_toggled(ctx.tick, phase)),
        Ok(None) => {}
        Err(err) => warn!(%err, "Pause toggle failed"),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::movement::{HorizontalMovement, VerticalMovement};
    use crate::core::vec2::Vec2;
    use crate::game::asset::fixtures;
    use crate::game::config::MatchConfig;
    use crate::game::events::MatchEventData;
    use crate::input::device::keys;
    use crate::input::{KeyboardSource, ScriptedSource};
    use crate::render::HeadlessSprite;

    const DT: f64 = 16.0;

    fn p1() -> CharacterId {
        CharacterId::new("player1")
    }

    fn new_match(spawn: Vec2) -> MatchContext {
        let mut ctx = MatchContext::new(MatchConfig::default()).unwrap();
        let asset = fixtures::witch();
        let sprite = Box::new(HeadlessSprite::new(&asset, spawn));
        ctx.add_character(p1(), asset, spawn, false, sprite).unwrap();
        ctx
    }

    fn scripted(cycle: Vec<InputUpdate>) -> Box<ScriptedSource> {
        Box::new(ScriptedSource::new(cycle, DT))
    }

    fn right() -> InputUpdate {
        InputUpdate::new(HorizontalMovement::Right, VerticalMovement::Stationary, [], 0.0)
    }

    fn run_ticks(ctx: &mut MatchContext, from: u32, count: u32) -> Vec<TickResult> {
        (from..from + count)
            .map(|i| tick(ctx, f64::from(i) * DT, DT))
            .collect()
    }

    #[test]
    fn test_two_tick_scenario_with_physics() {
        let mut ctx = new_match(Vec2::new(100.0, 200.0));
        ctx.attach_input(&p1(), scripted(vec![right(), InputUpdate::idle(0.0)])).unwrap();

        // Tick 1: RIGHT
        let first = tick(&mut ctx, 0.0, DT);
        let sprite = &ctx.fighter(&p1()).unwrap().sprite;
        assert_eq!(first.commits, 1);
        assert_eq!(sprite.position(), Vec2::new(101.2, 200.0));
        assert_eq!(sprite.current_animation(), Some("run"));
        assert!(first.events.iter().any(|e| matches!(
            e.data,
            MatchEventData::Committed { authority: Authority::Input, .. }
        )));
        // Body follows the sprite
        assert_eq!(ctx.physics.position(&p1()), Some(Vec2::new(101.2, 200.0)));

        // Tick 2: STATIONARY, gravity pulls the body down
        let second = tick(&mut ctx, DT, DT);
        let sprite = &ctx.fighter(&p1()).unwrap().sprite;
        assert!(second.events.iter().any(|e| matches!(
            e.data,
            MatchEventData::Committed { authority: Authority::Physics, .. }
        )));
        assert!((sprite.position().x - 101.2).abs() < 1e-3);
        assert!(sprite.position().y > 200.0);
        assert_eq!(sprite.current_animation(), Some("idle"));
    }

    #[test]
    fn test_at_most_one_commit_per_character() {
        let mut ctx = new_match(Vec2::new(100.0, 200.0));
        ctx.attach_input(&p1(), scripted(vec![right(), right(), InputUpdate::idle(0.0)]))
            .unwrap();

        for result in run_ticks(&mut ctx, 0, 120) {
            assert!(result.commits <= 1);
            let commits = result
                .events
                .iter()
                .filter(|e| matches!(e.data, MatchEventData::Committed { .. }))
                .count();
            assert_eq!(commits, result.commits);
        }
    }

    #[test]
    fn test_resting_character_stops_writing() {
        // Spawn standing on the floor (top at 552, half height 35)
        let mut ctx = new_match(Vec2::new(100.0, 517.0));
        ctx.attach_input(&p1(), scripted(vec![InputUpdate::idle(0.0)])).unwrap();

        let results = run_ticks(&mut ctx, 0, 240);
        // Animation frames advancing alone never cause a write
        let tail: usize = results[200..].iter().map(|r| r.commits).sum();
        assert!(tail < 40, "expected idle ticks once settled, got {tail}");

        let position = ctx.fighter(&p1()).unwrap().sprite.position();
        assert!((position.y - 517.0).abs() < 2.0, "rests at {position}");
    }

    #[test]
    fn test_attack_events() {
        let mut ctx = new_match(Vec2::new(100.0, 517.0));
        let attack = InputUpdate::new(HorizontalMovement::Stationary, VerticalMovement::Stationary, [Action::Attack], 0.0);
        let mut cycle = vec![attack];
        cycle.extend(std::iter::repeat(InputUpdate::idle(0.0)).take(59));
        ctx.attach_input(&p1(), scripted(cycle)).unwrap();

        let events: Vec<MatchEvent> = run_ticks(&mut ctx, 0, 60)
            .into_iter()
            .flat_map(|r| r.events)
            .collect();
        let started = events.iter().filter(|e| e.data == MatchEventData::AttackStarted).count();
        let ended = events.iter().filter(|e| e.data == MatchEventData::AttackEnded).count();
        assert_eq!(started, 1);
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_held_attack_repeats_and_settles_between_writes() {
        let mut ctx = new_match(Vec2::new(100.0, 517.0));
        let attack = InputUpdate::new(HorizontalMovement::Stationary, VerticalMovement::Stationary, [Action::Attack], 0.0);
        ctx.attach_input(&p1(), scripted(vec![attack])).unwrap();

        let mut starts = 0;
        let mut ends = 0;
        let mut tail_frames = Vec::new();
        let mut tail_damage = Vec::new();
        let mut quiet_writes = 0;

        for i in 0..300u32 {
            let result = tick(&mut ctx, f64::from(i) * DT, DT);
            let started = result.events.iter().filter(|e| e.data == MatchEventData::AttackStarted).count();
            let ended = result.events.iter().filter(|e| e.data == MatchEventData::AttackEnded).count();
            starts += started;
            ends += ended;

            if i >= 240 {
                let fighter = ctx.fighter(&p1()).unwrap();
                let frame = fighter.sprite.current_frame();
                if fighter.sprite.current_animation() == Some("attack") {
                    tail_frames.push(frame);
                }
                tail_damage.push(fighter.state.is_in_damage_frame(frame));
                // Writes only happen when the animation switches
                if result.commits > 0 && started + ended == 0 {
                    quiet_writes += 1;
                }
            }
        }

        assert!(starts >= 3, "attack should start over, started {starts} times");
        assert!(ends >= 2, "attack should end, ended {ends} times");
        assert!(starts - ends <= 1);
        assert!(tail_frames.contains(&0) && tail_frames.contains(&8), "frames seen: {tail_frames:?}");
        assert!(tail_damage.contains(&true) && tail_damage.contains(&false));
        assert_eq!(quiet_writes, 0);
    }

    #[test]
    fn test_jump_and_land() {
        let mut ctx = new_match(Vec2::new(100.0, 517.0));
        let jump = InputUpdate::new(HorizontalMovement::Stationary, VerticalMovement::Jump, [], 0.0);
        // Settle, jump once, then idle
        let mut cycle = vec![InputUpdate::idle(0.0); 30];
        cycle.push(jump);
        cycle.extend(std::iter::repeat(InputUpdate::idle(0.0)).take(200));
        ctx.attach_input(&p1(), scripted(cycle)).unwrap();

        let events: Vec<MatchEvent> = run_ticks(&mut ctx, 0, 200)
            .into_iter()
            .flat_map(|r| r.events)
            .collect();
        let jumped = events
            .iter()
            .position(|e| matches!(e.data, MatchEventData::Jumped { .. }))
            .expect("no jump");
        let landed = events
            .iter()
            .position(|e| e.data == MatchEventData::Landed)
            .expect("no landing");
        assert!(jumped < landed);
        assert!(!ctx.fighter(&p1()).unwrap().state.is_jumping());
    }

    #[test]
    fn test_escape_pauses_and_resumes() {
        let mut ctx = new_match(Vec2::new(100.0, 517.0));
        ctx.attach_input(&p1(), Box::new(KeyboardSource::new())).unwrap();

        ctx.devices.press_key(keys::ESC);
        let paused = tick(&mut ctx, 0.0, DT);
        assert!(ctx.is_paused());
        assert!(paused.events.iter().any(|e| e.data == MatchEventData::PauseToggled { phase: MatchPhase::Paused }));
        ctx.devices.release_key(keys::ESC);

        // Movement keys do nothing while paused
        ctx.devices.press_key(keys::D);
        let before = ctx.fighter(&p1()).unwrap().sprite.position();
        for result in run_ticks(&mut ctx, 1, 10) {
            assert_eq!(result.commits, 0);
        }
        assert_eq!(ctx.fighter(&p1()).unwrap().sprite.position(), before);
        ctx.devices.release_key(keys::D);

        // Start inside the debounce window is ignored
        ctx.devices.press_key(keys::ESC);
        tick(&mut ctx, 500.0, DT);
        assert!(ctx.is_paused());
        ctx.devices.release_key(keys::ESC);

        ctx.devices.press_key(keys::ESC);
        let resumed = tick(&mut ctx, 2500.0, DT);
        assert!(!ctx.is_paused());
        assert!(resumed.events.iter().any(|e| e.data == MatchEventData::PauseToggled { phase: MatchPhase::Playing }));
        assert_eq!(ctx.devices.listener_count(), 1);
    }

    #[test]
    fn test_removed_character_is_skipped() {
        let mut ctx = new_match(Vec2::new(100.0, 200.0));
        ctx.attach_input(&p1(), scripted(vec![right()])).unwrap();
        run_ticks(&mut ctx, 0, 5);

        assert!(ctx.remove_character(&p1()));
        let results = run_ticks(&mut ctx, 5, 5);
        assert!(results.iter().all(|r| r.commits == 0));
    }

    #[test]
    fn test_input_log_records_changes() {
        let mut ctx = new_match(Vec2::new(100.0, 517.0));
        ctx.attach_input(&p1(), scripted(vec![right(), right(), InputUpdate::idle(0.0)]))
            .unwrap();
        run_ticks(&mut ctx, 0, 3);

        let log: Vec<_> = ctx.input_log().map(|(_, u)| u.horizontal).collect();
        assert_eq!(log, vec![HorizontalMovement::Stationary, HorizontalMovement::Right]);
    }

    #[test]
    fn test_same_script_same_digest() {
        let run = || {
            let mut ctx = new_match(Vec2::new(100.0, 300.0));
            let jump = InputUpdate::new(HorizontalMovement::Right, VerticalMovement::Jump, [], 0.0);
            ctx.attach_input(&p1(), scripted(vec![right(), right(), jump, InputUpdate::idle(0.0)]))
                .unwrap();
            run_ticks(&mut ctx, 0, 180);
            (ctx.commit_count(), ctx.commit_digest())
        };
        let (count_a, digest_a) = run();
        let (count_b, digest_b) = run();
        assert!(count_a > 0);
        assert_eq!(count_a, count_b);
        assert_eq!(digest_a, digest_b);
    }
}
