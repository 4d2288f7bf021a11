//! Duel Runtime Demo
//!
//! Runs a headless scripted match between two fighters, then replays it
//! and checks both runs commit the same sprite writes.
//!
//! ```text
//! duel-runtime [CONFIG.json] [--realtime]
//! ```
//!
//! `--realtime` paces ticks on a wall-clock interval until Ctrl-C.

use std::time::Duration;
use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use duel::{
    game::{asset::fixtures::witch_skin, events::MatchEventData},
    tick, Action, CharacterId, HeadlessSprite, HorizontalMovement, InputUpdate, MatchConfig,
    MatchContext, Vec2, VerticalMovement, TICK_RATE, VERSION,
};
use duel::input::ScriptedSource;

/// Length of the demo match (ticks)
const DEMO_TICKS: u32 = 20 * TICK_RATE;

/// Ticks per scripted input step
const SCRIPT_CADENCE_TICKS: f64 = 12.0;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Duel Runtime v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let mut realtime = false;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--realtime" => realtime = true,
            path => config_path = Some(path.to_string()),
        }
    }

    let config = match &config_path {
        Some(path) => MatchConfig::load(path).with_context(|| format!("loading config {path}"))?,
        None => MatchConfig::default(),
    };

    if realtime {
        run_realtime(config).await
    } else {
        demo_match(config)
    }
}

/// Scripted inputs for both fighters.
fn scripts() -> [Vec<InputUpdate>; 2] {
    use HorizontalMovement::{Left, Right, Stationary};
    use VerticalMovement::{Jump, Stationary as Ground};

    let step = |h, v, actions: &[Action]| InputUpdate::new(h, v, actions.iter().copied(), 0.0);
    [
        vec![
            step(Right, Ground, &[]),
            step(Right, Ground, &[]),
            step(Right, Ground, &[Action::Dash]),
            step(Stationary, Ground, &[Action::Attack]),
            step(Stationary, Ground, &[]),
            step(Right, Jump, &[]),
            step(Stationary, Ground, &[]),
            step(Left, Ground, &[]),
        ],
        vec![
            step(Stationary, Ground, &[]),
            step(Left, Ground, &[]),
            step(Left, Ground, &[]),
            step(Stationary, Jump, &[]),
            step(Stationary, Ground, &[]),
            step(Stationary, Ground, &[Action::Attack]),
            step(Right, Ground, &[]),
            step(Stationary, Ground, &[]),
        ],
    ]
}

/// Build the two-fighter match.
fn build_match(config: MatchConfig) -> Result<MatchContext> {
    let mut ctx = MatchContext::new(config)?;
    let cadence = ctx.config.tick_ms() * SCRIPT_CADENCE_TICKS;
    let spawns = [
        (CharacterId::new("player1"), witch_skin("witch"), Vec2::new(250.0, 400.0), false),
        (CharacterId::new("player2"), witch_skin("blue_witch"), Vec2::new(550.0, 400.0), true),
    ];

    for ((id, asset, spawn, facing_left), script) in spawns.into_iter().zip(scripts()) {
        let sprite = Box::new(HeadlessSprite::new(&asset, spawn));
        ctx.add_character(id.clone(), asset, spawn, facing_left, sprite)?;
        ctx.attach_input(&id, Box::new(ScriptedSource::new(script, cadence)))?;
    }
    Ok(ctx)
}

/// Run `ticks` ticks, logging notable events.
fn run_ticks(ctx: &mut MatchContext, ticks: u32) -> usize {
    let dt = ctx.config.tick_ms();
    let mut total_events = 0;

    for t in 0..ticks {
        let result = tick(ctx, f64::from(t) * dt, dt);
        total_events += result.events.len();

        for event in &result.events {
            let who = event.character_id.as_ref().map(CharacterId::as_str).unwrap_or("-");
            match &event.data {
                MatchEventData::AttackStarted => info!("Tick {}: {} attacks", t, who),
                MatchEventData::Jumped { velocity } => info!("Tick {}: {} jumps {}", t, who, velocity),
                MatchEventData::Landed => info!("Tick {}: {} lands", t, who),
                _ => {}
            }
        }

        if t > 0 && t % (5 * TICK_RATE) == 0 {
            for id in ctx.character_ids() {
                if let Some(fighter) = ctx.fighter(id) {
                    info!(
                        "Tick {}: {} at {} ({:?})",
                        t,
                        id,
                        fighter.sprite.position(),
                        fighter.state.phase()
                    );
                }
            }
        }
    }
    total_events
}

/// Demo function to test the runtime.
fn demo_match(config: MatchConfig) -> Result<()> {
    info!("=== Starting Demo Match ===");

    let mut ctx = build_match(config.clone())?;
    info!("Match ID: {}", ctx.match_id);

    let total_events = run_ticks(&mut ctx, DEMO_TICKS);
    let digest = ctx.commit_digest();

    info!("=== Match Results ===");
    info!("Ticks: {}", DEMO_TICKS);
    info!("Commits: {}", ctx.commit_count());
    info!("Total events: {}", total_events);
    info!("Commit Digest: {}", hex::encode(digest));

    for (id, update) in ctx.input_log().take(5) {
        info!("Recent input {}: {:?} {:?} {:?}", id, update.horizontal, update.vertical, update.actions);
    }

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let mut replay = build_match(config)?;
    run_ticks(&mut replay, DEMO_TICKS);
    let replay_digest = replay.commit_digest();
    info!("Replay Digest: {}", hex::encode(replay_digest));

    if digest == replay_digest {
        info!("DETERMINISM VERIFIED: Digests match!");
    } else {
        warn!("DETERMINISM FAILURE: Digests differ!");
    }
    Ok(())
}

/// Run the scripted match on a wall-clock interval until Ctrl-C.
async fn run_realtime(config: MatchConfig) -> Result<()> {
    let mut ctx = build_match(config)?;
    let dt = ctx.config.tick_ms();
    info!("Match ID: {} (realtime, Ctrl-C to stop)", ctx.match_id);

    let mut interval = tokio::time::interval(Duration::from_secs_f64(dt / 1000.0));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let started = tokio::time::Instant::now();
    let mut last = 0.0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = started.elapsed().as_secs_f64() * 1000.0;
                tick(&mut ctx, now, now - last);
                last = now;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping after {} ticks", ctx.tick);
                break;
            }
        }
    }

    info!("Commits: {}", ctx.commit_count());
    info!("Commit Digest: {}", hex::encode(ctx.commit_digest()));
    Ok(())
}
