//! Reconciler and match-tick benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rapier2d::prelude::RigidBodyHandle;

use duel::game::asset::fixtures;
use duel::game::changes::{CharacterUpdate, SpriteChanges, TextureChange};
use duel::game::reconcile::{merge, Baseline};
use duel::input::ScriptedSource;
use duel::physics::PhysicsUpdate;
use duel::{
    tick, CharacterId, HeadlessSprite, HorizontalMovement, InputUpdate, MatchConfig, MatchContext,
    Vec2, VerticalMovement,
};

fn texture(animation: &str) -> TextureChange {
    TextureChange {
        texture_key: format!("witch_{animation}"),
        animation_key: animation.to_string(),
        animation_frame: 0,
    }
}

fn physics_at(x: f32, y: f32) -> PhysicsUpdate {
    PhysicsUpdate {
        position: Vec2::new(x, y),
        angle: 0.0,
        velocity: Vec2::ZERO,
        timestamp: 0.0,
        character_id: CharacterId::new("player1"),
        body: RigidBodyHandle::invalid(),
        grounded: true,
    }
}

fn bench_merge(c: &mut Criterion) {
    let baseline = Baseline {
        changes: SpriteChanges::new(Vec2::new(100.0, 200.0), 0.0, Some(texture("idle"))),
        animating: true,
    };
    let moving = CharacterUpdate::new(
        CharacterId::new("player1"),
        0.0,
        Some(SpriteChanges::new(Vec2::new(101.2, 200.0), 0.0, Some(texture("run")))),
    );
    let resting = CharacterUpdate::new(
        CharacterId::new("player1"),
        0.0,
        Some(SpriteChanges::new(Vec2::new(100.0, 200.0), 0.0, Some(texture("idle")))),
    );
    let falling = physics_at(100.0, 205.0);

    c.bench_function("merge_input_commit", |b| {
        b.iter(|| merge(black_box(&moving), Some(black_box(&falling)), black_box(&baseline)))
    });

    c.bench_function("merge_physics_commit", |b| {
        b.iter(|| merge(black_box(&resting), Some(black_box(&falling)), black_box(&baseline)))
    });
}

fn bench_tick(c: &mut Criterion) {
    c.bench_function("match_tick_two_fighters", |b| {
        b.iter_with_setup(
            || {
                let mut ctx = MatchContext::new(MatchConfig::default()).expect("default config");
                let cycle = vec![
                    InputUpdate::new(HorizontalMovement::Right, VerticalMovement::Stationary, [], 0.0),
                    InputUpdate::new(HorizontalMovement::Stationary, VerticalMovement::Jump, [], 0.0),
                ];
                for (name, x) in [("player1", 250.0), ("player2", 550.0)] {
                    let id = CharacterId::new(name);
                    let spawn = Vec2::new(x, 400.0);
                    let asset = fixtures::witch();
                    let sprite = Box::new(HeadlessSprite::new(&asset, spawn));
                    ctx.add_character(id.clone(), asset, spawn, x > 400.0, sprite)
                        .expect("add character");
                    ctx.attach_input(&id, Box::new(ScriptedSource::new(cycle.clone(), 200.0)))
                        .expect("attach input");
                }
                ctx
            },
            |mut ctx| {
                let dt = ctx.config.tick_ms();
                for t in 0..60 {
                    tick(&mut ctx, f64::from(t) * dt, dt);
                }
                ctx
            },
        )
    });
}

criterion_group!(benches, bench_merge, bench_tick);
criterion_main!(benches);
