//! # Duel Runtime
//!
//! Per-tick runtime for a 2D fighting game: input decoding, rigid-body
//! physics and the reconciliation that decides who moves each sprite.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       DUEL RUNTIME                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Shared vocabulary                         │
//! │  ├── vec2.rs     - Presentation-space vector                 │
//! │  ├── movement.rs - Horizontal / vertical / action enums      │
//! │  └── hash.rs     - Commit digest for determinism checks      │
//! │                                                              │
//! │  input/          - Device decoding                           │
//! │  ├── device.rs   - Level state and edge listeners            │
//! │  ├── stick.rs    - Dash / run classifier                     │
//! │  ├── debounce.rs - Acceptance-window gate                    │
//! │  └── keyboard.rs, gamepad.rs, scripted.rs                    │
//! │                                                              │
//! │  game/           - Fighters and the match loop               │
//! │  ├── character.rs- Per-fighter state machine                 │
//! │  ├── reconcile.rs- Input vs physics arbitration              │
//! │  ├── state.rs    - Match context and registry                │
//! │  └── tick.rs     - One frame of the match                    │
//! │                                                              │
//! │  physics/        - rapier2d bridge (pixels <-> metres)       │
//! │  render/         - Sprite trait + headless sprite            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tick Order
//!
//! Input is polled, fighters propose, physics steps, then each fighter is
//! reconciled exactly once. At most one authority writes a sprite per tick,
//! and nothing is written when nothing changed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod input;
pub mod game;
pub mod physics;
pub mod render;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::movement::{Action, HorizontalMovement, MovementStyle, VerticalMovement};
pub use input::{InputSource, InputUpdate};
pub use game::state::{CharacterId, MatchContext, MatchPhase};
pub use game::config::MatchConfig;
pub use game::tick::{tick, TickResult};
pub use physics::PhysicsBridge;
pub use render::{HeadlessSprite, Sprite};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
