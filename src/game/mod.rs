//! Game Logic Module
//!
//! Fighter logic, reconciliation and the match loop.
//!
//! ## Module Structure
//!
//! - `asset`: Character animation records
//! - `changes`: Proposed sprite mutations
//! - `character`: Per-fighter state machine
//! - `reconcile`: Input vs physics arbitration
//! - `config`: Match tunables
//! - `state`: Match context, fighter registry
//! - `tick`: One frame of the match
//! - `events`: Match events

pub mod asset;
pub mod changes;
pub mod character;
pub mod reconcile;
pub mod config;
pub mod state;
pub mod tick;
pub mod events;

// Re-export key types
pub use asset::{AnimationAsset, AttackAsset, CharacterAsset};
pub use changes::{CharacterUpdate, SpriteChanges, TextureChange};
pub use character::{CharacterIntent, CharacterPhase, CharacterState};
pub use reconcile::{Authority, Baseline, Merge};
pub use config::{ConfigError, MatchConfig};
pub use state::{CharacterId, Fighter, MatchContext, MatchError, MatchPhase};
pub use tick::{tick, TickResult};
pub use events::{MatchEvent, MatchEventData};
