//! Match Events
//!
//! Things that happened during a tick, for logging, overlays and tests.

use serde::{Deserialize, Serialize};

use crate::core::vec2::Vec2;
use crate::game::reconcile::Authority;
use crate::game::state::{CharacterId, MatchPhase};

/// Ordering of events within one tick.
///
/// Lower value = earlier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Pause / resume first
    Phase = 0,
    /// Then fighter phase transitions
    Transition = 1,
    /// Then sprite writes
    Commit = 2,
}

/// Event payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MatchEventData {
    /// A sprite was written
    Committed {
        /// Who wrote it
        authority: Authority,
        /// Committed position
        position: Vec2,
    },

    /// An attack began
    AttackStarted,

    /// An attack reached its last frame
    AttackEnded,

    /// A jump impulse was sent to the physics body
    Jumped {
        /// Impulse velocity (px/s)
        velocity: Vec2,
    },

    /// A jumping fighter touched the ground
    Landed,

    /// The match was paused or resumed
    PauseToggled {
        /// Phase after the toggle
        phase: MatchPhase,
    },
}

/// A match event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Tick when the event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Fighter involved (none for match-wide events)
    pub character_id: Option<CharacterId>,

    /// Event data
    pub data: MatchEventData,
}

impl MatchEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, character_id: Option<CharacterId>, data: MatchEventData) -> Self {
        Self {
            tick,
            priority,
            character_id,
            data,
        }
    }

    /// Create committed event.
    pub fn committed(tick: u32, character_id: CharacterId, authority: Authority, position: Vec2) -> Self {
        Self::new(
            tick,
            EventPriority::Commit,
            Some(character_id),
            MatchEventData::Committed { authority, position },
        )
    }

    /// Create attack started event.
    pub fn attack_started(tick: u32, character_id: CharacterId) -> Self {
        Self::new(tick, EventPriority::Transition, Some(character_id), MatchEventData::AttackStarted)
    }

    /// Create attack ended event.
    pub fn attack_ended(tick: u32, character_id: CharacterId) -> Self {
        Self::new(tick, EventPriority::Transition, Some(character_id), MatchEventData::AttackEnded)
    }

    /// Create jumped event.
    pub fn jumped(tick: u32, character_id: CharacterId, velocity: Vec2) -> Self {
        Self::new(
            tick,
            EventPriority::Transition,
            Some(character_id),
            MatchEventData::Jumped { velocity },
        )
    }

    /// Create landed event.
    pub fn landed(tick: u32, character_id: CharacterId) -> Self {
        Self::new(tick, EventPriority::Transition, Some(character_id), MatchEventData::Landed)
    }

    /// Create pause toggled event.
    pub fn pause_toggled(tick: u32, phase: MatchPhase) -> Self {
        Self::new(tick, EventPriority::Phase, None, MatchEventData::PauseToggled { phase })
    }
}

impl PartialEq for MatchEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.character_id == other.character_id
    }
}

impl Eq for MatchEvent {}

impl PartialOrd for MatchEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatchEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then character
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.character_id.cmp(&other.character_id))
    }
}
