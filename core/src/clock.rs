//! Turn clock: owns the turn index, the side to move, and timestamps.
//!
//! Wall mode stamps with the system time. Frozen mode starts at a fixed
//! instant and advances one second per stamp, so replays produce
//! identical timestamps.

use crate::types::{ClanSide, Turn};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnClock {
    pub turn:   Turn,
    pub active: ClanSide,
    mode:       ClockMode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClockMode {
    Wall,
    Frozen { next: DateTime<Utc> },
}

impl TurnClock {
    pub fn wall() -> Self {
        Self { turn: 0, active: ClanSide::A, mode: ClockMode::Wall }
    }

    /// A clock whose first stamp is `start`.
    pub fn frozen(start: DateTime<Utc>) -> Self {
        Self { turn: 0, active: ClanSide::A, mode: ClockMode::Frozen { next: start } }
    }

    /// Frozen clock starting at the Unix epoch. Used by tests.
    pub fn frozen_epoch() -> Self {
        Self::frozen(Utc.timestamp_opt(0, 0).single().unwrap_or_default())
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.mode, ClockMode::Frozen { .. })
    }

    /// Produce the next timestamp.
    pub fn now(&mut self) -> DateTime<Utc> {
        match &mut self.mode {
            ClockMode::Wall => Utc::now(),
            ClockMode::Frozen { next } => {
                let stamp = *next;
                *next = stamp + Duration::seconds(1);
                stamp
            }
        }
    }

    /// End the current turn. Returns the new turn index.
    pub fn end_turn(&mut self) -> Turn {
        self.turn += 1;
        self.active = self.active.other();
        self.turn
    }
}
