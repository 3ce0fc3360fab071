//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};

/// A turn index. Turn 0 is the opening turn.
pub type Turn = u64;

/// Stable identifier of a unit, unique within a session.
pub type UnitId = u32;

/// Stable identifier of a squad, unique within a clan.
pub type SquadId = u32;

/// Which of the two clans a value refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClanSide {
    A,
    B,
}

impl ClanSide {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// A point on the battlefield. Only `x` changes during play.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The three orders a squad can receive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Forward,
    Backward,
    Fight,
}

impl CommandKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Forward => "Forward",
            Self::Backward => "Backward",
            Self::Fight => "Fight",
        }
    }

    /// Signed x direction for movement orders, 0 for Fight.
    pub fn direction(&self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
            Self::Fight => 0,
        }
    }

    /// Signed x offset for `steps` (at least 1), saturating at the i32 range.
    pub fn delta(&self, steps: u32) -> i32 {
        let steps = i32::try_from(steps.max(1)).unwrap_or(i32::MAX);
        self.direction().saturating_mul(steps)
    }
}
