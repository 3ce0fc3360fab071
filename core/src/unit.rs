//! Units and their health-state machine.
//!
//! | State       | Forward | Backward           | Fight (on hit)  |
//! |-------------|---------|--------------------|-----------------|
//! | Healthy     | x + 1   | x - 1              | → Wounded       |
//! | Wounded     | no-op   | x - 1, → Healthy   | → OutOfBattle   |
//! | OutOfBattle | no-op   | no-op              | no-op           |
//!
//! RULE: nothing leaves OutOfBattle during an engagement.

use crate::{
    config::FieldConfig,
    rng::BattleRng,
    types::{CommandKind, Position, UnitId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    #[default]
    Healthy,
    Wounded,
    OutOfBattle,
}

impl HealthState {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::OutOfBattle)
    }

    /// Next state for `kind`. `hit` is only consulted for Fight.
    pub fn next(self, kind: CommandKind, hit: bool) -> Self {
        match (self, kind) {
            (Self::Healthy, CommandKind::Fight) if hit => Self::Wounded,
            (Self::Wounded, CommandKind::Fight) if hit => Self::OutOfBattle,
            (Self::Wounded, CommandKind::Backward) => Self::Healthy,
            (state, _) => state,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    pub id:       UnitId,
    pub name:     String,
    pub position: Position,
    pub state:    HealthState,
    /// Fight orders this unit has carried out.
    pub actions:  u32,
}

impl Unit {
    pub fn new(id: UnitId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            state: HealthState::Healthy,
            actions: 0,
        }
    }

    pub fn shift_x(&mut self, delta: i32, field: &FieldConfig) {
        self.position.x = field.clamp_x(self.position.x.saturating_add(delta));
    }

    /// Apply one order through the state machine.
    ///
    /// A hit roll is drawn only when a Healthy or Wounded unit fights,
    /// so the number of draws depends on the units' states.
    pub fn react(
        &mut self,
        kind: CommandKind,
        field: &FieldConfig,
        hit_chance_pct: u32,
        rng: &mut BattleRng,
    ) -> HealthState {
        match (self.state, kind) {
            (HealthState::OutOfBattle, _) => {}
            (HealthState::Healthy, CommandKind::Forward) => self.shift_x(1, field),
            (HealthState::Wounded, CommandKind::Forward) => {}
            (_, CommandKind::Backward) => {
                self.shift_x(-1, field);
                self.state = self.state.next(kind, false);
            }
            (_, CommandKind::Fight) => {
                self.actions += 1;
                let hit = rng.chance_pct(hit_chance_pct);
                self.state = self.state.next(kind, hit);
            }
        }
        self.state
    }
}

/// Cosmetic overlay for a unit's display line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UnitFeatures {
    pub color:    Option<String>,
    pub height:   Option<u32>,
    pub clothing: Option<String>,
}

/// Render a unit and its cosmetic features as a single line.
pub fn describe_unit(unit: &Unit, features: &UnitFeatures) -> String {
    let mut line = format!(
        "{} #{} ({},{}) {:?} actions={}",
        unit.name, unit.id, unit.position.x, unit.position.y, unit.state, unit.actions
    );
    if let Some(color) = &features.color {
        line.push_str(&format!(" color={color}"));
    }
    if let Some(height) = features.height {
        line.push_str(&format!(" height={height}cm"));
    }
    if let Some(clothing) = &features.clothing {
        line.push_str(&format!(" wearing {clothing}"));
    }
    line
}
