//! Turn receiver: applies one order to every unit of a squad.
//!
//! Units are processed in list order, each rolling its own hit chance
//! from the shared stream. The receiver also captures and restores the
//! per-unit image that reversible commands use for undo.

use crate::{
    config::BattleConfig,
    config::FieldConfig,
    rng::BattleRng,
    squad::Squad,
    types::{CommandKind, Position, SquadId, UnitId},
    unit::HealthState,
};
use serde::{Deserialize, Serialize};

/// Pre-image of a single unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UnitImage {
    pub id:       UnitId,
    pub position: Position,
    pub state:    HealthState,
    pub actions:  u32,
}

/// Pre-image of a squad, in unit list order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SquadImage {
    pub squad_id: SquadId,
    pub units:    Vec<UnitImage>,
}

/// Outcome of one order against one squad.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnResult {
    /// Units whose resulting state is not OutOfBattle.
    pub affected:      usize,
    /// Healthy → Wounded.
    pub wounded:       usize,
    /// Wounded → OutOfBattle.
    pub out_of_battle: usize,
    /// Wounded → Healthy.
    pub recovered:     usize,
}

pub struct TurnReceiver<'a> {
    squad:          &'a mut Squad,
    field:          FieldConfig,
    hit_chance_pct: u32,
}

impl<'a> TurnReceiver<'a> {
    pub fn new(squad: &'a mut Squad, config: &BattleConfig) -> Self {
        Self {
            squad,
            field: config.field,
            hit_chance_pct: config.hit_chance_pct.min(100),
        }
    }

    /// Run `kind` through every unit's state machine and tally transitions.
    pub fn apply(&mut self, kind: CommandKind, rng: &mut BattleRng) -> TurnResult {
        let mut result = TurnResult::default();
        for unit in self.squad.units.iter_mut() {
            let before = unit.state;
            let after = unit.react(kind, &self.field, self.hit_chance_pct, rng);
            match (before, after) {
                (HealthState::Healthy, HealthState::Wounded) => result.wounded += 1,
                (HealthState::Wounded, HealthState::OutOfBattle) => result.out_of_battle += 1,
                (HealthState::Wounded, HealthState::Healthy) => result.recovered += 1,
                _ => {}
            }
            if after.is_active() {
                result.affected += 1;
            }
        }
        if kind != CommandKind::Fight {
            self.squad.shift_x(kind.direction(), &self.field);
        }
        log::debug!(
            "squad {} {}: affected={} wounded={} out={} recovered={}",
            self.squad.id,
            kind.label(),
            result.affected,
            result.wounded,
            result.out_of_battle,
            result.recovered
        );
        result
    }

    pub fn capture(&self) -> SquadImage {
        SquadImage {
            squad_id: self.squad.id,
            units: self
                .squad
                .units
                .iter()
                .map(|u| UnitImage { id: u.id, position: u.position, state: u.state, actions: u.actions })
                .collect(),
        }
    }

    /// Re-apply an image by unit id, then recenter the squad.
    /// Units missing from either side are skipped.
    pub fn restore(&mut self, image: &SquadImage) {
        for saved in &image.units {
            if let Some(unit) = self.squad.unit_mut(saved.id) {
                unit.position = saved.position;
                unit.state = saved.state;
                unit.actions = saved.actions;
            }
        }
        self.squad.recenter();
    }
}
