//! Squads, clans, and the frozen leader snapshot.

use crate::{
    config::FieldConfig,
    types::{Position, SquadId, UnitId},
    unit::{HealthState, Unit},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Squad {
    pub id:       SquadId,
    /// Race / type tag, e.g. "orc".
    pub kind:     String,
    pub position: Position,
    /// Creation order. Preserved across snapshot round-trips.
    pub units:    Vec<Unit>,
}

impl Squad {
    pub fn new(id: SquadId, kind: impl Into<String>, position: Position) -> Self {
        Self { id, kind: kind.into(), position, units: Vec::new() }
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Units not yet out of battle.
    pub fn active_count(&self) -> usize {
        self.units.iter().filter(|u| u.state.is_active()).count()
    }

    pub fn count_in(&self, state: HealthState) -> usize {
        self.units.iter().filter(|u| u.state == state).count()
    }

    pub fn is_defeated(&self) -> bool {
        self.active_count() == 0
    }

    /// Move the squad's aggregate position along x, clamped.
    pub fn shift_x(&mut self, delta: i32, field: &FieldConfig) {
        self.position.x = field.clamp_x(self.position.x.saturating_add(delta));
    }

    /// Reset the aggregate position to the rounded mean of unit positions.
    /// An empty squad keeps its position.
    pub fn recenter(&mut self) {
        if self.units.is_empty() {
            return;
        }
        let n = self.units.len() as f64;
        let sum_x: f64 = self.units.iter().map(|u| u.position.x as f64).sum();
        let sum_y: f64 = self.units.iter().map(|u| u.position.y as f64).sum();
        self.position = Position::new((sum_x / n).round() as i32, (sum_y / n).round() as i32);
    }
}

/// Leader attributes frozen at appointment time. Survives later
/// mutation or removal of the live unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderSnapshot {
    pub unit_id:  UnitId,
    pub squad_id: SquadId,
    pub name:     String,
    pub position: Position,
    pub state:    HealthState,
    pub actions:  u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clan {
    pub name:   String,
    pub squads: Vec<Squad>,
    pub leader: Option<LeaderSnapshot>,
}

impl Clan {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), squads: Vec::new(), leader: None }
    }

    pub fn squad(&self, id: SquadId) -> Option<&Squad> {
        self.squads.iter().find(|s| s.id == id)
    }

    pub fn squad_mut(&mut self, id: SquadId) -> Option<&mut Squad> {
        self.squads.iter_mut().find(|s| s.id == id)
    }

    pub fn squad_ids(&self) -> Vec<SquadId> {
        self.squads.iter().map(|s| s.id).collect()
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.squads.iter().flat_map(|s| s.units.iter())
    }

    /// Appoint `unit_id` as leader and freeze its current attributes.
    /// Returns false when no such unit exists; the old leader is kept.
    pub fn set_leader(&mut self, unit_id: UnitId) -> bool {
        let found = self.squads.iter().find_map(|s| s.unit(unit_id).map(|u| (s.id, u)));
        match found {
            Some((squad_id, unit)) => {
                self.leader = Some(LeaderSnapshot {
                    unit_id,
                    squad_id,
                    name: unit.name.clone(),
                    position: unit.position,
                    state: unit.state,
                    actions: unit.actions,
                });
                true
            }
            None => false,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.squads.iter().all(Squad::is_defeated)
    }

    pub fn health_summary(&self) -> HealthSummary {
        let mut summary = HealthSummary::default();
        for unit in self.units() {
            match unit.state {
                HealthState::Healthy => summary.healthy += 1,
                HealthState::Wounded => summary.wounded += 1,
                HealthState::OutOfBattle => summary.out_of_battle += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthSummary {
    pub healthy:       usize,
    pub wounded:       usize,
    pub out_of_battle: usize,
}
