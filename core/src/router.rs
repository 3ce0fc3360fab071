//! Command router: the mediator between a clan and its squads.
//!
//! One router per clan. It only knows which squad ids it may address;
//! the squads themselves stay owned by the clan and are borrowed per
//! delivery.
//!
//! RULES:
//!   - An order for an unregistered squad is dropped: no state change,
//!     no log entry.
//!   - Each delivery appends exactly one log entry.
//!   - A broadcast is one delivery per registered squad, same step count.

use crate::{
    action::execute_unit_action,
    command::CommandRequest,
    config::FieldConfig,
    command_log::{CommandLog, CommandLogEntry},
    squad::Clan,
    types::{CommandKind, SquadId},
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A squad the router may address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquadParticipant {
    pub squad_id: SquadId,
    pub kind:     String,
}

#[derive(Debug, Clone)]
pub struct CommandRouter {
    clan:         String,
    participants: BTreeMap<SquadId, SquadParticipant>,
}

impl CommandRouter {
    pub fn new(clan: impl Into<String>) -> Self {
        Self { clan: clan.into(), participants: BTreeMap::new() }
    }

    /// Router with every squad of `clan` registered, and the clan
    /// recorded in `log`.
    pub fn for_clan(clan: &Clan, log: &mut CommandLog) -> Self {
        let mut router = Self::new(clan.name.clone());
        router.register_clan(log);
        for squad in &clan.squads {
            router.register_squad(SquadParticipant { squad_id: squad.id, kind: squad.kind.clone() });
        }
        router
    }

    pub fn clan(&self) -> &str {
        &self.clan
    }

    pub fn register_clan(&self, log: &mut CommandLog) {
        log.register_clan(&self.clan);
    }

    pub fn register_squad(&mut self, participant: SquadParticipant) {
        self.participants.insert(participant.squad_id, participant);
    }

    pub fn is_registered(&self, squad_id: SquadId) -> bool {
        self.participants.contains_key(&squad_id)
    }

    pub fn squad_ids(&self) -> Vec<SquadId> {
        self.participants.keys().copied().collect()
    }

    /// Deliver one order. Returns the log entry, or None when dropped.
    pub fn send_command_to_squad(
        &self,
        clan: &mut Clan,
        log: &mut CommandLog,
        field: &FieldConfig,
        request: &CommandRequest,
        now: DateTime<Utc>,
    ) -> Option<CommandLogEntry> {
        if !self.is_registered(request.squad_id) {
            log::warn!("order for unregistered squad {}/{} dropped", self.clan, request.squad_id);
            return None;
        }
        let Some(squad) = clan.squad_mut(request.squad_id) else {
            log::warn!("registered squad {}/{} no longer exists; order dropped", self.clan, request.squad_id);
            return None;
        };

        let steps = request.steps.max(1);
        for unit in squad.units.iter_mut() {
            execute_unit_action(unit, request.kind, field, steps);
        }
        if request.kind != CommandKind::Fight {
            squad.shift_x(request.kind.delta(steps), field);
        }

        let entry = CommandLogEntry::routed(now, &self.clan, squad, request.kind);
        log.append(entry.clone());
        Some(entry)
    }

    /// Deliver a copy of `request` to every registered squad, in id order.
    pub fn broadcast_command_to_all(
        &self,
        clan: &mut Clan,
        log: &mut CommandLog,
        field: &FieldConfig,
        request: &CommandRequest,
        now: DateTime<Utc>,
    ) -> Vec<CommandLogEntry> {
        self.participants
            .keys()
            .filter_map(|&id| self.send_command_to_squad(clan, log, field, &request.readdressed(id), now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        squad::Squad,
        types::Position,
        unit::{HealthState, Unit},
    };
    use chrono::TimeZone;

    fn stamp() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).single().unwrap()
    }

    fn field() -> FieldConfig {
        FieldConfig { width: 20, height: 6 }
    }

    fn clan() -> Clan {
        let mut clan = Clan::new("Red");
        for sid in 1..=2 {
            let mut squad = Squad::new(sid, "goblin", Position::new(5, sid as i32));
            for uid in 1..=3 {
                squad.units.push(Unit::new(sid * 10 + uid, "g", Position::new(5, sid as i32)));
            }
            clan.squads.push(squad);
        }
        clan
    }

    fn request(squad_id: SquadId, kind: CommandKind, steps: u32) -> CommandRequest {
        CommandRequest::new("Red", squad_id, kind, stamp(), "", steps)
    }

    #[test]
    fn forward_moves_units_and_squad_by_steps() {
        let mut clan = clan();
        let mut log = CommandLog::new();
        let router = CommandRouter::for_clan(&clan, &mut log);

        let entry = router
            .send_command_to_squad(&mut clan, &mut log, &field(), &request(1, CommandKind::Forward, 3), stamp())
            .unwrap();
        assert_eq!(entry.summary, "moved to (8,1)");
        assert_eq!(entry.affected, 3);
        assert!(clan.squads[0].units.iter().all(|u| u.position.x == 8));
        assert_eq!(clan.squads[1].position.x, 5);
        assert_eq!(log.clans(), ["Red".to_string()]);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn fight_summary_reports_total_squad_actions() {
        let mut clan = clan();
        let mut log = CommandLog::new();
        let router = CommandRouter::for_clan(&clan, &mut log);
        let fight = request(1, CommandKind::Fight, 1);

        router.send_command_to_squad(&mut clan, &mut log, &field(), &fight, stamp()).unwrap();
        let entry = router.send_command_to_squad(&mut clan, &mut log, &field(), &fight, stamp()).unwrap();
        assert_eq!(entry.summary, "units fighting: 6 actions");
        assert_eq!(entry.affected, 3);
        assert_eq!(clan.squads[0].position.x, 5);
    }

    #[test]
    fn out_of_battle_units_stay_put_but_count_as_affected() {
        let mut clan = clan();
        clan.squads[0].units[2].state = HealthState::OutOfBattle;
        let mut log = CommandLog::new();
        let router = CommandRouter::for_clan(&clan, &mut log);

        let entry = router
            .send_command_to_squad(&mut clan, &mut log, &field(), &request(1, CommandKind::Fight, 1), stamp())
            .unwrap();
        assert_eq!(entry.summary, "units fighting: 2 actions");
        assert_eq!(entry.affected, 3);
        assert_eq!(clan.squads[0].units[2].actions, 0);
    }

    #[test]
    fn huge_step_counts_move_the_squad_to_the_edge() {
        let mut clan = clan();
        let mut log = CommandLog::new();
        let router = CommandRouter::for_clan(&clan, &mut log);

        let entry = router
            .send_command_to_squad(&mut clan, &mut log, &field(), &request(1, CommandKind::Forward, u32::MAX), stamp())
            .unwrap();
        assert_eq!(entry.summary, "moved to (19,1)");
        assert!(clan.squads[0].units.iter().all(|u| u.position.x == 19));

        let entry = router
            .send_command_to_squad(&mut clan, &mut log, &field(), &request(2, CommandKind::Forward, i32::MAX as u32), stamp())
            .unwrap();
        assert_eq!(entry.summary, "moved to (19,2)");

        router.broadcast_command_to_all(&mut clan, &mut log, &field(), &request(1, CommandKind::Backward, u32::MAX), stamp());
        assert!(clan.units().all(|u| u.position.x == 0));
        assert!(clan.squads.iter().all(|s| s.position.x == 0));
    }

    #[test]
    fn unregistered_squad_changes_nothing() {
        let mut clan = clan();
        let mut log = CommandLog::new();
        let router = CommandRouter::for_clan(&clan, &mut log);
        let before_clan = clan.clone();
        let before_log = log.clone();

        let outcome =
            router.send_command_to_squad(&mut clan, &mut log, &field(), &request(9, CommandKind::Forward, 1), stamp());
        assert!(outcome.is_none());
        assert_eq!(clan, before_clan);
        assert_eq!(log, before_log);
    }

    #[test]
    fn broadcast_logs_once_per_squad_with_same_steps() {
        let mut clan = clan();
        let mut log = CommandLog::new();
        let router = CommandRouter::for_clan(&clan, &mut log);

        let entries =
            router.broadcast_command_to_all(&mut clan, &mut log, &field(), &request(1, CommandKind::Backward, 2), stamp());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].summary, "moved to (3,1)");
        assert_eq!(entries[1].summary, "moved to (3,2)");
        assert_eq!(log.len(), 2);
        assert!(clan.units().all(|u| u.position.x == 3));
    }
}
