//! The command log: append-only record of every delivered order.
//!
//! RULE: entries are never edited or removed once appended.

use crate::{
    receiver::TurnResult,
    squad::Squad,
    types::{CommandKind, SquadId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandLogEntry {
    pub timestamp:  DateTime<Utc>,
    pub clan:       String,
    pub squad_id:   SquadId,
    pub squad_kind: String,
    pub kind:       CommandKind,
    pub affected:   usize,
    pub summary:    String,
}

impl CommandLogEntry {
    /// Entry for a routed order, after delivery. Every unit of the squad
    /// counts as affected; a Fight reports the squad's total actions.
    pub fn routed(timestamp: DateTime<Utc>, clan: &str, squad: &Squad, kind: CommandKind) -> Self {
        let summary = match kind {
            CommandKind::Fight => {
                let actions: u64 = squad.units.iter().map(|u| u64::from(u.actions)).sum();
                format!("units fighting: {actions} actions")
            }
            CommandKind::Forward | CommandKind::Backward => {
                format!("moved to ({},{})", squad.position.x, squad.position.y)
            }
        };
        Self {
            timestamp,
            clan: clan.to_string(),
            squad_id: squad.id,
            squad_kind: squad.kind.clone(),
            kind,
            affected: squad.units.len(),
            summary,
        }
    }

    /// Entry for a reversible order, from its turn result.
    pub fn executed(timestamp: DateTime<Utc>, clan: &str, squad: &Squad, kind: CommandKind, result: &TurnResult) -> Self {
        let summary = match kind {
            CommandKind::Fight => format!(
                "units fighting: {} actions (wounded {}, out {})",
                result.affected, result.wounded, result.out_of_battle
            ),
            CommandKind::Forward | CommandKind::Backward => format!(
                "moved to ({},{}) (recovered {})",
                squad.position.x, squad.position.y, result.recovered
            ),
        };
        Self {
            timestamp,
            clan: clan.to_string(),
            squad_id: squad.id,
            squad_kind: squad.kind.clone(),
            kind,
            affected: result.affected,
            summary,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommandLog {
    clans:   Vec<String>,
    entries: Vec<CommandLogEntry>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a clan as a participant. Registering twice is harmless.
    pub fn register_clan(&mut self, clan: &str) {
        if !self.clans.iter().any(|c| c == clan) {
            self.clans.push(clan.to_string());
        }
    }

    pub fn clans(&self) -> &[String] {
        &self.clans
    }

    pub fn append(&mut self, entry: CommandLogEntry) {
        log::debug!("[{}] squad {} {}: {}", entry.clan, entry.squad_id, entry.kind.label(), entry.summary);
        self.entries.push(entry);
    }

    /// Swap in entries read back from persistence.
    pub(crate) fn replace_entries(&mut self, entries: Vec<CommandLogEntry>) {
        self.entries = entries;
    }

    pub fn entries(&self) -> &[CommandLogEntry] {
        &self.entries
    }

    pub fn entries_for_clan<'a>(&'a self, clan: &'a str) -> impl Iterator<Item = &'a CommandLogEntry> + 'a {
        self.entries.iter().filter(move |e| e.clan == clan)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{types::Position, unit::Unit};
    use chrono::TimeZone;

    fn stamp() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).single().unwrap()
    }

    #[test]
    fn routed_summaries_match_order_kind() {
        let mut squad = Squad::new(2, "troll", Position::new(7, 3));
        for (id, actions) in [(1, 3), (2, 1)] {
            let mut unit = Unit::new(id, "t", Position::new(7, 3));
            unit.actions = actions;
            squad.units.push(unit);
        }
        let fight = CommandLogEntry::routed(stamp(), "Red", &squad, CommandKind::Fight);
        assert_eq!(fight.summary, "units fighting: 4 actions");
        assert_eq!(fight.affected, 2);
        let moved = CommandLogEntry::routed(stamp(), "Red", &squad, CommandKind::Forward);
        assert_eq!(moved.summary, "moved to (7,3)");
        assert_eq!(moved.squad_kind, "troll");
    }

    #[test]
    fn register_clan_is_idempotent_and_entries_filter_by_clan() {
        let mut log = CommandLog::new();
        log.register_clan("Red");
        log.register_clan("Red");
        log.register_clan("Blue");
        assert_eq!(log.clans(), ["Red".to_string(), "Blue".to_string()]);

        let squad = Squad::new(1, "orc", Position::new(0, 0));
        log.append(CommandLogEntry::routed(stamp(), "Red", &squad, CommandKind::Fight));
        log.append(CommandLogEntry::routed(stamp(), "Blue", &squad, CommandKind::Fight));
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries_for_clan("Blue").count(), 1);
    }
}
