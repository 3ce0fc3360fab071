//! Orders: the request shape, reversible commands, and the invoker.
//!
//! RULES:
//!   - The invoker executes queued commands strictly FIFO.
//!   - Undo is LIFO over the execution history, not the queue.
//!   - An undone command leaves history and is not re-queued.
//!   - Executing against an unknown squad is a no-op that still
//!     consumes the queue slot; its undo is a no-op too.

use crate::{
    config::BattleConfig,
    receiver::{SquadImage, TurnReceiver, TurnResult},
    rng::BattleRng,
    squad::{Clan, Squad},
    types::{CommandKind, SquadId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// An order addressed to one squad of one clan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandRequest {
    pub clan:       String,
    pub squad_id:   SquadId,
    pub kind:       CommandKind,
    pub created_at: DateTime<Utc>,
    pub note:       String,
    /// Always ≥ 1.
    pub steps:      u32,
}

impl CommandRequest {
    pub fn new(
        clan: impl Into<String>,
        squad_id: SquadId,
        kind: CommandKind,
        created_at: DateTime<Utc>,
        note: impl Into<String>,
        steps: u32,
    ) -> Self {
        Self {
            clan: clan.into(),
            squad_id,
            kind,
            created_at,
            note: note.into(),
            steps: steps.max(1),
        }
    }

    /// Copy of this request addressed to another squad.
    pub fn readdressed(&self, squad_id: SquadId) -> Self {
        Self { squad_id, ..self.clone() }
    }
}

/// Anything that can hand out a mutable squad by clan name and id.
pub trait SquadResolver {
    fn resolve_squad(&mut self, clan: &str, squad_id: SquadId) -> Option<&mut Squad>;
}

impl SquadResolver for Clan {
    fn resolve_squad(&mut self, clan: &str, squad_id: SquadId) -> Option<&mut Squad> {
        if self.name == clan {
            self.squad_mut(squad_id)
        } else {
            None
        }
    }
}

impl SquadResolver for [Clan] {
    fn resolve_squad(&mut self, clan: &str, squad_id: SquadId) -> Option<&mut Squad> {
        self.iter_mut()
            .find(|c| c.name == clan)
            .and_then(|c| c.squad_mut(squad_id))
    }
}

/// A command that remembers the squad's pre-image so it can be undone.
/// Doubles as the game-command history record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReversibleCommand {
    pub name:       String,
    pub clan:       String,
    pub squad_id:   SquadId,
    pub kind:       CommandKind,
    pub created_at: DateTime<Utc>,
    pub pre_image:  Option<SquadImage>,
    pub result:     Option<TurnResult>,
}

impl ReversibleCommand {
    pub fn new(clan: impl Into<String>, squad_id: SquadId, kind: CommandKind, created_at: DateTime<Utc>) -> Self {
        Self {
            name: kind.label().to_string(),
            clan: clan.into(),
            squad_id,
            kind,
            created_at,
            pre_image: None,
            result: None,
        }
    }

    pub fn from_request(request: &CommandRequest) -> Self {
        Self::new(request.clan.clone(), request.squad_id, request.kind, request.created_at)
    }

    /// Capture the pre-image, then run the turn receiver.
    /// Returns None when the squad cannot be resolved.
    pub fn execute<R>(&mut self, squads: &mut R, config: &BattleConfig, rng: &mut BattleRng) -> Option<TurnResult>
    where
        R: SquadResolver + ?Sized,
    {
        let Some(squad) = squads.resolve_squad(&self.clan, self.squad_id) else {
            log::warn!("{} for unknown squad {}/{} ignored", self.name, self.clan, self.squad_id);
            return None;
        };
        let mut receiver = TurnReceiver::new(squad, config);
        self.pre_image = Some(receiver.capture());
        let result = receiver.apply(self.kind, rng);
        self.result = Some(result);
        Some(result)
    }

    /// Restore the captured pre-image. Returns false when there is nothing
    /// to restore.
    pub fn undo<R>(&mut self, squads: &mut R, config: &BattleConfig) -> bool
    where
        R: SquadResolver + ?Sized,
    {
        let Some(image) = self.pre_image.as_ref() else {
            return false;
        };
        let Some(squad) = squads.resolve_squad(&self.clan, self.squad_id) else {
            return false;
        };
        TurnReceiver::new(squad, config).restore(image);
        log::debug!("undid {} on squad {}/{}", self.name, self.clan, self.squad_id);
        true
    }
}

/// FIFO command queue plus a bounded LIFO undo history.
#[derive(Debug, Clone, Default)]
pub struct CommandInvoker {
    queue:   VecDeque<ReversibleCommand>,
    history: Vec<ReversibleCommand>,
    limit:   usize,
}

impl CommandInvoker {
    pub fn new(limit: usize) -> Self {
        Self { queue: VecDeque::new(), history: Vec::new(), limit: limit.max(1) }
    }

    pub fn enqueue(&mut self, command: ReversibleCommand) {
        self.queue.push_back(command);
    }

    /// Run the oldest queued command. Returns whether a command ran.
    pub fn execute_next<R>(&mut self, squads: &mut R, config: &BattleConfig, rng: &mut BattleRng) -> bool
    where
        R: SquadResolver + ?Sized,
    {
        let Some(mut command) = self.queue.pop_front() else {
            return false;
        };
        command.execute(squads, config, rng);
        self.push_history(command);
        true
    }

    /// Drain the queue. Returns how many commands ran.
    pub fn execute_all<R>(&mut self, squads: &mut R, config: &BattleConfig, rng: &mut BattleRng) -> usize
    where
        R: SquadResolver + ?Sized,
    {
        let mut ran = 0;
        while self.execute_next(squads, config, rng) {
            ran += 1;
        }
        ran
    }

    /// Undo and drop the most recent command. None means nothing to undo.
    pub fn undo_last<R>(&mut self, squads: &mut R, config: &BattleConfig) -> Option<ReversibleCommand>
    where
        R: SquadResolver + ?Sized,
    {
        let mut command = self.history.pop()?;
        command.undo(squads, config);
        Some(command)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.history.clear();
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn history(&self) -> &[ReversibleCommand] {
        &self.history
    }

    /// The most recently executed command.
    pub fn last(&self) -> Option<&ReversibleCommand> {
        self.history.last()
    }

    /// Replace the history wholesale, keeping only the newest `limit` entries.
    pub fn replace_history(&mut self, history: Vec<ReversibleCommand>) {
        self.history = history;
        self.trim();
    }

    fn push_history(&mut self, command: ReversibleCommand) {
        self.history.push(command);
        self.trim();
    }

    fn trim(&mut self) {
        if self.history.len() > self.limit {
            let excess = self.history.len() - self.limit;
            self.history.drain(..excess);
            log::debug!("undo history trimmed by {excess}");
        }
    }
}
