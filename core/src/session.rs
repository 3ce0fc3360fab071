//! The game session: the heart of a clan battle.
//!
//! A session owns both clans, the turn clock, the single battle RNG
//! stream, the reversible-command invoker (whose history doubles as the
//! game-command history), the shared command log, and one router per clan.
//!
//! TURN ORDER (fixed):
//!   1. For each squad of the active clan, in list order:
//!      assess → decide → issue (reversible) → log.
//!   2. End turn: turn index + 1, active side flips.
//!
//! RULES:
//!   - All randomness flows through `rng`, one shared stream.
//!   - Leader orders are refused unless they come from the clan's leader.
//!   - Orders for unknown clans or squads are dropped with a warning.
//!   - Routers are derived state and are rebuilt whenever clans change.

use crate::{
    checkpoint::SessionSnapshot,
    clock::TurnClock,
    command::{CommandInvoker, CommandRequest, ReversibleCommand},
    command_log::{CommandLog, CommandLogEntry},
    config::BattleConfig,
    decision::{DecisionChain, DecisionContext, SituationFlags},
    error::SimResult,
    generator::ClanGenerator,
    receiver::TurnResult,
    rng::{BattleRng, RngSlot},
    router::CommandRouter,
    squad::{Clan, HealthSummary},
    store::{LoadOutcome, SimStore},
    types::{ClanSide, CommandKind, SquadId, Turn, UnitId},
};
use serde::{Deserialize, Serialize};

pub struct GameSession {
    pub clock:   TurnClock,
    clans:       [Clan; 2],
    seed:        u64,
    config:      BattleConfig,
    rng:         BattleRng,
    invoker:     CommandInvoker,
    command_log: CommandLog,
    routers:     [CommandRouter; 2],
    chain:       DecisionChain,
}

/// One squad's order within an autonomous turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssuedOrder {
    pub squad_id: SquadId,
    pub kind:     CommandKind,
    pub result:   Option<TurnResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnReport {
    pub turn:   Turn,
    pub side:   ClanSide,
    pub orders: Vec<IssuedOrder>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub turn:    Turn,
    pub active:  ClanSide,
    pub clan_a:  (String, HealthSummary),
    pub clan_b:  (String, HealthSummary),
    pub history: usize,
    pub log:     usize,
}

fn index(side: ClanSide) -> usize {
    match side {
        ClanSide::A => 0,
        ClanSide::B => 1,
    }
}

impl GameSession {
    pub fn new(seed: u64, config: BattleConfig, clan_a: Clan, mut clan_b: Clan) -> Self {
        let config = config.normalized();
        if clan_a.name == clan_b.name {
            log::warn!("both clans are named '{}'; renaming the second", clan_b.name);
            clan_b.name = format!("{} II", clan_b.name);
        }
        let mut command_log = CommandLog::new();
        let routers = [
            CommandRouter::for_clan(&clan_a, &mut command_log),
            CommandRouter::for_clan(&clan_b, &mut command_log),
        ];
        Self {
            clock: TurnClock::wall(),
            clans: [clan_a, clan_b],
            seed,
            rng: BattleRng::new(seed, RngSlot::Battle),
            invoker: CommandInvoker::new(config.undo_limit),
            command_log,
            routers,
            chain: DecisionChain::standard(),
            config,
        }
    }

    /// Build a session with freshly generated clans.
    pub fn generate(seed: u64, config: BattleConfig, name_a: &str, name_b: &str) -> Self {
        let config = config.normalized();
        let (a, b) = ClanGenerator::generate_pair(seed, name_a, name_b, &config);
        Self::new(seed, config, a, b)
    }

    pub fn with_clock(mut self, clock: TurnClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_chain(mut self, chain: DecisionChain) -> Self {
        self.chain = chain;
        self
    }

    // ── Read-only views ────────────────────────────────────────

    pub fn clan(&self, side: ClanSide) -> &Clan {
        &self.clans[index(side)]
    }

    pub fn side_of(&self, clan: &str) -> Option<ClanSide> {
        [ClanSide::A, ClanSide::B].into_iter().find(|&side| self.clan(side).name == clan)
    }

    pub fn turn(&self) -> Turn {
        self.clock.turn
    }

    pub fn active_side(&self) -> ClanSide {
        self.clock.active
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Game-command history, oldest first.
    pub fn history(&self) -> &[ReversibleCommand] {
        self.invoker.history()
    }

    pub fn command_log(&self) -> &CommandLog {
        &self.command_log
    }

    pub fn summary(&self) -> SessionSummary {
        let a = self.clan(ClanSide::A);
        let b = self.clan(ClanSide::B);
        SessionSummary {
            turn: self.turn(),
            active: self.active_side(),
            clan_a: (a.name.clone(), a.health_summary()),
            clan_b: (b.name.clone(), b.health_summary()),
            history: self.history().len(),
            log: self.command_log.len(),
        }
    }

    /// The surviving side once the other clan is fully out of battle.
    pub fn winner(&self) -> Option<ClanSide> {
        match (self.clan(ClanSide::A).is_defeated(), self.clan(ClanSide::B).is_defeated()) {
            (false, true) => Some(ClanSide::A),
            (true, false) => Some(ClanSide::B),
            _ => None,
        }
    }

    // ── Orders ─────────────────────────────────────────────────

    /// Execute an order through the reversible path and log it.
    /// Returns None when the clan or squad is unknown.
    pub fn issue_command(&mut self, request: CommandRequest) -> Option<TurnResult> {
        let Some(side) = self.side_of(&request.clan) else {
            log::warn!("order for unknown clan '{}' dropped", request.clan);
            return None;
        };
        let idx = index(side);
        if self.clans[idx].squad(request.squad_id).is_none() {
            log::warn!("order for unknown squad {}/{} dropped", request.clan, request.squad_id);
            return None;
        }

        self.invoker.enqueue(ReversibleCommand::from_request(&request));
        self.invoker.execute_next(self.clans.as_mut_slice(), &self.config, &mut self.rng);
        let result = self.invoker.last().and_then(|c| c.result)?;

        let now = self.clock.now();
        let squad = self.clans[idx].squad(request.squad_id)?;
        let entry = CommandLogEntry::executed(now, &request.clan, squad, request.kind, &result);
        self.command_log.append(entry);
        Some(result)
    }

    /// Undo the most recent reversible order. False when history is empty.
    pub fn undo_last(&mut self) -> bool {
        match self.invoker.undo_last(self.clans.as_mut_slice(), &self.config) {
            Some(command) => {
                log::info!("undid {} for {}/{}", command.name, command.clan, command.squad_id);
                true
            }
            None => {
                log::debug!("nothing to undo");
                false
            }
        }
    }

    /// Deliver an order through the addressed clan's router.
    pub fn route_command(&mut self, request: &CommandRequest) -> Option<CommandLogEntry> {
        let Some(side) = self.side_of(&request.clan) else {
            log::warn!("routed order for unknown clan '{}' dropped", request.clan);
            return None;
        };
        let idx = index(side);
        let now = self.clock.now();
        self.routers[idx].send_command_to_squad(
            &mut self.clans[idx],
            &mut self.command_log,
            &self.config.field,
            request,
            now,
        )
    }

    /// Deliver a copy of an order to every squad of the addressed clan.
    pub fn broadcast_command(&mut self, request: &CommandRequest) -> Vec<CommandLogEntry> {
        let Some(side) = self.side_of(&request.clan) else {
            log::warn!("broadcast for unknown clan '{}' dropped", request.clan);
            return Vec::new();
        };
        let idx = index(side);
        let now = self.clock.now();
        self.routers[idx].broadcast_command_to_all(
            &mut self.clans[idx],
            &mut self.command_log,
            &self.config.field,
            request,
            now,
        )
    }

    // ── Leader orders ──────────────────────────────────────────

    fn is_leader(&self, side: ClanSide, leader_id: UnitId) -> bool {
        self.clan(side).leader.as_ref().is_some_and(|l| l.unit_id == leader_id)
    }

    /// Route a manual order on the leader's authority. None when
    /// `leader_id` is not the clan's leader or the squad is unknown.
    pub fn command_as_leader(
        &mut self,
        side: ClanSide,
        leader_id: UnitId,
        squad_id: SquadId,
        kind: CommandKind,
        steps: u32,
    ) -> Option<CommandLogEntry> {
        if !self.is_leader(side, leader_id) {
            log::warn!("unit {leader_id} is not the leader of {}; order refused", self.clan(side).name);
            return None;
        }
        let now = self.clock.now();
        let request =
            CommandRequest::new(self.clan(side).name.clone(), squad_id, kind, now, "order from the leader", steps);
        self.route_command(&request)
    }

    /// Run the decision chain for one squad and route the result.
    /// Refused without drawing when `leader_id` is not the clan's leader.
    pub fn issue_generated_command(
        &mut self,
        side: ClanSide,
        leader_id: UnitId,
        squad_id: SquadId,
    ) -> Option<CommandLogEntry> {
        if !self.is_leader(side, leader_id) {
            log::warn!("unit {leader_id} is not the leader of {}; generated order refused", self.clan(side).name);
            return None;
        }
        let request = self.decide(side, squad_id)?;
        self.route_command(&request)
    }

    /// `steps` rounds of generated orders for every squad of `side`, all
    /// through the router. Does not end the turn.
    pub fn run_command_series(&mut self, side: ClanSide, steps: u32) -> Vec<CommandLogEntry> {
        let Some(leader_id) = self.clan(side).leader.as_ref().map(|l| l.unit_id) else {
            log::warn!("{} has no leader; command series skipped", self.clan(side).name);
            return Vec::new();
        };
        let mut entries = Vec::new();
        for _ in 0..steps {
            for squad_id in self.clan(side).squad_ids() {
                entries.extend(self.issue_generated_command(side, leader_id, squad_id));
            }
        }
        log::debug!("command series for {}: {} orders", self.clan(side).name, entries.len());
        entries
    }

    // ── Autonomous play ────────────────────────────────────────

    /// Situational flags for one squad, read against the opposing clan.
    pub fn assess(&mut self, side: ClanSide, squad_id: SquadId) -> Option<SituationFlags> {
        let squad = self.clans[index(side)].squad(squad_id)?;
        let enemy = &self.clans[index(side.other())];
        Some(SituationFlags::assess(squad, enemy, &self.config, &mut self.rng))
    }

    /// Assess one squad and run the decision chain for it.
    pub fn decide(&mut self, side: ClanSide, squad_id: SquadId) -> Option<CommandRequest> {
        let flags = self.assess(side, squad_id)?;
        let now = self.clock.now();
        let clan = &self.clans[index(side)];
        let squad = clan.squad(squad_id)?;
        let mut ctx = DecisionContext {
            clan,
            squad,
            leader: clan.leader.as_ref(),
            rng: &mut self.rng,
            config: &self.config,
            flags,
            now,
        };
        self.chain.evaluate(&mut ctx).map(|(_, request)| request)
    }

    /// Let the active clan decide and act for every active squad, then
    /// end the turn.
    pub fn autonomous_turn(&mut self) -> TurnReport {
        let side = self.active_side();
        let mut report = TurnReport { turn: self.turn(), side, orders: Vec::new() };

        for squad_id in self.clan(side).squad_ids() {
            if self.clan(side).squad(squad_id).map_or(true, |s| s.is_defeated()) {
                continue;
            }
            let Some(request) = self.decide(side, squad_id) else {
                continue;
            };
            let kind = request.kind;
            let result = self.issue_command(request);
            report.orders.push(IssuedOrder { squad_id, kind, result });
        }

        self.end_turn();
        report
    }

    pub fn end_turn(&mut self) -> Turn {
        let turn = self.clock.end_turn();
        log::debug!("turn {turn}: {:?} to act", self.clock.active);
        turn
    }

    // ── Snapshot plumbing ──────────────────────────────────────

    /// Deep copy of all mutable game state. History keeps the newest
    /// `history_limit` entries.
    pub fn snapshot(&self) -> SessionSnapshot {
        let history = self.invoker.history();
        let keep = self.config.history_limit.min(history.len());
        SessionSnapshot {
            clan_a:    self.clans[0].clone(),
            clan_b:    self.clans[1].clone(),
            turn:      self.clock.turn,
            active:    self.clock.active,
            seed:      self.seed,
            rng_draws: self.rng.draws(),
            history:   history[history.len() - keep..].to_vec(),
            config:    self.config.clone(),
        }
    }

    /// Overwrite live state with copies of the snapshot's state.
    /// Pending orders are discarded; the command log is kept.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) {
        self.clans = [snapshot.clan_a.clone(), snapshot.clan_b.clone()];
        self.clock.turn = snapshot.turn;
        self.clock.active = snapshot.active;
        self.seed = snapshot.seed;
        self.rng = BattleRng::resume(snapshot.seed, RngSlot::Battle, snapshot.rng_draws);
        self.config = snapshot.config.clone().normalized();

        self.invoker = CommandInvoker::new(self.config.undo_limit);
        self.invoker.replace_history(snapshot.history.clone());

        self.routers = [
            CommandRouter::for_clan(&self.clans[0], &mut self.command_log),
            CommandRouter::for_clan(&self.clans[1], &mut self.command_log),
        ];
    }

    // ── Persistence ────────────────────────────────────────────

    /// Persist the command log and game-command history.
    pub fn save_records(&self, store: &SimStore) -> SimResult<()> {
        store.replace_command_log(self.command_log.entries())?;
        store.replace_command_history(self.invoker.history())?;
        Ok(())
    }

    /// Load the command log. Same missing/corrupt rules as the history.
    pub fn load_command_log(&mut self, store: &SimStore) -> LoadOutcome {
        match store.command_log() {
            Ok(Some(entries)) => {
                let n = entries.len();
                self.command_log.replace_entries(entries);
                LoadOutcome::Loaded(n)
            }
            Ok(None) => {
                self.command_log.replace_entries(Vec::new());
                LoadOutcome::Missing
            }
            Err(e) => {
                log::warn!("command log unreadable, keeping in-memory log: {e}");
                LoadOutcome::Corrupt(e.to_string())
            }
        }
    }

    /// Load the game-command history. Leaves the live history untouched
    /// unless the store holds a readable one.
    pub fn load_history(&mut self, store: &SimStore) -> LoadOutcome {
        match store.command_history() {
            Ok(Some(history)) => {
                let n = history.len();
                self.invoker.replace_history(history);
                LoadOutcome::Loaded(n)
            }
            Ok(None) => {
                self.invoker.replace_history(Vec::new());
                LoadOutcome::Missing
            }
            Err(e) => {
                log::warn!("command history unreadable, keeping in-memory history: {e}");
                LoadOutcome::Corrupt(e.to_string())
            }
        }
    }
}
