//! Session snapshots and named checkpoints.
//!
//! A snapshot captures the complete state needed to resume a battle:
//! both clans, turn, side to act, seed and stream position, the newest
//! game-command history, and the configuration.
//!
//! RULE: a snapshot owns all of its data. Taking one copies out of the
//! session; restoring one copies back in. Neither side can observe later
//! mutation of the other.

use crate::{
    command::ReversibleCommand,
    config::BattleConfig,
    error::{SimError, SimResult},
    rng::{BattleRng, RngSlot},
    session::GameSession,
    squad::Clan,
    store::{CheckpointRow, LoadOutcome, SimStore},
    types::{ClanSide, Turn},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub clan_a:    Clan,
    pub clan_b:    Clan,
    pub turn:      Turn,
    pub active:    ClanSide,
    pub seed:      u64,
    /// Battle stream position, so a restored session rolls the same values.
    pub rng_draws: u64,
    pub history:   Vec<ReversibleCommand>,
    pub config:    BattleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub id:         Uuid,
    pub name:       String,
    pub created_at: DateTime<Utc>,
    pub snapshot:   SessionSnapshot,
}

impl Checkpoint {
    fn to_row(&self) -> SimResult<CheckpointRow> {
        Ok(CheckpointRow {
            checkpoint_id: self.id.to_string(),
            name:          self.name.clone(),
            created_at:    self.created_at.to_rfc3339(),
            state_json:    serde_json::to_string(&self.snapshot)?,
        })
    }

    fn from_row(row: CheckpointRow) -> SimResult<Self> {
        let corrupt = |reason: String| SimError::CorruptCheckpoint { name: row.name.clone(), reason };
        let id = Uuid::parse_str(&row.checkpoint_id).map_err(|e| corrupt(e.to_string()))?;
        let created_at = row
            .created_at
            .parse::<DateTime<Utc>>()
            .map_err(|e| corrupt(e.to_string()))?;
        let snapshot: SessionSnapshot =
            serde_json::from_str(&row.state_json).map_err(|e| corrupt(e.to_string()))?;
        Ok(Self { id, name: row.name, created_at, snapshot })
    }
}

/// Id for the `sequence`-th checkpoint of a session, drawn from its own
/// stream so replays reproduce it.
fn checkpoint_id(session: &GameSession, sequence: u64) -> Uuid {
    let mixed = session.turn().rotate_left(21)
        ^ session.rng_draws().rotate_left(42)
        ^ sequence.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    let mut rng = BattleRng::new(session.seed() ^ mixed, RngSlot::Checkpoint);
    Uuid::from_u64_pair(rng.next_u64(), rng.next_u64())
}

/// Ordered collection of checkpoints, oldest first.
#[derive(Debug, Clone, Default)]
pub struct CheckpointStore {
    checkpoints: Vec<Checkpoint>,
    /// Checkpoints ever created or loaded; feeds id derivation.
    issued:      u64,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `session` under `name`. A blank name is replaced by one
    /// derived from the creation time.
    pub fn create_checkpoint(&mut self, session: &mut GameSession, name: &str) -> &Checkpoint {
        let created_at = session.clock.now();
        let name = match name.trim() {
            "" => format!("checkpoint-{}", created_at.format("%Y%m%d-%H%M%S")),
            trimmed => trimmed.to_string(),
        };
        let id = checkpoint_id(session, self.issued);
        self.issued += 1;
        let checkpoint = Checkpoint {
            id,
            name,
            created_at,
            snapshot: session.snapshot(),
        };
        log::info!(
            "checkpoint '{}' at turn {} ({} history entries)",
            checkpoint.name,
            checkpoint.snapshot.turn,
            checkpoint.snapshot.history.len()
        );
        self.checkpoints.push(checkpoint);
        &self.checkpoints[self.checkpoints.len() - 1]
    }

    /// Overwrite the live session with the checkpoint's state.
    pub fn restore_checkpoint(session: &mut GameSession, checkpoint: &Checkpoint) {
        session.restore(&checkpoint.snapshot);
        log::info!("restored checkpoint '{}' (turn {})", checkpoint.name, checkpoint.snapshot.turn);
    }

    /// Restore the newest checkpoint named `name`.
    pub fn restore_named(&self, session: &mut GameSession, name: &str) -> SimResult<()> {
        let checkpoint = self
            .find(name)
            .ok_or_else(|| SimError::CheckpointNotFound { name: name.to_string() })?;
        Self::restore_checkpoint(session, checkpoint);
        Ok(())
    }

    /// Newest checkpoint with this name.
    pub fn find(&self, name: &str) -> Option<&Checkpoint> {
        self.checkpoints.iter().rev().find(|c| c.name == name)
    }

    /// Remove every checkpoint with this name. Returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.checkpoints.len();
        self.checkpoints.retain(|c| c.name != name);
        before - self.checkpoints.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.checkpoints.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Replace the stored collection with this one.
    pub fn save(&self, store: &SimStore) -> SimResult<()> {
        let rows = self
            .checkpoints
            .iter()
            .map(Checkpoint::to_row)
            .collect::<SimResult<Vec<_>>>()?;
        store.replace_checkpoints(&rows)?;
        log::debug!("saved {} checkpoints", rows.len());
        Ok(())
    }

    /// Load the stored collection.
    ///
    /// Missing store → empty collection. Unreadable store or any corrupt
    /// row → warning, in-memory collection unchanged.
    pub fn load(&mut self, store: &SimStore) -> LoadOutcome {
        let rows = match store.checkpoint_rows() {
            Ok(Some(rows)) => rows,
            Ok(None) => {
                self.checkpoints.clear();
                return LoadOutcome::Missing;
            }
            Err(e) => {
                log::warn!("checkpoint store unreadable, keeping {} in memory: {e}", self.len());
                return LoadOutcome::Corrupt(e.to_string());
            }
        };
        match rows.into_iter().map(Checkpoint::from_row).collect::<SimResult<Vec<_>>>() {
            Ok(loaded) => {
                let n = loaded.len();
                self.checkpoints = loaded;
                self.issued = self.issued.max(n as u64);
                LoadOutcome::Loaded(n)
            }
            Err(e) => {
                log::warn!("checkpoint store corrupt, keeping {} in memory: {e}", self.len());
                LoadOutcome::Corrupt(e.to_string())
            }
        }
    }
}
