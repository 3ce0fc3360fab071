//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Callers hand over fully built rows or records; they never execute SQL.
//!
//! Every collection is saved whole: a save replaces what was stored in
//! a single transaction. A read returns `Ok(None)` when the table does
//! not exist yet, so callers can tell "missing" from "corrupt".

use crate::{
    command::ReversibleCommand,
    command_log::CommandLogEntry,
    error::SimResult,
};
use rusqlite::{params, Connection};
use serde::{de::DeserializeOwned, Serialize};

pub struct SimStore {
    conn: Connection,
}

/// Result of loading a collection into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    /// Nothing stored yet; the collection was reset to empty.
    Missing,
    /// Stored data was unreadable; the collection was left as it was.
    Corrupt(String),
}

/// A checkpoint as persisted: metadata columns plus the snapshot JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointRow {
    pub checkpoint_id: String,
    pub name:          String,
    pub created_at:    String,
    pub state_json:    String,
}

impl SimStore {
    /// Open (or create) the battle database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; in-memory ignores it.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    fn has_table(&self, table: &str) -> SimResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ── Checkpoints ────────────────────────────────────────────

    pub fn replace_checkpoints(&self, rows: &[CheckpointRow]) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM checkpoint", [])?;
        for row in rows {
            tx.execute(
                "INSERT INTO checkpoint (checkpoint_id, name, created_at, state_json)
                 VALUES (?1, ?2, ?3, ?4)",
                params![row.checkpoint_id, row.name, row.created_at, row.state_json],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn checkpoint_rows(&self) -> SimResult<Option<Vec<CheckpointRow>>> {
        if !self.has_table("checkpoint")? {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare(
            "SELECT checkpoint_id, name, created_at, state_json
             FROM checkpoint ORDER BY seq ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CheckpointRow {
                    checkpoint_id: row.get(0)?,
                    name:          row.get(1)?,
                    created_at:    row.get(2)?,
                    state_json:    row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(rows))
    }

    // ── Command log ────────────────────────────────────────────

    pub fn replace_command_log(&self, entries: &[CommandLogEntry]) -> SimResult<()> {
        self.replace_json_rows("command_log", entries)
    }

    pub fn command_log(&self) -> SimResult<Option<Vec<CommandLogEntry>>> {
        self.json_rows("command_log")
    }

    // ── Game-command history ───────────────────────────────────

    pub fn replace_command_history(&self, history: &[ReversibleCommand]) -> SimResult<()> {
        self.replace_json_rows("command_history", history)
    }

    pub fn command_history(&self) -> SimResult<Option<Vec<ReversibleCommand>>> {
        self.json_rows("command_history")
    }

    // `table` is always one of the fixed names above, never user input.
    fn replace_json_rows<T: Serialize>(&self, table: &str, items: &[T]) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        for item in items {
            tx.execute(
                &format!("INSERT INTO {table} (entry_json) VALUES (?1)"),
                params![serde_json::to_string(item)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn json_rows<T: DeserializeOwned>(&self, table: &str) -> SimResult<Option<Vec<T>>> {
        if !self.has_table(table)? {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare(&format!("SELECT entry_json FROM {table} ORDER BY seq ASC"))?;
        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let items = raw
            .iter()
            .map(|json| serde_json::from_str(json))
            .collect::<Result<Vec<T>, _>>()?;
        Ok(Some(items))
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> SimResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}
