//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine reaches it through `MappingRepository`; nothing else
//! executes SQL. Every appended batch is written in one transaction.

mod assignment;
mod event_log;
mod role;
mod worker;

use crate::{
    error::{MappingError, MappingResult},
    event::{MappingEvent, RecordedEvent},
    repository::MappingRepository,
    snapshot::Snapshot,
    types::WorkerKind,
};
use rusqlite::Connection;
use std::fmt::Display;
use std::str::FromStr;

pub struct MappingStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl MappingStore {
    pub fn open(path: &str) -> MappingResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> MappingResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    pub fn reopen(&self) -> MappingResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order. Safe to run on every open.
    pub fn migrate(&self) -> MappingResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_pool.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_assignment.sql"))?;
        Ok(())
    }

    /// Seed or overwrite pool data from an inbound feed. Workers and roles
    /// are upserted; assignments are inserted when not already present.
    /// A worker's `current_workload` is outside workload, so re-importing
    /// the feed never disturbs what the board has committed.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> MappingResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for worker in &snapshot.workers {
            self.upsert_worker(worker)?;
        }
        for role in &snapshot.roles {
            self.upsert_role(role)?;
        }
        for assignment in &snapshot.assignments {
            if self.get_assignment(&assignment.assignment_id)?.is_none() {
                self.insert_assignment(assignment)?;
            }
        }
        tx.commit()?;
        log::info!(
            "store: imported {} workers, {} roles, {} assignments",
            snapshot.workers.len(),
            snapshot.roles.len(),
            snapshot.assignments.len()
        );
        Ok(())
    }

    /// Write one event's effect onto the pool tables.
    fn project(&self, event: &MappingEvent) -> MappingResult<()> {
        match event {
            MappingEvent::AssignmentCreated { assignment, .. } => self.insert_assignment(assignment),
            MappingEvent::AssignmentRemoved { assignment, .. } => {
                self.delete_assignment(&assignment.assignment_id)
            }
            MappingEvent::AssignmentStatusChanged { assignment_id, to, .. } => {
                self.update_assignment_status(assignment_id, *to)
            }
            MappingEvent::RoleClosed { role_id, .. } => self.close_role(role_id),
            MappingEvent::WorkerActivationChanged { worker_id, active } => {
                self.update_worker_active(worker_id, *active)
            }
            // The ledger is rebuilt from live assignments on load.
            MappingEvent::WorkloadChanged { .. } | MappingEvent::SnapshotLoaded { .. } => Ok(()),
        }
    }
}

impl MappingRepository for MappingStore {
    fn load(&self, kind: WorkerKind) -> MappingResult<Snapshot> {
        Ok(Snapshot {
            workers:     self.workers_of_kind(kind)?,
            roles:       self.roles_of_kind(kind)?,
            assignments: self.assignments_for_kind(kind)?,
        })
    }

    fn append(&mut self, batch: &[RecordedEvent]) -> MappingResult<()> {
        // Dropping the transaction on an early return rolls the batch back.
        let tx = self.conn.unchecked_transaction()?;
        for recorded in batch {
            self.append_event(&recorded.to_log_entry()?)?;
            self.project(&recorded.event)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn last_sequence(&self, kind: WorkerKind) -> MappingResult<u64> {
        self.max_sequence(kind)
    }
}

/// Parse a text column back into its typed form.
fn parse_column<T>(table: &'static str, column: &'static str, text: &str) -> MappingResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    text.parse::<T>().map_err(|e| MappingError::CorruptRecord {
        table,
        column,
        reason: format!("'{text}': {e}"),
    })
}
