//! Repository seam between the engine and whatever persists its state.
//!
//! RULE: The engine never reads or writes storage except through
//! `MappingRepository`. `append` receives every event of one mutation
//! as a single batch and must apply all of it or none of it.

use crate::{
    error::{MappingError, MappingResult},
    event::RecordedEvent,
    snapshot::Snapshot,
    types::WorkerKind,
};

pub trait MappingRepository {
    /// Current workers (of `kind`), roles, and their assignments.
    fn load(&self, kind: WorkerKind) -> MappingResult<Snapshot>;

    /// Persist one mutation's events, in order.
    fn append(&mut self, batch: &[RecordedEvent]) -> MappingResult<()>;

    /// Highest sequence number recorded for `kind`, 0 when none.
    fn last_sequence(&self, kind: WorkerKind) -> MappingResult<u64>;
}

/// In-process repository. Keeps the full event log and a snapshot kept
/// current by projecting each appended event.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    snapshot: Snapshot,
    log:      Vec<RecordedEvent>,
    offline:  bool,
}

impl MemoryRepository {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot, log: Vec::new(), offline: false }
    }

    /// While offline every append fails and nothing is recorded.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.log
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Replace the upstream data, as an external feed update would.
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
    }
}

impl MappingRepository for MemoryRepository {
    fn load(&self, kind: WorkerKind) -> MappingResult<Snapshot> {
        Ok(self.snapshot.clone().for_kind(kind))
    }

    fn append(&mut self, batch: &[RecordedEvent]) -> MappingResult<()> {
        if self.offline {
            return Err(MappingError::Other(anyhow::anyhow!(
                "repository offline, {} events not written",
                batch.len()
            )));
        }
        for recorded in batch {
            self.snapshot.apply(&recorded.event);
        }
        self.log.extend_from_slice(batch);
        Ok(())
    }

    fn last_sequence(&self, kind: WorkerKind) -> MappingResult<u64> {
        Ok(self
            .log
            .iter()
            .filter(|e| e.pool == kind)
            .map(|e| e.sequence)
            .max()
            .unwrap_or(0))
    }
}
