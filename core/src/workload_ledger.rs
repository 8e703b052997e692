//! Workload ledger: each worker's committed percentage against capacity.
//!
//! RULE: Only the ledger mutates committed workload.
//! `reserve` either fits entirely or changes nothing.
//! `release` never drives a worker below zero.

use crate::{
    error::{AssignmentError, EntityKind},
    types::{Percent, WorkerId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub committed:    Percent,
    pub max_capacity: Percent,
}

impl LedgerEntry {
    pub fn headroom(&self) -> Percent {
        self.max_capacity.saturating_sub(self.committed)
    }

    /// Committed share of capacity in percent. A zero-capacity worker
    /// is reported as fully utilised.
    pub fn utilisation(&self) -> f64 {
        if self.max_capacity == 0 {
            return 100.0;
        }
        self.committed as f64 * 100.0 / self.max_capacity as f64
    }
}

/// A "workload changed" notification for progress-bar rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadChange {
    pub worker_id:    WorkerId,
    pub previous:     Percent,
    pub current:      Percent,
    pub max_capacity: Percent,
}

#[derive(Debug, Clone, Default)]
pub struct WorkloadLedger {
    entries: BTreeMap<WorkerId, LedgerEntry>,
}

impl WorkloadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a worker. Replaces any existing entry.
    pub fn register(&mut self, worker_id: &str, committed: Percent, max_capacity: Percent) {
        if committed > max_capacity {
            log::warn!(
                "ledger: worker {worker_id} loaded at {committed}% above capacity {max_capacity}%"
            );
        }
        self.entries.insert(
            worker_id.to_string(),
            LedgerEntry { committed, max_capacity },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entry(&self, worker_id: &str) -> Option<&LedgerEntry> {
        self.entries.get(worker_id)
    }

    pub fn committed(&self, worker_id: &str) -> Option<Percent> {
        self.entry(worker_id).map(|e| e.committed)
    }

    pub fn headroom(&self, worker_id: &str) -> Option<Percent> {
        self.entry(worker_id).map(LedgerEntry::headroom)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&WorkerId, &LedgerEntry)> {
        self.entries.iter()
    }

    /// Capacity check without mutation. Returns the workload the worker
    /// would carry after reserving `percentage`.
    pub fn check(&self, worker_id: &str, percentage: Percent) -> Result<Percent, AssignmentError> {
        let entry = self
            .entry(worker_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Worker, worker_id))?;

        match entry.committed.checked_add(percentage) {
            Some(after) if after <= entry.max_capacity => Ok(after),
            _ => Err(AssignmentError::CapacityExceeded {
                worker_id:    worker_id.to_string(),
                current:      entry.committed,
                requested:    percentage,
                max_capacity: entry.max_capacity,
            }),
        }
    }

    pub fn reserve(
        &mut self,
        worker_id: &str,
        percentage: Percent,
    ) -> Result<WorkloadChange, AssignmentError> {
        let after = self.check(worker_id, percentage)?;
        let entry = self
            .entries
            .get_mut(worker_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Worker, worker_id))?;

        let previous = entry.committed;
        entry.committed = after;
        log::debug!("ledger: {worker_id} {previous}% -> {after}% (reserve {percentage}%)");

        Ok(WorkloadChange {
            worker_id: worker_id.to_string(),
            previous,
            current: after,
            max_capacity: entry.max_capacity,
        })
    }

    pub fn release(
        &mut self,
        worker_id: &str,
        percentage: Percent,
    ) -> Result<WorkloadChange, AssignmentError> {
        let entry = self
            .entries
            .get_mut(worker_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Worker, worker_id))?;

        let previous = entry.committed;
        if percentage > previous {
            log::warn!(
                "ledger: release of {percentage}% for {worker_id} exceeds committed {previous}%, flooring at 0"
            );
        }
        entry.committed = previous.saturating_sub(percentage);
        log::debug!("ledger: {worker_id} {previous}% -> {}% (release {percentage}%)", entry.committed);

        Ok(WorkloadChange {
            worker_id: worker_id.to_string(),
            previous,
            current: entry.committed,
            max_capacity: entry.max_capacity,
        })
    }
}
