//! Snapshots: the inbound data feed and the outbound board views.
//!
//! `Snapshot` is what a repository hands the engine on load/refresh.
//! `WorkerSnapshot` and `RoleSnapshot` are what the presentation layer
//! renders after every intent.

use crate::{
    assignment_store::Assignment,
    event::MappingEvent,
    role::RoleRequisition,
    types::{
        Availability, ClientId, FulfillmentStatus, Percent, Priority, RoleId,
        WorkerId, WorkerKind,
    },
    worker::WorkerProfile,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub workers:     Vec<WorkerProfile>,
    pub roles:       Vec<RoleRequisition>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Snapshot {
    /// Restrict to one pool: its workers, its roles, and the assignments
    /// between them.
    pub fn for_kind(mut self, kind: WorkerKind) -> Self {
        self.workers.retain(|w| w.kind == kind);
        self.roles.retain(|r| r.pool == kind);
        let workers: BTreeSet<&str> = self.workers.iter().map(|w| w.worker_id.as_str()).collect();
        let roles: BTreeSet<&str> = self.roles.iter().map(|r| r.role_id.as_str()).collect();
        self.assignments.retain(|a| {
            workers.contains(a.worker_id.as_str()) && roles.contains(a.role_id.as_str())
        });
        self
    }

    /// Project a committed event onto this snapshot, the way a persistence
    /// sink would.
    pub fn apply(&mut self, event: &MappingEvent) {
        match event {
            MappingEvent::AssignmentCreated { assignment, .. } => {
                self.assignments.retain(|a| a.assignment_id != assignment.assignment_id);
                self.assignments.push(assignment.clone());
            }
            MappingEvent::AssignmentRemoved { assignment, .. } => {
                self.assignments.retain(|a| a.assignment_id != assignment.assignment_id);
            }
            MappingEvent::AssignmentStatusChanged { assignment_id, to, .. } => {
                if let Some(a) = self.assignments.iter_mut().find(|a| &a.assignment_id == assignment_id) {
                    a.status = *to;
                }
            }
            MappingEvent::RoleClosed { role_id, .. } => {
                if let Some(r) = self.roles.iter_mut().find(|r| &r.role_id == role_id) {
                    r.closed = true;
                }
            }
            MappingEvent::WorkerActivationChanged { worker_id, active } => {
                if let Some(w) = self.workers.iter_mut().find(|w| &w.worker_id == worker_id) {
                    w.active = *active;
                }
            }
            // Profiles carry outside workload only; the ledger rebuilds
            // the rest from the assignments on load.
            MappingEvent::WorkloadChanged { .. } | MappingEvent::SnapshotLoaded { .. } => {}
        }
    }
}

/// A pool member as the board renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    pub worker_id:         WorkerId,
    pub kind:              WorkerKind,
    pub name:              String,
    pub skills:            BTreeSet<String>,
    pub years_experience:  u32,
    pub availability:      Availability,
    pub performance_score: u32,
    pub location:          String,
    pub timezone:          String,
    pub active:            bool,
    pub committed:         Percent,
    pub max_capacity:      Percent,
    pub headroom:          Percent,
    /// Percent of capacity committed; drives the progress bar.
    pub utilisation:       f64,
    pub live_assignments:  usize,
}

/// A role as the board renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSnapshot {
    pub role_id:             RoleId,
    pub client_id:           ClientId,
    pub title:               String,
    pub required_headcount:  u32,
    pub required_skills:     BTreeSet<String>,
    pub priority:            Priority,
    pub due_date:            Option<NaiveDate>,
    pub closed:              bool,
    pub active_count:        usize,
    pub live_count:          usize,
    pub has_primary:         bool,
    pub status:              FulfillmentStatus,
    pub fulfillment_percent: f64,
}

impl RoleSnapshot {
    /// Live assignments already meet headcount.
    pub fn is_saturated(&self) -> bool {
        self.live_count >= self.required_headcount as usize
    }
}
