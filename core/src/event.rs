//! The outbound event stream.
//!
//! RULE: Every committed mutation is described by events, and a
//! repository that applies those events in order reproduces the
//! engine's state. Nothing else reaches the persistence sink.

use crate::{
    assignment_store::{Assignment, AssignmentChange, StatusChange},
    error::MappingResult,
    types::{
        AssignmentId, FulfillmentStatus, LifecycleStatus, Percent, RoleId, WorkerId, WorkerKind,
    },
    workload_ledger::WorkloadChange,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MappingEvent {
    SnapshotLoaded {
        pool:        WorkerKind,
        workers:     usize,
        roles:       usize,
        assignments: usize,
    },
    AssignmentCreated {
        assignment:                Assignment,
        resulting_worker_workload: Percent,
        resulting_role_status:     FulfillmentStatus,
    },
    AssignmentRemoved {
        assignment:                Assignment,
        resulting_worker_workload: Percent,
        resulting_role_status:     FulfillmentStatus,
    },
    /// Progress-bar feed.
    WorkloadChanged {
        worker_id:    WorkerId,
        previous:     Percent,
        current:      Percent,
        max_capacity: Percent,
    },
    AssignmentStatusChanged {
        assignment_id:         AssignmentId,
        worker_id:             WorkerId,
        role_id:               RoleId,
        from:                  LifecycleStatus,
        to:                    LifecycleStatus,
        resulting_role_status: FulfillmentStatus,
    },
    RoleClosed {
        role_id:   RoleId,
        completed: usize,
        dropped:   usize,
    },
    WorkerActivationChanged {
        worker_id: WorkerId,
        active:    bool,
    },
}

impl MappingEvent {
    /// Stable name, used for the event_type column in event_log.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SnapshotLoaded { .. }          => "snapshot_loaded",
            Self::AssignmentCreated { .. }       => "assignment_created",
            Self::AssignmentRemoved { .. }       => "assignment_removed",
            Self::WorkloadChanged { .. }         => "workload_changed",
            Self::AssignmentStatusChanged { .. } => "assignment_status_changed",
            Self::RoleClosed { .. }              => "role_closed",
            Self::WorkerActivationChanged { .. } => "worker_activation_changed",
        }
    }

    pub fn workload_changed(change: &WorkloadChange) -> Self {
        Self::WorkloadChanged {
            worker_id:    change.worker_id.clone(),
            previous:     change.previous,
            current:      change.current,
            max_capacity: change.max_capacity,
        }
    }

    /// Ledger movement first, then the record itself.
    pub fn for_created(change: &AssignmentChange) -> Vec<Self> {
        vec![
            Self::workload_changed(&change.workload),
            Self::AssignmentCreated {
                assignment:                change.assignment.clone(),
                resulting_worker_workload: change.workload.current,
                resulting_role_status:     change.role_status,
            },
        ]
    }

    pub fn for_removed(change: &AssignmentChange) -> Vec<Self> {
        vec![
            Self::workload_changed(&change.workload),
            Self::AssignmentRemoved {
                assignment:                change.assignment.clone(),
                resulting_worker_workload: change.workload.current,
                resulting_role_status:     change.role_status,
            },
        ]
    }

    pub fn for_status(change: &StatusChange) -> Vec<Self> {
        let mut events: Vec<Self> = change.workload.iter().map(Self::workload_changed).collect();
        events.push(Self::AssignmentStatusChanged {
            assignment_id:         change.assignment.assignment_id.clone(),
            worker_id:             change.assignment.worker_id.clone(),
            role_id:               change.assignment.role_id.clone(),
            from:                  change.from,
            to:                    change.to,
            resulting_role_status: change.role_status,
        });
        events
    }

    /// The assignment carried by a create/remove event.
    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::AssignmentCreated { assignment, .. } | Self::AssignmentRemoved { assignment, .. } => {
                Some(assignment)
            }
            _ => None,
        }
    }
}

/// An event stamped by the engine, ready for a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub sequence:    u64,
    pub pool:        WorkerKind,
    pub recorded_at: DateTime<Utc>,
    pub event:       MappingEvent,
}

impl RecordedEvent {
    pub fn to_log_entry(&self) -> MappingResult<EventLogEntry> {
        Ok(EventLogEntry {
            id:          None,
            sequence:    self.sequence,
            pool:        self.pool,
            event_type:  self.event.event_type().to_string(),
            payload:     serde_json::to_string(&self.event)?,
            recorded_at: self.recorded_at,
        })
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:          Option<i64>,
    pub sequence:    u64,
    pub pool:        WorkerKind,
    pub event_type:  String,
    pub payload:     String, // JSON-serialized MappingEvent
    pub recorded_at: DateTime<Utc>,
}

impl EventLogEntry {
    pub fn decode(&self) -> MappingResult<MappingEvent> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}
