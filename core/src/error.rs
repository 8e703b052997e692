use crate::types::{
    AssignmentId, AssignmentType, LifecycleStatus, Percent, RoleId, WorkerId,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What an operation referenced when it reported `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Worker,
    Role,
    Assignment,
    Recommendation,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Worker => "worker",
            Self::Role => "role",
            Self::Assignment => "assignment",
            Self::Recommendation => "recommendation",
        })
    }
}

/// Lifecycle operations that can be refused for the record's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Confirm,
    Complete,
    Remove,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Confirm  => "confirm",
            Self::Complete => "complete",
            Self::Remove   => "remove",
        })
    }
}

/// Rejected mutations. Every variant is an expected outcome of UI
/// interaction and leaves prior state intact.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("Worker {worker_id} is already assigned to role {role_id} ({existing})")]
    DuplicateAssignment {
        worker_id: WorkerId,
        role_id: RoleId,
        existing: AssignmentId,
    },

    #[error(
        "Worker {worker_id} is at {current}% of {max_capacity}%; adding {requested}% would exceed capacity"
    )]
    CapacityExceeded {
        worker_id: WorkerId,
        current: Percent,
        requested: Percent,
        max_capacity: Percent,
    },

    #[error("Role {role_id} already has {live} of {required} required; {requested} assignments are not accepted")]
    RoleSaturated {
        role_id: RoleId,
        live: usize,
        required: u32,
        requested: AssignmentType,
    },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: EntityKind, id: String },

    #[error("Worker {worker_id} is deactivated")]
    WorkerInactive { worker_id: WorkerId },

    #[error("Role {role_id} is closed")]
    RoleClosed { role_id: RoleId },

    #[error("Cannot {action} assignment {assignment_id} while it is {from}")]
    InvalidTransition {
        assignment_id: AssignmentId,
        from: LifecycleStatus,
        action: LifecycleAction,
    },
}

impl AssignmentError {
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    /// Stable snake_case code for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateAssignment { .. } => "duplicate_assignment",
            Self::CapacityExceeded { .. }    => "capacity_exceeded",
            Self::RoleSaturated { .. }       => "role_saturated",
            Self::NotFound { .. }            => "not_found",
            Self::WorkerInactive { .. }      => "worker_inactive",
            Self::RoleClosed { .. }          => "role_closed",
            Self::InvalidTransition { .. }   => "invalid_transition",
        }
    }
}

#[derive(Error, Debug)]
pub enum MappingError {
    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt stored value in {table}.{column}: {reason}")]
    CorruptRecord {
        table: &'static str,
        column: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MappingError {
    /// The domain rejection, if this error is one.
    pub fn as_assignment(&self) -> Option<&AssignmentError> {
        match self {
            Self::Assignment(e) => Some(e),
            _ => None,
        }
    }
}

pub type MappingResult<T> = Result<T, MappingError>;
