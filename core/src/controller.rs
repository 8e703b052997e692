//! Interaction controller: turns presentation intents into store
//! commands and store rejections into user-facing reasons.
//!
//! RULES:
//!   - Validation and commit are one synchronous step. A gesture that
//!     never reaches a target produces no command and no mutation.
//!   - A rejected intent is a normal outcome (`IntentOutcome::Rejected`),
//!     not an error. Only repository failures surface as `Err`.
//!   - Pointer handling stays in the presentation layer; the controller
//!     sees only (source, target) pairs.

use crate::{
    assignment_store::{Assignment, AssignmentStore},
    command::{DragDrop, Intent},
    engine::MappingEngine,
    error::{AssignmentError, EntityKind, LifecycleAction, MappingError, MappingResult},
    event::MappingEvent,
    repository::MappingRepository,
    types::{AssignmentType, LifecycleStatus, Percent, WorkerId},
};
use serde::{Deserialize, Serialize};

/// Why an intent was refused, with the values the UI needs to explain it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    Capacity {
        worker_id:    WorkerId,
        current:      Percent,
        after:        Percent,
        max_capacity: Percent,
    },
    Duplicate {
        existing_assignment_id: String,
    },
    Saturated {
        live:     usize,
        required: u32,
    },
    NotFound {
        entity: EntityKind,
        id:     String,
    },
    WorkerInactive {
        worker_id: WorkerId,
    },
    RoleClosed {
        role_id: String,
    },
    InvalidTransition {
        from:   LifecycleStatus,
        action: LifecycleAction,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub code:    String,
    pub message: String,
    pub reason:  RejectionReason,
    /// The UI's view is stale and should re-query before retrying.
    pub refresh_requested: bool,
}

impl From<&AssignmentError> for Rejection {
    fn from(err: &AssignmentError) -> Self {
        let reason = match err {
            AssignmentError::CapacityExceeded { worker_id, current, requested, max_capacity } => {
                RejectionReason::Capacity {
                    worker_id:    worker_id.clone(),
                    current:      *current,
                    after:        current.saturating_add(*requested),
                    max_capacity: *max_capacity,
                }
            }
            AssignmentError::DuplicateAssignment { existing, .. } => RejectionReason::Duplicate {
                existing_assignment_id: existing.clone(),
            },
            AssignmentError::RoleSaturated { live, required, .. } => RejectionReason::Saturated {
                live:     *live,
                required: *required,
            },
            AssignmentError::NotFound { entity, id } => RejectionReason::NotFound {
                entity: *entity,
                id:     id.clone(),
            },
            AssignmentError::WorkerInactive { worker_id } => RejectionReason::WorkerInactive {
                worker_id: worker_id.clone(),
            },
            AssignmentError::RoleClosed { role_id } => RejectionReason::RoleClosed {
                role_id: role_id.clone(),
            },
            AssignmentError::InvalidTransition { from, action, .. } => {
                RejectionReason::InvalidTransition { from: *from, action: *action }
            }
        };
        let message = match &reason {
            RejectionReason::Duplicate { .. } => format!("{err}. Nothing changed."),
            RejectionReason::NotFound { .. } => format!("{err}. Refresh the board and try again."),
            _ => err.to_string(),
        };
        Self {
            code: err.code().to_string(),
            message,
            refresh_requested: matches!(reason, RejectionReason::NotFound { .. }),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResult {
    pub worker_id: WorkerId,
    pub outcome:   Result<Assignment, Rejection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntentOutcome {
    Applied {
        events: Vec<MappingEvent>,
    },
    Bulk {
        results: Vec<BulkResult>,
        events:  Vec<MappingEvent>,
    },
    Rejected {
        rejection: Rejection,
    },
    Cancelled,
}

impl IntentOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. } | Self::Bulk { .. })
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected { rejection } => Some(rejection),
            _ => None,
        }
    }

    pub fn events(&self) -> &[MappingEvent] {
        match self {
            Self::Applied { events } | Self::Bulk { events, .. } => events.as_slice(),
            _ => &[],
        }
    }

    /// The first assignment created by this intent.
    pub fn created(&self) -> Option<&Assignment> {
        self.events().iter().find_map(|e| match e {
            MappingEvent::AssignmentCreated { assignment, .. } => Some(assignment),
            _ => None,
        })
    }
}

pub struct InteractionController;

impl InteractionController {
    /// `(source, target) -> intent`. No target means the drag was abandoned.
    pub fn resolve_drop(drag: DragDrop) -> Option<Intent> {
        let role_id = drag.target_id?;
        Some(Intent::DropWorkerOnRole { worker_id: drag.source_id, role_id })
    }

    /// Primary until the role has a live primary, secondary afterwards.
    pub fn drop_type(store: &AssignmentStore, role_id: &str) -> AssignmentType {
        if store.has_live_primary(role_id) {
            AssignmentType::Secondary
        } else {
            AssignmentType::Primary
        }
    }
}

impl<R: MappingRepository> MappingEngine<R> {
    pub fn dispatch(&mut self, intent: Intent) -> MappingResult<IntentOutcome> {
        log::debug!("controller: {} intent on {} board", intent.name(), self.kind.label());
        match intent {
            Intent::DropWorkerOnRole { worker_id, role_id } => {
                self.drop_worker_on_role(&worker_id, &role_id)
            }
            Intent::BulkAssign { worker_ids, role_id } => self.bulk_assign_intent(&worker_ids, &role_id),
            Intent::Unassign { assignment_id } => {
                let result = self.remove_assignment(&assignment_id);
                self.settle(result)
            }
            Intent::ApplyRecommendation { recommendation_id } => {
                self.apply_recommendation(&recommendation_id)
            }
            Intent::ConfirmAssignment { assignment_id } => {
                let result = self.confirm_assignment(&assignment_id);
                self.settle(result)
            }
            Intent::CloseRole { role_id } => {
                let result = self.close_role(&role_id);
                self.settle(result)
            }
        }
    }

    pub fn drag_and_drop(&mut self, drag: DragDrop) -> MappingResult<IntentOutcome> {
        let source = drag.source_id.clone();
        match InteractionController::resolve_drop(drag) {
            Some(intent) => self.dispatch(intent),
            None => {
                log::debug!("controller: drag of {source} released outside any role, cancelled");
                Ok(IntentOutcome::Cancelled)
            }
        }
    }

    pub fn drop_worker_on_role(&mut self, worker_id: &str, role_id: &str) -> MappingResult<IntentOutcome> {
        let assignment_type = InteractionController::drop_type(self.store(), role_id);
        let result = self.create_assignment(worker_id, role_id, assignment_type);
        self.settle(result)
    }

    /// Apply a suggestion from the current recommendation set. Ids from a
    /// set that has since been invalidated are reported as not found.
    pub fn apply_recommendation(&mut self, recommendation_id: &str) -> MappingResult<IntentOutcome> {
        let hint = self
            .cached_recommendations()
            .and_then(|recs| recs.iter().find(|r| r.recommendation_id == recommendation_id))
            .map(|r| (r.worker_id.clone(), r.role_id.clone(), r.suggested_type));

        let Some((worker_id, role_id, suggested_type)) = hint else {
            let err = AssignmentError::not_found(EntityKind::Recommendation, recommendation_id);
            return self.settle::<()>(Err(err.into()));
        };
        let result = self.create_assignment(&worker_id, &role_id, suggested_type);
        self.settle(result)
    }

    fn bulk_assign_intent(&mut self, worker_ids: &[WorkerId], role_id: &str) -> MappingResult<IntentOutcome> {
        let leader_type = InteractionController::drop_type(self.store(), role_id);
        let outcomes = self.bulk_assign(worker_ids, role_id, leader_type)?;
        let results = outcomes
            .into_iter()
            .map(|o| BulkResult {
                worker_id: o.worker_id,
                outcome:   o.result.map(|c| c.assignment).map_err(|e| Rejection::from(&e)),
            })
            .collect();
        Ok(IntentOutcome::Bulk { results, events: self.last_events().to_vec() })
    }

    fn settle<T>(&self, result: MappingResult<T>) -> MappingResult<IntentOutcome> {
        match result {
            Ok(_) => Ok(IntentOutcome::Applied { events: self.last_events().to_vec() }),
            Err(MappingError::Assignment(err)) => {
                log::warn!("controller: rejected on {} board: {err}", self.kind.label());
                Ok(IntentOutcome::Rejected { rejection: Rejection::from(&err) })
            }
            Err(e) => Err(e),
        }
    }
}
