use crate::types::{AssignmentId, RoleId, WorkerId};
use serde::{Deserialize, Serialize};

/// Interaction intents from the presentation layer.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    // ── Board interactions ─────────────────────────
    DropWorkerOnRole {
        worker_id: WorkerId,
        role_id:   RoleId,
    },
    BulkAssign {
        worker_ids: Vec<WorkerId>,
        role_id:    RoleId,
    },
    Unassign {
        assignment_id: AssignmentId,
    },
    ApplyRecommendation {
        recommendation_id: String,
    },

    // ── Lifecycle ──────────────────────────────────
    ConfirmAssignment {
        assignment_id: AssignmentId,
    },
    CloseRole {
        role_id: RoleId,
    },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DropWorkerOnRole { .. }    => "drop_worker_on_role",
            Self::BulkAssign { .. }          => "bulk_assign",
            Self::Unassign { .. }            => "unassign",
            Self::ApplyRecommendation { .. } => "apply_recommendation",
            Self::ConfirmAssignment { .. }   => "confirm_assignment",
            Self::CloseRole { .. }           => "close_role",
        }
    }
}

/// A finished drag gesture: the dragged worker and the role it was
/// released over, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragDrop {
    pub source_id: WorkerId,
    #[serde(default)]
    pub target_id: Option<RoleId>,
}

impl DragDrop {
    pub fn onto(source_id: impl Into<WorkerId>, target_id: impl Into<RoleId>) -> Self {
        Self { source_id: source_id.into(), target_id: Some(target_id.into()) }
    }

    pub fn released_outside(source_id: impl Into<WorkerId>) -> Self {
        Self { source_id: source_id.into(), target_id: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_parse_from_presentation_json() {
        let json = r#"{"intent":"bulk_assign","worker_ids":["a","b"],"role_id":"r1"}"#;
        let intent: Intent = serde_json::from_str(json).unwrap();
        assert_eq!(
            intent,
            Intent::BulkAssign { worker_ids: vec!["a".into(), "b".into()], role_id: "r1".into() }
        );
        assert_eq!(intent.name(), "bulk_assign");
    }
}
