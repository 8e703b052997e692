//! Recommendation generator: deterministic, explainable worker/role
//! pairings.
//!
//! RULES:
//!   - Read-only. Nothing here mutates engine state.
//!   - Same inputs produce the same ordered output. No randomness, no
//!     clock, and every sort key chain ends in unique ids.
//!   - A recommendation is a hint; applying one re-validates through the
//!     normal drop path.
//!
//! Confidence = skill overlap × availability weight × headroom weight ×
//! performance weight, clamped to [0, 1].

use crate::{
    assignment_store::Assignment,
    config::{RecommendationConfig, WorkloadPolicy},
    snapshot::{RoleSnapshot, WorkerSnapshot},
    types::{AssignmentType, Availability, RoleId, WorkerId},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation_id: String,
    pub worker_id:         WorkerId,
    pub role_id:           RoleId,
    pub confidence:        f64,
    pub rationale:         String,
    pub suggested_type:    AssignmentType,
}

impl Recommendation {
    pub fn id_for(worker_id: &str, role_id: &str) -> String {
        format!("rec:{role_id}:{worker_id}")
    }
}

pub struct RecommendationGenerator<'a> {
    config: &'a RecommendationConfig,
    policy: &'a WorkloadPolicy,
}

impl<'a> RecommendationGenerator<'a> {
    pub fn new(config: &'a RecommendationConfig, policy: &'a WorkloadPolicy) -> Self {
        Self { config, policy }
    }

    /// Rank every eligible (worker, role) pair.
    pub fn generate(
        &self,
        workers: &[WorkerSnapshot],
        roles: &[RoleSnapshot],
        assignments: &[Assignment],
    ) -> Vec<Recommendation> {
        let live_pairs: BTreeSet<(&str, &str)> = assignments
            .iter()
            .filter(|a| a.status.is_live())
            .map(|a| (a.worker_id.as_str(), a.role_id.as_str()))
            .collect();

        let mut ranked: Vec<(&RoleSnapshot, Recommendation)> = Vec::new();
        for role in roles {
            if role.closed || role.is_saturated() {
                continue;
            }
            let suggested_type = if role.has_primary {
                AssignmentType::Secondary
            } else {
                AssignmentType::Primary
            };
            let needed = self.policy.percent_for(suggested_type);

            let mut for_role: Vec<Recommendation> = workers
                .iter()
                .filter(|w| w.active && w.headroom >= needed)
                .filter(|w| !live_pairs.contains(&(w.worker_id.as_str(), role.role_id.as_str())))
                .filter_map(|w| self.score(w, role, suggested_type))
                .filter(|r| r.confidence >= self.config.min_confidence)
                .collect();

            for_role.sort_by(|a, b| {
                b.confidence
                    .total_cmp(&a.confidence)
                    .then_with(|| a.worker_id.cmp(&b.worker_id))
            });
            for_role.truncate(self.config.max_per_role);
            ranked.extend(for_role.into_iter().map(|r| (role, r)));
        }

        ranked.sort_by(|(ra, a), (rb, b)| rank_order(ra, a, rb, b));
        log::debug!("recommendations: {} suggestions over {} roles", ranked.len(), roles.len());
        ranked.into_iter().map(|(_, r)| r).collect()
    }

    /// None when the worker is excluded outright (unavailable).
    pub fn score(
        &self,
        worker: &WorkerSnapshot,
        role: &RoleSnapshot,
        suggested_type: AssignmentType,
    ) -> Option<Recommendation> {
        let availability_weight = match worker.availability {
            Availability::Available   => self.config.available_weight,
            Availability::Busy        => self.config.busy_weight,
            Availability::Unavailable => return None,
        };

        let matched: Vec<&str> = role
            .required_skills
            .intersection(&worker.skills)
            .map(String::as_str)
            .collect();
        let overlap = if role.required_skills.is_empty() {
            self.config.neutral_skill_score
        } else {
            matched.len() as f64 / role.required_skills.len() as f64
        };

        let near_capacity = worker.utilisation > self.config.high_workload_threshold;
        let headroom_weight = if near_capacity {
            self.config.high_workload_weight
        } else {
            1.0
        };

        let performance = worker.performance_score.min(100) as f64 / 100.0;
        let performance_weight = 1.0 - self.config.performance_weight * (1.0 - performance);

        let confidence =
            (overlap * availability_weight * headroom_weight * performance_weight).clamp(0.0, 1.0);
        let confidence = (confidence * 10_000.0).round() / 10_000.0;

        let skills = if role.required_skills.is_empty() {
            "no required skills listed".to_string()
        } else if matched.is_empty() {
            format!("0/{} required skills", role.required_skills.len())
        } else {
            format!(
                "{}/{} required skills ({})",
                matched.len(),
                role.required_skills.len(),
                matched.join(", ")
            )
        };
        let mut rationale = format!(
            "{skills}; {}; {}% committed",
            worker.availability, worker.committed
        );
        if near_capacity {
            rationale.push_str("; near capacity");
        }

        Some(Recommendation {
            recommendation_id: Recommendation::id_for(&worker.worker_id, &role.role_id),
            worker_id: worker.worker_id.clone(),
            role_id: role.role_id.clone(),
            confidence,
            rationale,
            suggested_type,
        })
    }
}

/// Descending confidence, then high priority, earliest due date
/// (undated last), role id, worker id.
fn rank_order(
    role_a: &RoleSnapshot,
    a: &Recommendation,
    role_b: &RoleSnapshot,
    b: &Recommendation,
) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| role_a.priority.rank().cmp(&role_b.priority.rank()))
        .then_with(|| match (role_a.due_date, role_b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None)    => Ordering::Less,
            (None, Some(_))    => Ordering::Greater,
            (None, None)       => Ordering::Equal,
        })
        .then_with(|| a.role_id.cmp(&b.role_id))
        .then_with(|| a.worker_id.cmp(&b.worker_id))
}
