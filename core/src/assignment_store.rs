//! Assignment store: the authoritative set of assignment records.
//!
//! RULES:
//!   - Every create/remove/transition validates fully before mutating.
//!   - Workload moves only through the ledger, in the same call that
//!     changes the record, so the two never diverge.
//!   - Fulfillment is never stored; it is recomputed from `assignments`.
//!   - One live (pending or active) record per (worker, role) pair.

use crate::{
    config::WorkloadPolicy,
    error::{AssignmentError, EntityKind, LifecycleAction},
    fulfillment,
    role::RoleRequisition,
    snapshot::Snapshot,
    types::{
        AssignmentId, AssignmentType, FulfillmentStatus, LifecycleStatus, Percent, RoleId,
        WorkerId,
    },
    worker::WorkerProfile,
    workload_ledger::{WorkloadChange, WorkloadLedger},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id:    AssignmentId,
    pub worker_id:        WorkerId,
    pub role_id:          RoleId,
    pub assignment_type:  AssignmentType,
    pub workload_percent: Percent,
    pub assigned_at:      DateTime<Utc>,
    pub status:           LifecycleStatus,
}

/// Result of a successful create or remove.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentChange {
    pub assignment:  Assignment,
    pub workload:    WorkloadChange,
    pub role_status: FulfillmentStatus,
}

/// Result of a successful lifecycle transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub assignment:  Assignment,
    pub from:        LifecycleStatus,
    pub to:          LifecycleStatus,
    /// Set when the transition released a reservation.
    pub workload:    Option<WorkloadChange>,
    pub role_status: FulfillmentStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleClosure {
    pub role_id:   RoleId,
    pub completed: Vec<StatusChange>,
    pub dropped:   Vec<AssignmentChange>,
}

/// Per-worker result of a bulk assignment, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOutcome {
    pub worker_id: WorkerId,
    pub result:    Result<AssignmentChange, AssignmentError>,
}

#[derive(Debug, Clone)]
pub struct AssignmentStore {
    policy:      WorkloadPolicy,
    workers:     BTreeMap<WorkerId, WorkerProfile>,
    roles:       BTreeMap<RoleId, RoleRequisition>,
    assignments: Vec<Assignment>,
    ledger:      WorkloadLedger,
}

impl AssignmentStore {
    pub fn new(policy: WorkloadPolicy) -> Self {
        Self {
            policy,
            workers:     BTreeMap::new(),
            roles:       BTreeMap::new(),
            assignments: Vec::new(),
            ledger:      WorkloadLedger::new(),
        }
    }

    /// Replace all state with `snapshot`. Each worker's committed workload
    /// is rebuilt as the profile's outside workload plus the percentages
    /// of the live assignments loaded for that worker.
    pub fn load(&mut self, snapshot: Snapshot) {
        self.workers.clear();
        self.roles.clear();
        self.assignments.clear();
        self.ledger.clear();

        for worker in snapshot.workers {
            let worker = worker.normalised();
            self.workers.insert(worker.worker_id.clone(), worker);
        }
        for role in snapshot.roles {
            let role = role.normalised();
            self.roles.insert(role.role_id.clone(), role);
        }
        for assignment in snapshot.assignments {
            if !self.workers.contains_key(&assignment.worker_id)
                || !self.roles.contains_key(&assignment.role_id)
            {
                log::warn!(
                    "store: dropping assignment {} with unknown worker/role ({} -> {})",
                    assignment.assignment_id, assignment.worker_id, assignment.role_id
                );
                continue;
            }
            self.assignments.push(assignment);
        }

        for worker in self.workers.values() {
            let held: Percent = self
                .assignments
                .iter()
                .filter(|a| a.worker_id == worker.worker_id && a.status.is_live())
                .map(|a| a.workload_percent)
                .sum();
            let committed = worker.current_workload + held;
            let capacity = worker.capacity(self.policy.default_max_capacity);
            if committed > capacity {
                log::warn!(
                    "store: {} loaded over capacity ({committed}% of {capacity}%)",
                    worker.worker_id
                );
            }
            self.ledger.register(&worker.worker_id, committed, capacity);
        }
    }

    /// Export current state. Profiles keep their outside workload, so
    /// loading the export rebuilds the same ledger.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            workers:     self.workers.values().cloned().collect(),
            roles:       self.roles.values().cloned().collect(),
            assignments: self.assignments.clone(),
        }
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn policy(&self) -> &WorkloadPolicy {
        &self.policy
    }

    pub fn ledger(&self) -> &WorkloadLedger {
        &self.ledger
    }

    pub fn workers(&self) -> impl Iterator<Item = &WorkerProfile> {
        self.workers.values()
    }

    pub fn worker(&self, worker_id: &str) -> Option<&WorkerProfile> {
        self.workers.get(worker_id)
    }

    pub fn roles(&self) -> impl Iterator<Item = &RoleRequisition> {
        self.roles.values()
    }

    pub fn role(&self, role_id: &str) -> Option<&RoleRequisition> {
        self.roles.get(role_id)
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn assignment(&self, assignment_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.assignment_id == assignment_id)
    }

    pub fn live_for_role<'a>(&'a self, role_id: &'a str) -> impl Iterator<Item = &'a Assignment> + 'a {
        self.assignments
            .iter()
            .filter(move |a| a.role_id == role_id && a.status.is_live())
    }

    pub fn live_pair(&self, worker_id: &str, role_id: &str) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|a| a.worker_id == worker_id && a.role_id == role_id && a.status.is_live())
    }

    pub fn has_live_primary(&self, role_id: &str) -> bool {
        self.live_for_role(role_id)
            .any(|a| a.assignment_type == AssignmentType::Primary)
    }

    pub fn role_status(&self, role_id: &str) -> Result<FulfillmentStatus, AssignmentError> {
        let role = self
            .role(role_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Role, role_id))?;
        Ok(fulfillment::status_for(role, &self.assignments))
    }

    pub fn workload(&self, worker_id: &str) -> Result<Percent, AssignmentError> {
        self.ledger
            .committed(worker_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Worker, worker_id))
    }

    // ── Validation ─────────────────────────────────────────────

    /// Every check `create_assignment` performs, without mutation.
    /// Returns the workload percentage the assignment would reserve.
    pub fn validate_create(
        &self,
        worker_id: &str,
        role_id: &str,
        assignment_type: AssignmentType,
    ) -> Result<Percent, AssignmentError> {
        let worker = self
            .worker(worker_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Worker, worker_id))?;
        let role = self
            .role(role_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Role, role_id))?;

        if !worker.active {
            return Err(AssignmentError::WorkerInactive { worker_id: worker_id.to_string() });
        }
        if role.closed {
            return Err(AssignmentError::RoleClosed { role_id: role_id.to_string() });
        }

        if let Some(existing) = self.live_pair(worker_id, role_id) {
            return Err(AssignmentError::DuplicateAssignment {
                worker_id: worker_id.to_string(),
                role_id:   role_id.to_string(),
                existing:  existing.assignment_id.clone(),
            });
        }

        let percentage = self.policy.percent_for(assignment_type);
        self.ledger.check(worker_id, percentage)?;

        // Pending records count here so unconfirmed drops cannot oversubscribe.
        let live = self.live_for_role(role_id).count();
        let saturated =
            fulfillment::classify(live, role.required_headcount) == FulfillmentStatus::FullyAssigned;
        let exempt =
            assignment_type == AssignmentType::Backup && self.policy.backup_may_exceed_headcount;
        if saturated && !exempt {
            return Err(AssignmentError::RoleSaturated {
                role_id:   role_id.to_string(),
                live,
                required:  role.required_headcount,
                requested: assignment_type,
            });
        }

        Ok(percentage)
    }

    // ── Mutations ──────────────────────────────────────────────

    pub fn create_assignment(
        &mut self,
        worker_id: &str,
        role_id: &str,
        assignment_type: AssignmentType,
        assigned_at: DateTime<Utc>,
    ) -> Result<AssignmentChange, AssignmentError> {
        let percentage = self.validate_create(worker_id, role_id, assignment_type)?;
        let workload = self.ledger.reserve(worker_id, percentage)?;

        let status = if self.policy.require_confirmation {
            LifecycleStatus::Pending
        } else {
            LifecycleStatus::Active
        };
        let assignment = Assignment {
            assignment_id: Uuid::new_v4().to_string(),
            worker_id: worker_id.to_string(),
            role_id: role_id.to_string(),
            assignment_type,
            workload_percent: percentage,
            assigned_at,
            status,
        };
        self.assignments.push(assignment.clone());
        let role_status = self.role_status(role_id)?;

        log::info!(
            "store: assigned {worker_id} -> {role_id} as {assignment_type} ({percentage}%, {status}); role now {role_status}"
        );

        Ok(AssignmentChange { assignment, workload, role_status })
    }

    /// Remove a pending or active record and release its reservation.
    /// An unknown id is an error so callers can detect stale views.
    pub fn remove_assignment(&mut self, assignment_id: &str) -> Result<AssignmentChange, AssignmentError> {
        let index = self
            .assignments
            .iter()
            .position(|a| a.assignment_id == assignment_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Assignment, assignment_id))?;

        let record = &self.assignments[index];
        if !record.status.is_live() {
            return Err(AssignmentError::InvalidTransition {
                assignment_id: assignment_id.to_string(),
                from:          record.status,
                action:        LifecycleAction::Remove,
            });
        }

        let workload = self.ledger.release(&record.worker_id, record.workload_percent)?;
        let assignment = self.assignments.remove(index);
        let role_status = self.role_status(&assignment.role_id)?;

        log::info!(
            "store: removed {} ({} -> {}); role now {role_status}",
            assignment.assignment_id, assignment.worker_id, assignment.role_id
        );

        Ok(AssignmentChange { assignment, workload, role_status })
    }

    /// Sequential best-effort batch. The first success takes `leader_type`,
    /// later successes are secondary. A failure never undoes earlier
    /// successes, and each attempt sees the reservations made before it.
    pub fn bulk_assign(
        &mut self,
        worker_ids: &[WorkerId],
        role_id: &str,
        leader_type: AssignmentType,
        assigned_at: DateTime<Utc>,
    ) -> Vec<BulkOutcome> {
        let mut leader_placed = false;
        let mut outcomes = Vec::with_capacity(worker_ids.len());

        for worker_id in worker_ids {
            let assignment_type = if leader_placed {
                AssignmentType::Secondary
            } else {
                leader_type
            };
            let result = self.create_assignment(worker_id, role_id, assignment_type, assigned_at);
            match &result {
                Ok(_) => leader_placed = true,
                Err(e) => log::warn!("store: bulk assign {worker_id} -> {role_id} rejected: {e}"),
            }
            outcomes.push(BulkOutcome { worker_id: worker_id.clone(), result });
        }

        outcomes
    }

    /// pending -> active.
    pub fn confirm(&mut self, assignment_id: &str) -> Result<StatusChange, AssignmentError> {
        let record = self.record_mut(assignment_id)?;
        if record.status != LifecycleStatus::Pending {
            return Err(AssignmentError::InvalidTransition {
                assignment_id: assignment_id.to_string(),
                from:          record.status,
                action:        LifecycleAction::Confirm,
            });
        }
        record.status = LifecycleStatus::Active;
        let assignment = record.clone();
        let role_status = self.role_status(&assignment.role_id)?;

        log::info!("store: confirmed {assignment_id}; role {} now {role_status}", assignment.role_id);

        Ok(StatusChange {
            assignment,
            from: LifecycleStatus::Pending,
            to: LifecycleStatus::Active,
            workload: None,
            role_status,
        })
    }

    /// active -> completed. Terminal; releases the reservation.
    pub fn complete(&mut self, assignment_id: &str) -> Result<StatusChange, AssignmentError> {
        let (worker_id, percent) = {
            let record = self
                .assignment(assignment_id)
                .ok_or_else(|| AssignmentError::not_found(EntityKind::Assignment, assignment_id))?;
            if record.status != LifecycleStatus::Active {
                return Err(AssignmentError::InvalidTransition {
                    assignment_id: assignment_id.to_string(),
                    from:          record.status,
                    action:        LifecycleAction::Complete,
                });
            }
            (record.worker_id.clone(), record.workload_percent)
        };

        let workload = self.ledger.release(&worker_id, percent)?;
        let record = self.record_mut(assignment_id)?;
        record.status = LifecycleStatus::Completed;
        let assignment = record.clone();
        let role_status = self.role_status(&assignment.role_id)?;

        Ok(StatusChange {
            assignment,
            from: LifecycleStatus::Active,
            to: LifecycleStatus::Completed,
            workload: Some(workload),
            role_status,
        })
    }

    /// Close a role: active records complete, pending ones are dropped.
    pub fn close_role(&mut self, role_id: &str) -> Result<RoleClosure, AssignmentError> {
        let role = self
            .role(role_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Role, role_id))?;
        if role.closed {
            return Err(AssignmentError::RoleClosed { role_id: role_id.to_string() });
        }

        let live: Vec<(AssignmentId, LifecycleStatus)> = self
            .live_for_role(role_id)
            .map(|a| (a.assignment_id.clone(), a.status))
            .collect();

        let mut closure = RoleClosure {
            role_id:   role_id.to_string(),
            completed: Vec::new(),
            dropped:   Vec::new(),
        };
        for (assignment_id, status) in live {
            match status {
                LifecycleStatus::Active  => closure.completed.push(self.complete(&assignment_id)?),
                LifecycleStatus::Pending => closure.dropped.push(self.remove_assignment(&assignment_id)?),
                LifecycleStatus::Completed => {}
            }
        }

        if let Some(role) = self.roles.get_mut(role_id) {
            role.closed = true;
        }
        log::info!(
            "store: closed role {role_id} ({} completed, {} dropped)",
            closure.completed.len(),
            closure.dropped.len()
        );
        Ok(closure)
    }

    /// Deactivate (or reactivate) a worker. Existing assignments stay.
    /// Returns whether the flag changed.
    pub fn set_worker_active(&mut self, worker_id: &str, active: bool) -> Result<bool, AssignmentError> {
        let worker = self
            .workers
            .get_mut(worker_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Worker, worker_id))?;
        let changed = worker.active != active;
        worker.active = active;
        Ok(changed)
    }

    fn record_mut(&mut self, assignment_id: &str) -> Result<&mut Assignment, AssignmentError> {
        self.assignments
            .iter_mut()
            .find(|a| a.assignment_id == assignment_id)
            .ok_or_else(|| AssignmentError::not_found(EntityKind::Assignment, assignment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkerKind;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn store(policy: WorkloadPolicy) -> AssignmentStore {
        let mut store = AssignmentStore::new(policy);
        store.load(Snapshot {
            workers: vec![
                WorkerProfile::new("a", WorkerKind::DeliveryAssociate, "A"),
                WorkerProfile::new("b", WorkerKind::DeliveryAssociate, "B"),
            ],
            roles: vec![RoleRequisition::new("r1", "acme", 1)],
            assignments: vec![],
        });
        store
    }

    #[test]
    fn pending_assignments_hold_capacity_but_not_fulfillment() {
        let policy = WorkloadPolicy { require_confirmation: true, ..WorkloadPolicy::default() };
        let mut store = store(policy);

        let change = store.create_assignment("a", "r1", AssignmentType::Primary, at()).unwrap();
        assert_eq!(change.assignment.status, LifecycleStatus::Pending);
        assert_eq!(change.role_status, FulfillmentStatus::Unassigned);
        assert_eq!(store.workload("a").unwrap(), 50);

        // The pending record already saturates a headcount-1 role.
        let err = store.create_assignment("b", "r1", AssignmentType::Secondary, at()).unwrap_err();
        assert!(matches!(err, AssignmentError::RoleSaturated { live: 1, .. }));

        let confirmed = store.confirm(&change.assignment.assignment_id).unwrap();
        assert_eq!(confirmed.role_status, FulfillmentStatus::FullyAssigned);
    }

    #[test]
    fn completed_is_terminal() {
        let mut store = store(WorkloadPolicy::default());
        let id = store
            .create_assignment("a", "r1", AssignmentType::Primary, at())
            .unwrap()
            .assignment
            .assignment_id;

        let done = store.complete(&id).unwrap();
        assert_eq!(done.workload.map(|w| w.current), Some(0));

        for err in [store.confirm(&id).unwrap_err(), store.complete(&id).unwrap_err(), store.remove_assignment(&id).unwrap_err()] {
            assert!(matches!(err, AssignmentError::InvalidTransition { from: LifecycleStatus::Completed, .. }));
        }
    }

    #[test]
    fn completed_pair_can_be_assigned_again() {
        let mut store = store(WorkloadPolicy::default());
        let id = store
            .create_assignment("a", "r1", AssignmentType::Primary, at())
            .unwrap()
            .assignment
            .assignment_id;
        store.complete(&id).unwrap();
        assert!(store.create_assignment("a", "r1", AssignmentType::Primary, at()).is_ok());
    }

    #[test]
    fn inactive_worker_rejected() {
        let mut store = store(WorkloadPolicy::default());
        assert!(store.set_worker_active("a", false).unwrap());
        assert_eq!(
            store.create_assignment("a", "r1", AssignmentType::Primary, at()).unwrap_err(),
            AssignmentError::WorkerInactive { worker_id: "a".into() }
        );
    }

    #[test]
    fn reloading_the_export_rebuilds_the_ledger() {
        let mut store = store(WorkloadPolicy::default());
        store.create_assignment("a", "r1", AssignmentType::Primary, at()).unwrap();
        let snap = store.snapshot();
        let a = snap.workers.iter().find(|w| w.worker_id == "a").unwrap();
        assert_eq!(a.current_workload, 0);
        assert_eq!(snap.assignments.len(), 1);

        let mut reloaded = AssignmentStore::new(WorkloadPolicy::default());
        reloaded.load(snap);
        assert_eq!(reloaded.workload("a").unwrap(), 50);
    }

    #[test]
    fn load_adds_live_assignments_to_outside_workload() {
        let mut store = store(WorkloadPolicy::default());
        let done = store.create_assignment("b", "r1", AssignmentType::Primary, at()).unwrap();
        store.complete(&done.assignment.assignment_id).unwrap();
        store.create_assignment("a", "r1", AssignmentType::Backup, at()).unwrap();

        let mut snap = store.snapshot();
        for w in &mut snap.workers {
            w.current_workload = 20;
        }
        store.load(snap);
        assert_eq!(store.workload("a").unwrap(), 50);
        assert_eq!(store.workload("b").unwrap(), 20);
    }
}
