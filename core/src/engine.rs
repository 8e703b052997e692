//! The mapping engine: one worker pool's assignment board.
//!
//! A DA board and a TA board are two `MappingEngine`s over the same code,
//! differing only in `kind`.
//!
//! MUTATION PATH (fixed, never reordered):
//!   1. Checkpoint the assignment store.
//!   2. Run the store operation (validates before it mutates).
//!   3. Describe the result as events.
//!   4. Append the events to the repository as one batch.
//!   5. On any failure, restore the checkpoint.
//!   6. Invalidate cached recommendations.
//!
//! RULES:
//!   - Mutations take `&mut self`; there is one writer at a time.
//!   - Queries never mutate, except the recommendation cache.
//!   - The store is the single source of truth; board views are built
//!     from it on every call.

use crate::{
    assignment_store::{Assignment, AssignmentStore, BulkOutcome, RoleClosure},
    clock::{Clock, FixedClock, SystemClock},
    config::MappingConfig,
    error::{AssignmentError, MappingResult},
    event::{MappingEvent, RecordedEvent},
    fulfillment::{self, FulfillmentSummary},
    recommendation::{Recommendation, RecommendationGenerator},
    repository::{MappingRepository, MemoryRepository},
    role::RoleRequisition,
    snapshot::{RoleSnapshot, Snapshot, WorkerSnapshot},
    types::{AssignmentType, FulfillmentStatus, LifecycleStatus, Percent, WorkerId, WorkerKind},
    worker::WorkerProfile,
    workload_ledger::LedgerEntry,
};
use chrono::{DateTime, Utc};

pub struct MappingEngine<R: MappingRepository> {
    pub kind:        WorkerKind,
    config:          MappingConfig,
    store:           AssignmentStore,
    repository:      R,
    clock:           Box<dyn Clock>,
    sequence:        u64,
    last_events:     Vec<MappingEvent>,
    recommendations: Option<Vec<Recommendation>>,
}

impl<R: MappingRepository> MappingEngine<R> {
    /// An empty engine. Call `refresh()` to pull the pool from the repository.
    pub fn new(kind: WorkerKind, config: MappingConfig, repository: R, clock: Box<dyn Clock>) -> Self {
        Self {
            kind,
            store: AssignmentStore::new(config.workload.clone()),
            config,
            repository,
            clock,
            sequence: 0,
            last_events: Vec::new(),
            recommendations: None,
        }
    }

    /// Build a loaded engine on the system clock.
    pub fn load(kind: WorkerKind, config: MappingConfig, repository: R) -> MappingResult<Self> {
        let mut engine = Self::new(kind, config, repository, Box::new(SystemClock));
        engine.refresh()?;
        Ok(engine)
    }

    /// Re-read the pool from the repository, replacing all in-memory state.
    pub fn refresh(&mut self) -> MappingResult<()> {
        let snapshot = self.repository.load(self.kind)?.for_kind(self.kind);
        let event = MappingEvent::SnapshotLoaded {
            pool:        self.kind,
            workers:     snapshot.workers.len(),
            roles:       snapshot.roles.len(),
            assignments: snapshot.assignments.len(),
        };

        let mut store = AssignmentStore::new(self.config.workload.clone());
        store.load(snapshot);

        self.sequence = self.sequence.max(self.repository.last_sequence(self.kind)?);
        let now = self.clock.now();
        let events = vec![event];
        self.persist(&events, now)?;

        self.store = store;
        self.last_events = events;
        self.recommendations = None;
        log::info!(
            "engine[{}]: loaded {} workers, {} roles, {} assignments",
            self.kind.label(),
            self.store.workers().count(),
            self.store.roles().count(),
            self.store.assignments().len()
        );
        Ok(())
    }

    // ── Mutations ──────────────────────────────────────────────

    pub fn create_assignment(
        &mut self,
        worker_id: &str,
        role_id: &str,
        assignment_type: AssignmentType,
    ) -> MappingResult<Assignment> {
        let change = self.commit(
            |store, now| store.create_assignment(worker_id, role_id, assignment_type, now),
            MappingEvent::for_created,
        )?;
        Ok(change.assignment)
    }

    pub fn remove_assignment(&mut self, assignment_id: &str) -> MappingResult<Assignment> {
        let change = self.commit(
            |store, _| store.remove_assignment(assignment_id),
            MappingEvent::for_removed,
        )?;
        Ok(change.assignment)
    }

    /// Best-effort batch: per-worker outcomes in request order.
    pub fn bulk_assign(
        &mut self,
        worker_ids: &[WorkerId],
        role_id: &str,
        leader_type: AssignmentType,
    ) -> MappingResult<Vec<BulkOutcome>> {
        self.commit(
            |store, now| Ok(store.bulk_assign(worker_ids, role_id, leader_type, now)),
            |outcomes: &Vec<BulkOutcome>| {
                outcomes
                    .iter()
                    .filter_map(|o| o.result.as_ref().ok())
                    .flat_map(MappingEvent::for_created)
                    .collect()
            },
        )
    }

    pub fn confirm_assignment(&mut self, assignment_id: &str) -> MappingResult<Assignment> {
        let change = self.commit(|store, _| store.confirm(assignment_id), MappingEvent::for_status)?;
        Ok(change.assignment)
    }

    pub fn complete_assignment(&mut self, assignment_id: &str) -> MappingResult<Assignment> {
        let change = self.commit(|store, _| store.complete(assignment_id), MappingEvent::for_status)?;
        Ok(change.assignment)
    }

    /// Complete a role's active assignments, drop its pending ones, and
    /// close it to further assignment.
    pub fn close_role(&mut self, role_id: &str) -> MappingResult<RoleClosure> {
        self.commit(
            |store, _| store.close_role(role_id),
            |closure: &RoleClosure| {
                let mut events: Vec<MappingEvent> =
                    closure.completed.iter().flat_map(MappingEvent::for_status).collect();
                events.extend(closure.dropped.iter().flat_map(MappingEvent::for_removed));
                events.push(MappingEvent::RoleClosed {
                    role_id:   closure.role_id.clone(),
                    completed: closure.completed.len(),
                    dropped:   closure.dropped.len(),
                });
                events
            },
        )
    }

    /// Workers are never deleted; deactivation stops new assignments and
    /// recommendations while existing assignments stay in place.
    pub fn set_worker_active(&mut self, worker_id: &str, active: bool) -> MappingResult<bool> {
        let id = worker_id.to_string();
        self.commit(
            |store, _| store.set_worker_active(worker_id, active),
            move |changed: &bool| {
                if *changed {
                    vec![MappingEvent::WorkerActivationChanged { worker_id: id, active }]
                } else {
                    Vec::new()
                }
            },
        )
    }

    fn commit<T, Op, Ev>(&mut self, op: Op, describe: Ev) -> MappingResult<T>
    where
        Op: FnOnce(&mut AssignmentStore, DateTime<Utc>) -> Result<T, AssignmentError>,
        Ev: FnOnce(&T) -> Vec<MappingEvent>,
    {
        let checkpoint = self.store.clone();
        let now = self.clock.now();

        let value = match op(&mut self.store, now) {
            Ok(v) => v,
            Err(e) => {
                self.store = checkpoint;
                return Err(e.into());
            }
        };

        let events = describe(&value);
        if let Err(e) = self.persist(&events, now) {
            log::error!("engine[{}]: repository append failed, rolling back: {e}", self.kind.label());
            self.store = checkpoint;
            return Err(e);
        }

        if !events.is_empty() {
            self.recommendations = None;
        }
        self.last_events = events;
        Ok(value)
    }

    fn persist(&mut self, events: &[MappingEvent], at: DateTime<Utc>) -> MappingResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let batch: Vec<RecordedEvent> = events
            .iter()
            .zip(self.sequence + 1..)
            .map(|(event, sequence)| RecordedEvent {
                sequence,
                pool: self.kind,
                recorded_at: at,
                event: event.clone(),
            })
            .collect();
        self.repository.append(&batch)?;
        self.sequence += batch.len() as u64;
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    pub fn store(&self) -> &AssignmentStore {
        &self.store
    }

    /// Events produced by the most recent successful mutation or refresh.
    pub fn last_events(&self) -> &[MappingEvent] {
        &self.last_events
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn worker_snapshot(&self) -> Vec<WorkerSnapshot> {
        self.store.workers().map(|w| self.worker_view(w)).collect()
    }

    pub fn role_snapshot(&self) -> Vec<RoleSnapshot> {
        self.store.roles().map(|r| self.role_view(r)).collect()
    }

    /// Active assignments, optionally for one role.
    pub fn active_assignments(&self, role_id: Option<&str>) -> Vec<Assignment> {
        self.store
            .assignments()
            .iter()
            .filter(|a| a.status == LifecycleStatus::Active)
            .filter(|a| role_id.map_or(true, |r| a.role_id == r))
            .cloned()
            .collect()
    }

    pub fn pending_assignments(&self) -> Vec<Assignment> {
        self.store
            .assignments()
            .iter()
            .filter(|a| a.status == LifecycleStatus::Pending)
            .cloned()
            .collect()
    }

    /// Live assignments held by one worker.
    pub fn assignments_for_worker(&self, worker_id: &str) -> Vec<Assignment> {
        self.store
            .assignments()
            .iter()
            .filter(|a| a.worker_id == worker_id && a.status.is_live())
            .cloned()
            .collect()
    }

    pub fn worker_workload(&self, worker_id: &str) -> MappingResult<Percent> {
        Ok(self.store.workload(worker_id)?)
    }

    pub fn role_status(&self, role_id: &str) -> MappingResult<FulfillmentStatus> {
        Ok(self.store.role_status(role_id)?)
    }

    pub fn fulfillment_summary(&self) -> FulfillmentSummary {
        let roles: Vec<RoleRequisition> = self.store.roles().cloned().collect();
        fulfillment::summarise(&roles, self.store.assignments())
    }

    /// Ranked suggestions for the current state. Cached until the next
    /// mutation or refresh.
    pub fn recommendations(&mut self) -> Vec<Recommendation> {
        if let Some(cached) = &self.recommendations {
            return cached.clone();
        }
        let workers = self.worker_snapshot();
        let roles = self.role_snapshot();
        let generated = RecommendationGenerator::new(
            &self.config.recommendation,
            &self.config.workload,
        )
        .generate(&workers, &roles, self.store.assignments());
        self.recommendations = Some(generated.clone());
        generated
    }

    pub(crate) fn cached_recommendations(&self) -> Option<&[Recommendation]> {
        self.recommendations.as_deref()
    }

    fn worker_view(&self, worker: &WorkerProfile) -> WorkerSnapshot {
        let entry = self
            .store
            .ledger()
            .entry(&worker.worker_id)
            .copied()
            .unwrap_or(LedgerEntry {
                committed:    worker.current_workload,
                max_capacity: worker.capacity(self.config.workload.default_max_capacity),
            });
        WorkerSnapshot {
            worker_id:         worker.worker_id.clone(),
            kind:              worker.kind,
            name:              worker.name.clone(),
            skills:            worker.skills.clone(),
            years_experience:  worker.years_experience,
            availability:      worker.availability,
            performance_score: worker.performance_score,
            location:          worker.location.clone(),
            timezone:          worker.timezone.clone(),
            active:            worker.active,
            committed:         entry.committed,
            max_capacity:      entry.max_capacity,
            headroom:          entry.headroom(),
            utilisation:       entry.utilisation(),
            live_assignments:  self
                .store
                .assignments()
                .iter()
                .filter(|a| a.worker_id == worker.worker_id && a.status.is_live())
                .count(),
        }
    }

    fn role_view(&self, role: &RoleRequisition) -> RoleSnapshot {
        let assignments = self.store.assignments();
        let active_count = fulfillment::active_count(&role.role_id, assignments);
        RoleSnapshot {
            role_id:             role.role_id.clone(),
            client_id:           role.client_id.clone(),
            title:               role.title.clone(),
            required_headcount:  role.required_headcount,
            required_skills:     role.required_skills.clone(),
            priority:            role.priority,
            due_date:            role.due_date,
            closed:              role.closed,
            active_count,
            live_count:          self.store.live_for_role(&role.role_id).count(),
            has_primary:         self.store.has_live_primary(&role.role_id),
            status:              fulfillment::status_for(role, assignments),
            fulfillment_percent: fulfillment::fulfillment_percent(active_count, role.required_headcount),
        }
    }
}

impl MappingEngine<MemoryRepository> {
    /// Engine over an in-memory repository, default config, and a fixed
    /// clock. Used by tests and demos.
    pub fn build_test(kind: WorkerKind, snapshot: Snapshot) -> MappingResult<Self> {
        Self::build_test_with_config(kind, snapshot, MappingConfig::default_test())
    }

    pub fn build_test_with_config(
        kind: WorkerKind,
        snapshot: Snapshot,
        config: MappingConfig,
    ) -> MappingResult<Self> {
        let mut engine = Self::new(
            kind,
            config,
            MemoryRepository::new(snapshot),
            Box::new(FixedClock::default_test()),
        );
        engine.refresh()?;
        Ok(engine)
    }
}
