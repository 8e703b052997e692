//! Assignment store tests: create, remove, lifecycle, and the event
//! stream each mutation produces.

use mapping_core::{
    engine::MappingEngine,
    error::{AssignmentError, EntityKind},
    event::MappingEvent,
    repository::MemoryRepository,
    role::RoleRequisition,
    snapshot::Snapshot,
    types::{AssignmentType, FulfillmentStatus, LifecycleStatus, WorkerKind},
    worker::WorkerProfile,
};

const DA: WorkerKind = WorkerKind::DeliveryAssociate;
const TA: WorkerKind = WorkerKind::TalentAcquisition;

fn pool() -> Snapshot {
    Snapshot {
        workers: vec![
            WorkerProfile::new("a", DA, "Ada").with_workload(10),
            WorkerProfile::new("b", DA, "Ben"),
            WorkerProfile::new("t", TA, "Tess"),
        ],
        roles: vec![
            RoleRequisition::new("r1", "acme", 2),
            RoleRequisition::new("r2", "globex", 1),
        ],
        assignments: vec![],
    }
}

fn build() -> MappingEngine<MemoryRepository> {
    MappingEngine::build_test(DA, pool()).expect("build test engine")
}

#[test]
fn duplicate_create_is_rejected_without_workload_change() {
    let mut engine = build();
    let first = engine.create_assignment("a", "r1", AssignmentType::Primary).unwrap();
    let before = engine.worker_workload("a").unwrap();

    let err = engine.create_assignment("a", "r1", AssignmentType::Primary).unwrap_err();
    match err.as_assignment() {
        Some(AssignmentError::DuplicateAssignment { existing, .. }) => {
            assert_eq!(existing, &first.assignment_id);
        }
        other => panic!("expected DuplicateAssignment, got {other:?}"),
    }
    assert_eq!(engine.worker_workload("a").unwrap(), before);
    assert_eq!(engine.active_assignments(Some("r1")).len(), 1);
}

#[test]
fn create_then_remove_restores_prior_state() {
    let mut engine = build();
    let workload_before = engine.worker_workload("a").unwrap();
    let status_before = engine.role_status("r1").unwrap();

    let created = engine.create_assignment("a", "r1", AssignmentType::Secondary).unwrap();
    assert_eq!(engine.worker_workload("a").unwrap(), workload_before + 30);

    let removed = engine.remove_assignment(&created.assignment_id).unwrap();
    assert_eq!(removed.assignment_id, created.assignment_id);
    assert_eq!(engine.worker_workload("a").unwrap(), workload_before);
    assert_eq!(engine.role_status("r1").unwrap(), status_before);
    assert!(engine.assignments_for_worker("a").is_empty());
}

#[test]
fn create_emits_workload_then_record_event() {
    let mut engine = build();
    engine.create_assignment("b", "r2", AssignmentType::Primary).unwrap();

    let events = engine.last_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        MappingEvent::WorkloadChanged { worker_id, previous: 0, current: 50, .. } if worker_id == "b"
    ));
    match &events[1] {
        MappingEvent::AssignmentCreated { assignment, resulting_worker_workload, resulting_role_status } => {
            assert_eq!(assignment.worker_id, "b");
            assert_eq!(*resulting_worker_workload, 50);
            assert_eq!(*resulting_role_status, FulfillmentStatus::FullyAssigned);
        }
        other => panic!("expected assignment_created, got {other:?}"),
    }
}

#[test]
fn unknown_ids_are_not_found() {
    let mut engine = build();
    let cases = [
        (engine.create_assignment("ghost", "r1", AssignmentType::Primary), EntityKind::Worker),
        (engine.create_assignment("a", "nowhere", AssignmentType::Primary), EntityKind::Role),
    ];
    for (result, entity) in cases {
        let err = result.unwrap_err();
        assert!(
            matches!(err.as_assignment(), Some(AssignmentError::NotFound { entity: e, .. }) if *e == entity),
            "expected NotFound {entity}, got {err:?}"
        );
    }
    let err = engine.remove_assignment("no-such-id").unwrap_err();
    assert!(matches!(
        err.as_assignment(),
        Some(AssignmentError::NotFound { entity: EntityKind::Assignment, .. })
    ));
}

#[test]
fn other_pool_workers_are_invisible() {
    let mut engine = build();
    assert!(engine.worker_snapshot().iter().all(|w| w.kind == DA));
    let err = engine.create_assignment("t", "r1", AssignmentType::Primary).unwrap_err();
    assert!(matches!(err.as_assignment(), Some(AssignmentError::NotFound { .. })));
}

#[test]
fn inactive_worker_is_rejected_but_keeps_assignments() {
    let mut engine = build();
    engine.create_assignment("a", "r1", AssignmentType::Primary).unwrap();
    assert!(engine.set_worker_active("a", false).unwrap());
    assert!(!engine.set_worker_active("a", false).unwrap());

    let err = engine.create_assignment("a", "r2", AssignmentType::Primary).unwrap_err();
    assert!(matches!(err.as_assignment(), Some(AssignmentError::WorkerInactive { .. })));
    assert_eq!(engine.assignments_for_worker("a").len(), 1);
}

#[test]
fn completion_releases_workload_and_is_terminal() {
    let mut engine = build();
    let a = engine.create_assignment("b", "r2", AssignmentType::Primary).unwrap();

    let done = engine.complete_assignment(&a.assignment_id).unwrap();
    assert_eq!(done.status, LifecycleStatus::Completed);
    assert_eq!(engine.worker_workload("b").unwrap(), 0);
    assert_eq!(engine.role_status("r2").unwrap(), FulfillmentStatus::Unassigned);

    for err in [
        engine.complete_assignment(&a.assignment_id).unwrap_err(),
        engine.remove_assignment(&a.assignment_id).unwrap_err(),
        engine.confirm_assignment(&a.assignment_id).unwrap_err(),
    ] {
        assert!(matches!(
            err.as_assignment(),
            Some(AssignmentError::InvalidTransition { from: LifecycleStatus::Completed, .. })
        ));
    }
}

#[test]
fn closing_a_role_completes_its_assignments_and_blocks_new_ones() {
    let mut engine = build();
    engine.create_assignment("a", "r1", AssignmentType::Primary).unwrap();
    engine.create_assignment("b", "r1", AssignmentType::Secondary).unwrap();

    let closure = engine.close_role("r1").unwrap();
    assert_eq!(closure.completed.len(), 2);
    assert!(closure.dropped.is_empty());
    assert_eq!(engine.worker_workload("a").unwrap(), 10);
    assert_eq!(engine.worker_workload("b").unwrap(), 0);
    assert!(matches!(engine.last_events().last(), Some(MappingEvent::RoleClosed { completed: 2, .. })));

    let err = engine.create_assignment("a", "r1", AssignmentType::Backup).unwrap_err();
    assert!(matches!(err.as_assignment(), Some(AssignmentError::RoleClosed { .. })));
    assert!(engine.close_role("r1").is_err());
    assert_eq!(engine.fulfillment_summary().closed, 1);
}

#[test]
fn repository_failure_rolls_back_the_mutation() {
    let mut engine = build();
    engine.repository_mut().set_offline(true);

    let err = engine.create_assignment("a", "r1", AssignmentType::Primary).unwrap_err();
    assert!(err.as_assignment().is_none());
    assert_eq!(engine.worker_workload("a").unwrap(), 10);
    assert!(engine.active_assignments(None).is_empty());

    engine.repository_mut().set_offline(false);
    engine.create_assignment("a", "r1", AssignmentType::Primary).expect("retry after recovery");
    assert_eq!(engine.repository().snapshot().assignments.len(), 1);
}
