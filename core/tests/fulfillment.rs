//! Role fulfillment tests.
//!
//! Status is always a pure function of (active count, headcount), and the
//! board's role views agree with it in every reachable state.

use mapping_core::{
    config::{MappingConfig, WorkloadPolicy},
    engine::MappingEngine,
    fulfillment,
    repository::MemoryRepository,
    role::RoleRequisition,
    snapshot::Snapshot,
    types::{AssignmentType, FulfillmentStatus, LifecycleStatus, WorkerKind},
    worker::WorkerProfile,
};

const DA: WorkerKind = WorkerKind::DeliveryAssociate;

fn build(headcount: u32) -> MappingEngine<MemoryRepository> {
    let snapshot = Snapshot {
        workers: vec![
            WorkerProfile::new("a", DA, "Ada"),
            WorkerProfile::new("b", DA, "Ben"),
            WorkerProfile::new("c", DA, "Cy"),
        ],
        roles: vec![RoleRequisition::new("R1", "acme", headcount)],
        assignments: vec![],
    };
    MappingEngine::build_test(DA, snapshot).expect("build test engine")
}

fn assert_status_is_pure(engine: &MappingEngine<MemoryRepository>) {
    for role in engine.role_snapshot() {
        let active = engine.active_assignments(Some(&role.role_id)).len();
        assert_eq!(role.active_count, active);
        assert_eq!(
            role.status,
            fulfillment::classify(active, role.required_headcount),
            "role {} diverged from the classification rule",
            role.role_id
        );
    }
}

#[test]
fn r1_scenario_stays_partial_after_removing_primary() {
    let mut engine = build(2);
    assert_eq!(engine.role_status("R1").unwrap(), FulfillmentStatus::Unassigned);

    let a = engine.create_assignment("a", "R1", AssignmentType::Primary).unwrap();
    assert_eq!(engine.role_status("R1").unwrap(), FulfillmentStatus::PartiallyAssigned);

    engine.create_assignment("b", "R1", AssignmentType::Secondary).unwrap();
    assert_eq!(engine.role_status("R1").unwrap(), FulfillmentStatus::FullyAssigned);

    engine.remove_assignment(&a.assignment_id).unwrap();
    assert_eq!(engine.role_status("R1").unwrap(), FulfillmentStatus::PartiallyAssigned);
    assert_status_is_pure(&engine);
}

#[test]
fn status_follows_active_count_through_a_sequence() {
    let mut engine = build(2);
    let mut ids = Vec::new();
    for (worker, kind) in [
        ("a", AssignmentType::Primary),
        ("b", AssignmentType::Secondary),
        ("c", AssignmentType::Backup),
    ] {
        ids.push(engine.create_assignment(worker, "R1", kind).unwrap().assignment_id);
        assert_status_is_pure(&engine);
    }
    for id in ids {
        engine.remove_assignment(&id).unwrap();
        assert_status_is_pure(&engine);
    }
    assert_eq!(engine.role_status("R1").unwrap(), FulfillmentStatus::Unassigned);
}

#[test]
fn backup_may_exceed_headcount_by_policy() {
    let mut engine = build(1);
    engine.create_assignment("a", "R1", AssignmentType::Primary).unwrap();
    engine.create_assignment("b", "R1", AssignmentType::Backup).expect("backup over headcount");

    let role = &engine.role_snapshot()[0];
    assert_eq!(role.active_count, 2);
    assert_eq!(role.status, FulfillmentStatus::FullyAssigned);
    assert_eq!(role.fulfillment_percent, 100.0);
}

#[test]
fn strict_policy_saturates_backups_too() {
    let config = MappingConfig {
        workload: WorkloadPolicy { backup_may_exceed_headcount: false, ..WorkloadPolicy::default() },
        ..MappingConfig::default_test()
    };
    let snapshot = Snapshot {
        workers: vec![WorkerProfile::new("a", DA, "Ada"), WorkerProfile::new("b", DA, "Ben")],
        roles: vec![RoleRequisition::new("R1", "acme", 1)],
        assignments: vec![],
    };
    let mut engine = MappingEngine::build_test_with_config(DA, snapshot, config).unwrap();
    engine.create_assignment("a", "R1", AssignmentType::Primary).unwrap();
    let err = engine.create_assignment("b", "R1", AssignmentType::Backup).unwrap_err();
    assert_eq!(err.as_assignment().map(|e| e.code()), Some("role_saturated"));
}

#[test]
fn zero_headcount_role_is_fully_assigned() {
    let engine = build(0);
    assert_eq!(engine.role_status("R1").unwrap(), FulfillmentStatus::FullyAssigned);
    assert_eq!(engine.role_snapshot()[0].fulfillment_percent, 100.0);
}

#[test]
fn pending_records_do_not_count_until_confirmed() {
    let config = MappingConfig {
        workload: WorkloadPolicy { require_confirmation: true, ..WorkloadPolicy::default() },
        ..MappingConfig::default_test()
    };
    let snapshot = Snapshot {
        workers: vec![WorkerProfile::new("a", DA, "Ada")],
        roles: vec![RoleRequisition::new("R1", "acme", 1)],
        assignments: vec![],
    };
    let mut engine = MappingEngine::build_test_with_config(DA, snapshot, config).unwrap();

    let pending = engine.create_assignment("a", "R1", AssignmentType::Primary).unwrap();
    assert_eq!(pending.status, LifecycleStatus::Pending);
    assert_eq!(engine.role_status("R1").unwrap(), FulfillmentStatus::Unassigned);
    assert_eq!(engine.pending_assignments().len(), 1);

    engine.confirm_assignment(&pending.assignment_id).unwrap();
    assert_eq!(engine.role_status("R1").unwrap(), FulfillmentStatus::FullyAssigned);
    assert!(engine.pending_assignments().is_empty());
}

#[test]
fn summary_counts_each_status_once() {
    let snapshot = Snapshot {
        workers: vec![WorkerProfile::new("a", DA, "Ada"), WorkerProfile::new("b", DA, "Ben")],
        roles: vec![
            RoleRequisition::new("full", "acme", 1),
            RoleRequisition::new("half", "acme", 2),
            RoleRequisition::new("empty", "acme", 1),
        ],
        assignments: vec![],
    };
    let mut engine = MappingEngine::build_test(DA, snapshot).unwrap();
    engine.create_assignment("a", "full", AssignmentType::Primary).unwrap();
    engine.create_assignment("b", "half", AssignmentType::Primary).unwrap();

    let summary = engine.fulfillment_summary();
    assert_eq!(summary.total_roles, 3);
    assert_eq!(summary.fully_assigned, 1);
    assert_eq!(summary.partially_assigned, 1);
    assert_eq!(summary.unassigned, 1);
}
