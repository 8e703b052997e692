//! Recommendation tests: ranking, exclusions, caching, and applying a
//! suggestion through the drop path.

use mapping_core::{
    command::Intent,
    controller::RejectionReason,
    engine::MappingEngine,
    error::EntityKind,
    recommendation::Recommendation,
    repository::MemoryRepository,
    role::RoleRequisition,
    snapshot::Snapshot,
    types::{AssignmentType, Availability, Priority, WorkerKind},
    worker::WorkerProfile,
};

const DA: WorkerKind = WorkerKind::DeliveryAssociate;

fn pool() -> Snapshot {
    Snapshot {
        workers: vec![
            WorkerProfile::new("ada", DA, "Ada").with_skills(["Rust", "SQL"]).with_performance(100),
            WorkerProfile::new("ben", DA, "Ben")
                .with_skills(["rust"])
                .with_availability(Availability::Busy)
                .with_performance(100),
            WorkerProfile::new("cy", DA, "Cy")
                .with_skills(["rust", "sql"])
                .with_availability(Availability::Unavailable),
            WorkerProfile::new("dee", DA, "Dee").with_skills(["rust", "sql"]).with_workload(85),
        ],
        roles: vec![
            RoleRequisition::new("backend", "acme", 2)
                .with_skills(["rust", "sql"])
                .with_priority(Priority::High),
            RoleRequisition::new("reports", "globex", 1)
                .with_skills(["sql"])
                .with_priority(Priority::Low),
        ],
        assignments: vec![],
    }
}

fn build() -> MappingEngine<MemoryRepository> {
    MappingEngine::build_test(DA, pool()).expect("build test engine")
}

#[test]
fn same_state_same_ordered_output() {
    let mut a = build();
    let mut b = build();
    let first = a.recommendations();
    assert!(!first.is_empty());
    assert_eq!(first, a.recommendations());
    assert_eq!(first, b.recommendations());
}

#[test]
fn best_match_ranks_first_with_rationale() {
    let mut engine = build();
    let recs = engine.recommendations();
    let top = &recs[0];
    assert_eq!(top.worker_id, "ada");
    assert_eq!(top.confidence, 1.0);
    assert_eq!(top.suggested_type, AssignmentType::Primary);
    assert!(top.rationale.contains("rust, sql"), "rationale: {}", top.rationale);

    for pair in recs.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
}

#[test]
fn unavailable_and_overloaded_workers_are_skipped() {
    let mut engine = build();
    let recs = engine.recommendations();
    assert!(recs.iter().all(|r| r.worker_id != "cy"));
    // 85% committed cannot take a 50% primary.
    assert!(recs.iter().all(|r| r.worker_id != "dee"));
}

#[test]
fn busy_workers_are_down_weighted() {
    let mut engine = build();
    let recs = engine.recommendations();
    let ben = recs
        .iter()
        .find(|r| r.worker_id == "ben" && r.role_id == "backend")
        .expect("ben suggested for backend");
    let ada = recs
        .iter()
        .find(|r| r.worker_id == "ada" && r.role_id == "backend")
        .expect("ada suggested for backend");
    assert!(ben.confidence < ada.confidence);
}

#[test]
fn applying_a_recommendation_assigns_and_invalidates_the_set() {
    let mut engine = build();
    let recs = engine.recommendations();
    let id = Recommendation::id_for("ada", "backend");
    assert!(recs.iter().any(|r| r.recommendation_id == id));

    let outcome = engine
        .dispatch(Intent::ApplyRecommendation { recommendation_id: id.clone() })
        .unwrap();
    let created = outcome.created().expect("recommendation applied");
    assert_eq!((created.worker_id.as_str(), created.role_id.as_str()), ("ada", "backend"));

    // The set the id came from is stale now.
    let stale = engine
        .dispatch(Intent::ApplyRecommendation { recommendation_id: Recommendation::id_for("ben", "backend") })
        .unwrap();
    assert!(matches!(
        stale.rejection().map(|r| &r.reason),
        Some(RejectionReason::NotFound { entity: EntityKind::Recommendation, .. })
    ));

    let fresh = engine.recommendations();
    assert!(fresh.iter().all(|r| r.recommendation_id != id));
    assert!(fresh
        .iter()
        .filter(|r| r.role_id == "backend")
        .all(|r| r.suggested_type == AssignmentType::Secondary));
}

#[test]
fn saturated_and_closed_roles_get_no_suggestions() {
    let mut engine = build();
    engine.create_assignment("ada", "reports", AssignmentType::Primary).unwrap();
    engine.close_role("backend").unwrap();
    assert!(engine.recommendations().is_empty());
}

#[test]
fn inactive_workers_are_never_suggested() {
    let mut engine = build();
    engine.set_worker_active("ada", false).unwrap();
    assert!(engine.recommendations().iter().all(|r| r.worker_id != "ada"));
}

#[test]
fn ties_prefer_higher_priority_roles() {
    let snapshot = Snapshot {
        workers: vec![WorkerProfile::new("w", DA, "W").with_performance(100)],
        roles: vec![
            RoleRequisition::new("a-low", "acme", 1).with_priority(Priority::Low),
            RoleRequisition::new("z-high", "acme", 1).with_priority(Priority::High),
        ],
        assignments: vec![],
    };
    let mut engine = MappingEngine::build_test(DA, snapshot).unwrap();
    let order: Vec<String> = engine.recommendations().into_iter().map(|r| r.role_id).collect();
    assert_eq!(order, vec!["z-high".to_string(), "a-low".to_string()]);
}
