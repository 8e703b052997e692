//! Deterministic synthetic pools for the runner's demo mode and tests.
//! Real deployments load their pool from the data feed instead.
//!
//! Curated lists of names, skills, and clients; same seed, same pool.
//! Generated workers carry no outside workload.

use crate::{
    rng::{PoolRng, RngBank, StreamSlot},
    role::RoleRequisition,
    snapshot::Snapshot,
    types::{Availability, Priority, WorkerKind},
    worker::WorkerProfile,
};
use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolShape {
    pub delivery_workers: usize,
    pub talent_workers:   usize,
    /// Open roles per pool.
    pub roles:            usize,
}

impl Default for PoolShape {
    fn default() -> Self {
        Self { delivery_workers: 12, talent_workers: 6, roles: 8 }
    }
}

pub struct PoolGenerator {
    bank:  RngBank,
    epoch: NaiveDate,
}

impl PoolGenerator {
    /// `epoch` anchors generated due dates.
    pub fn new(seed: u64, epoch: NaiveDate) -> Self {
        Self { bank: RngBank::new(seed), epoch }
    }

    pub fn generate(&self, shape: PoolShape) -> Snapshot {
        let mut workers = self.workers(WorkerKind::DeliveryAssociate, shape.delivery_workers);
        workers.extend(self.workers(WorkerKind::TalentAcquisition, shape.talent_workers));
        let mut rng = self.bank.stream(StreamSlot::Roles);
        let mut roles = self.roles(&mut rng, WorkerKind::DeliveryAssociate, shape.roles);
        roles.extend(self.roles(&mut rng, WorkerKind::TalentAcquisition, shape.roles));
        log::debug!(
            "pool generator: {} workers, {} roles",
            workers.len(),
            roles.len()
        );
        Snapshot { workers, roles, assignments: Vec::new() }
    }

    fn workers(&self, kind: WorkerKind, count: usize) -> Vec<WorkerProfile> {
        let (slot, prefix, skills) = match kind {
            WorkerKind::DeliveryAssociate => (StreamSlot::DeliveryWorkers, "da", DELIVERY_SKILLS),
            WorkerKind::TalentAcquisition => (StreamSlot::TalentWorkers, "ta", TALENT_SKILLS),
        };
        let mut rng = self.bank.stream(slot);

        (1..=count)
            .map(|n| {
                let skill_count = rng.between(2, 5) as usize;
                let (location, timezone) = rng.pick(LOCATIONS).copied().unwrap_or(("Remote", "UTC"));
                WorkerProfile::new(format!("{prefix}-{n:03}"), kind, full_name(&mut rng))
                    .with_skills(rng.pick_many(skills, skill_count).into_iter().copied())
                    .with_experience(rng.between(0, 15))
                    .with_availability(availability(&mut rng))
                    .with_performance(rng.between(55, 100))
                    .with_location(location, timezone)
            })
            .collect()
    }

    fn roles(&self, rng: &mut PoolRng, pool: WorkerKind, count: usize) -> Vec<RoleRequisition> {
        let (prefix, skills, titles) = match pool {
            WorkerKind::DeliveryAssociate => ("da", DELIVERY_SKILLS, DELIVERY_TITLES),
            WorkerKind::TalentAcquisition => ("ta", TALENT_SKILLS, TALENT_TITLES),
        };

        (1..=count)
            .map(|n| {
                let client = rng.pick(CLIENTS).copied().unwrap_or("Internal");
                let title = rng.pick(titles).copied().unwrap_or("Consultant");
                let skill_count = rng.between(1, 3) as usize;
                let priority = match rng.between(0, 2) {
                    0 => Priority::High,
                    1 => Priority::Medium,
                    _ => Priority::Low,
                };
                let mut role = RoleRequisition::new(format!("{prefix}-role-{n:03}"), client, rng.between(1, 4))
                    .for_pool(pool)
                    .with_title(format!("{title} ({client})"))
                    .with_skills(rng.pick_many(skills, skill_count).into_iter().copied())
                    .with_priority(priority);
                if rng.chance(0.7) {
                    role = role.with_due_date(self.epoch + Duration::days(rng.between(7, 90) as i64));
                }
                role
            })
            .collect()
    }
}

fn full_name(rng: &mut PoolRng) -> String {
    let first = rng.pick(FIRST_NAMES).copied().unwrap_or("Alex");
    let last = rng.pick(LAST_NAMES).copied().unwrap_or("Smith");
    format!("{first} {last}")
}

fn availability(rng: &mut PoolRng) -> Availability {
    let roll = rng.next_f64();
    if roll < 0.7 {
        Availability::Available
    } else if roll < 0.92 {
        Availability::Busy
    } else {
        Availability::Unavailable
    }
}

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "Michael", "Jennifer", "David", "Linda",
    "Daniel", "Elizabeth", "Priya", "Wei", "Amara", "Mateo", "Yuki", "Fatima",
    "Olusegun", "Ingrid", "Rahul", "Sofia", "Kwame", "Lucia", "Hiroshi", "Aisha",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Garcia", "Brown", "Nguyen", "Patel", "Kim", "Okafor",
    "Rossi", "Müller", "Tanaka", "Haddad", "Silva", "Kowalski", "Chen", "Lindqvist",
];

const DELIVERY_SKILLS: &[&str] = &[
    "rust", "java", "python", "sql", "react", "aws", "kubernetes", "data modelling",
    "testing", "security", "go", "terraform",
];

const TALENT_SKILLS: &[&str] = &[
    "sourcing", "technical screening", "executive search", "campus hiring",
    "negotiation", "employer branding",
];

const CLIENTS: &[&str] = &[
    "Northwind", "Contoso", "Globex", "Initech", "Umbrella Health", "Stark Logistics",
];

const DELIVERY_TITLES: &[&str] = &[
    "Backend Engineer", "Data Engineer", "Platform Engineer", "QA Lead",
    "Frontend Engineer", "Delivery Lead",
];

const TALENT_TITLES: &[&str] = &[
    "Technical Recruiter", "Sourcing Partner", "Campus Recruiter", "Executive Search Lead",
];

const LOCATIONS: &[(&str, &str)] = &[
    ("London", "Europe/London"),
    ("Bengaluru", "Asia/Kolkata"),
    ("New York", "America/New_York"),
    ("Berlin", "Europe/Berlin"),
    ("Singapore", "Asia/Singapore"),
    ("Remote", "UTC"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn same_seed_same_pool() {
        let a = PoolGenerator::new(99, epoch()).generate(PoolShape::default());
        let b = PoolGenerator::new(99, epoch()).generate(PoolShape::default());
        assert_eq!(a, b);
    }

    #[test]
    fn shape_is_respected() {
        let shape = PoolShape { delivery_workers: 5, talent_workers: 3, roles: 4 };
        let pool = PoolGenerator::new(1, epoch()).generate(shape);
        assert_eq!(pool.workers.iter().filter(|w| w.kind == WorkerKind::DeliveryAssociate).count(), 5);
        assert_eq!(pool.workers.iter().filter(|w| w.kind == WorkerKind::TalentAcquisition).count(), 3);
        assert_eq!(pool.roles.iter().filter(|r| r.pool == WorkerKind::DeliveryAssociate).count(), 4);
        assert_eq!(pool.roles.iter().filter(|r| r.pool == WorkerKind::TalentAcquisition).count(), 4);
        assert!(pool.workers.iter().all(|w| w.current_workload == 0 && !w.skills.is_empty()));
        assert!(pool.roles.iter().all(|r| r.required_headcount >= 1));
    }
}
