//! Pool member profiles as supplied by the data feed.

use crate::types::{normalise_skill, Availability, Percent, WorkerId, WorkerKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub worker_id:           WorkerId,
    pub kind:                WorkerKind,
    pub name:                String,
    #[serde(default)]
    pub skills:              BTreeSet<String>,
    #[serde(default)]
    pub years_experience:    u32,
    /// Workload committed outside this board. The ledger adds the
    /// worker's live assignments on top of it when the pool is loaded.
    #[serde(default)]
    pub current_workload:    Percent,
    /// None falls back to the policy default.
    #[serde(default)]
    pub max_capacity:        Option<Percent>,
    pub availability:        Availability,
    #[serde(default)]
    pub performance_score:   u32,
    #[serde(default)]
    pub location:            String,
    #[serde(default)]
    pub timezone:            String,
    #[serde(default = "default_true")]
    pub active:              bool,
}

fn default_true() -> bool {
    true
}

impl WorkerProfile {
    pub fn new(worker_id: impl Into<WorkerId>, kind: WorkerKind, name: impl Into<String>) -> Self {
        Self {
            worker_id:         worker_id.into(),
            kind,
            name:              name.into(),
            skills:            BTreeSet::new(),
            years_experience:  0,
            current_workload:  0,
            max_capacity:      None,
            availability:      Availability::Available,
            performance_score: 50,
            location:          String::new(),
            timezone:          String::new(),
            active:            true,
        }
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skills = skills.into_iter().map(|s| normalise_skill(s.as_ref())).collect();
        self
    }

    pub fn with_workload(mut self, workload: Percent) -> Self {
        self.current_workload = workload;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: Percent) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_performance(mut self, score: u32) -> Self {
        self.performance_score = score.min(100);
        self
    }

    pub fn with_experience(mut self, years: u32) -> Self {
        self.years_experience = years;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>, timezone: impl Into<String>) -> Self {
        self.location = location.into();
        self.timezone = timezone.into();
        self
    }

    /// Capacity ceiling, resolving an unset value against the policy default.
    pub fn capacity(&self, default_max: Percent) -> Percent {
        self.max_capacity.unwrap_or(default_max)
    }

    /// Re-normalise skills and clamp scores after deserialising feed data.
    pub fn normalised(mut self) -> Self {
        self.skills = self.skills.iter().map(|s| normalise_skill(s)).filter(|s| !s.is_empty()).collect();
        self.performance_score = self.performance_score.min(100);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skills_are_case_insensitive() {
        let w = WorkerProfile::new("w1", WorkerKind::DeliveryAssociate, "Ann")
            .with_skills(["React", " react ", "SQL"]);
        assert_eq!(w.skills.len(), 2);
        assert!(w.skills.contains("react"));
        assert!(w.skills.contains("sql"));
    }

    #[test]
    fn feed_profile_defaults() {
        let json = r#"{
            "worker_id": "ta-7",
            "kind": "talent_acquisition",
            "name": "Ravi",
            "skills": ["Sourcing", ""],
            "availability": "busy"
        }"#;
        let w: WorkerProfile = serde_json::from_str(json).unwrap();
        let w = w.normalised();
        assert!(w.active);
        assert_eq!(w.capacity(100), 100);
        assert_eq!(w.skills.iter().collect::<Vec<_>>(), vec!["sourcing"]);
    }
}
