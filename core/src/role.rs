//! Open client role requisitions.

use crate::types::{normalise_skill, ClientId, Priority, RoleId, WorkerKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A staffing need at a client. Fulfillment status is never stored here;
/// ask `fulfillment::status_for`. Each role is staffed from exactly one
/// pool, so only that pool's board sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRequisition {
    pub role_id:            RoleId,
    pub client_id:          ClientId,
    #[serde(default)]
    pub pool:               WorkerKind,
    #[serde(default)]
    pub title:              String,
    pub required_headcount: u32,
    #[serde(default)]
    pub required_skills:    BTreeSet<String>,
    pub priority:           Priority,
    #[serde(default)]
    pub due_date:           Option<NaiveDate>,
    #[serde(default)]
    pub closed:             bool,
}

impl RoleRequisition {
    pub fn new(role_id: impl Into<RoleId>, client_id: impl Into<ClientId>, required_headcount: u32) -> Self {
        Self {
            role_id: role_id.into(),
            client_id: client_id.into(),
            pool: WorkerKind::default(),
            title: String::new(),
            required_headcount,
            required_skills: BTreeSet::new(),
            priority: Priority::Medium,
            due_date: None,
            closed: false,
        }
    }

    pub fn for_pool(mut self, pool: WorkerKind) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.required_skills = skills.into_iter().map(|s| normalise_skill(s.as_ref())).collect();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn normalised(mut self) -> Self {
        self.required_skills = self
            .required_skills
            .iter()
            .map(|s| normalise_skill(s))
            .filter(|s| !s.is_empty())
            .collect();
        self
    }
}
