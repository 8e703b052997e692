//! Worker profile queries.

use super::{parse_column, MappingStore};
use crate::{
    error::MappingResult,
    types::{Percent, WorkerKind},
    worker::WorkerProfile,
};
use rusqlite::{params, OptionalExtension, Row};

/// Columns as stored; enums and skills are still text.
struct WorkerRow {
    worker_id:         String,
    kind:              String,
    name:              String,
    skills:            String,
    years_experience:  u32,
    current_workload:  Percent,
    max_capacity:      Option<Percent>,
    availability:      String,
    performance_score: u32,
    location:          String,
    timezone:          String,
    active:            bool,
}

impl WorkerRow {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            worker_id:         r.get(0)?,
            kind:              r.get(1)?,
            name:              r.get(2)?,
            skills:            r.get(3)?,
            years_experience:  r.get(4)?,
            current_workload:  r.get(5)?,
            max_capacity:      r.get(6)?,
            availability:      r.get(7)?,
            performance_score: r.get(8)?,
            location:          r.get(9)?,
            timezone:          r.get(10)?,
            active:            r.get::<_, i32>(11)? != 0,
        })
    }

    fn into_profile(self) -> MappingResult<WorkerProfile> {
        Ok(WorkerProfile {
            kind:              parse_column("worker", "kind", &self.kind)?,
            availability:      parse_column("worker", "availability", &self.availability)?,
            skills:            serde_json::from_str(&self.skills)?,
            worker_id:         self.worker_id,
            name:              self.name,
            years_experience:  self.years_experience,
            current_workload:  self.current_workload,
            max_capacity:      self.max_capacity,
            performance_score: self.performance_score,
            location:          self.location,
            timezone:          self.timezone,
            active:            self.active,
        })
    }
}

const WORKER_COLUMNS: &str = "worker_id, kind, name, skills, years_experience, current_workload,
     max_capacity, availability, performance_score, location, timezone, active";

impl MappingStore {
    pub fn upsert_worker(&self, w: &WorkerProfile) -> MappingResult<()> {
        self.conn.execute(
            "INSERT INTO worker (
                worker_id, kind, name, skills, years_experience, current_workload,
                max_capacity, availability, performance_score, location, timezone, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(worker_id) DO UPDATE SET
                kind=excluded.kind, name=excluded.name, skills=excluded.skills,
                years_experience=excluded.years_experience,
                current_workload=excluded.current_workload,
                max_capacity=excluded.max_capacity, availability=excluded.availability,
                performance_score=excluded.performance_score, location=excluded.location,
                timezone=excluded.timezone, active=excluded.active",
            params![
                &w.worker_id,
                w.kind.as_str(),
                &w.name,
                serde_json::to_string(&w.skills)?,
                w.years_experience,
                w.current_workload,
                w.max_capacity,
                w.availability.as_str(),
                w.performance_score,
                &w.location,
                &w.timezone,
                if w.active { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }

    pub fn get_worker(&self, worker_id: &str) -> MappingResult<Option<WorkerProfile>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {WORKER_COLUMNS} FROM worker WHERE worker_id = ?1"),
                params![worker_id],
                WorkerRow::from_row,
            )
            .optional()?;
        row.map(WorkerRow::into_profile).transpose()
    }

    pub fn workers_of_kind(&self, kind: WorkerKind) -> MappingResult<Vec<WorkerProfile>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WORKER_COLUMNS} FROM worker WHERE kind = ?1 ORDER BY worker_id"
        ))?;
        let rows = stmt
            .query_map(params![kind.as_str()], WorkerRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(WorkerRow::into_profile).collect()
    }

    pub(super) fn update_worker_active(&self, worker_id: &str, active: bool) -> MappingResult<()> {
        self.conn.execute(
            "UPDATE worker SET active = ?1 WHERE worker_id = ?2",
            params![if active { 1 } else { 0 }, worker_id],
        )?;
        Ok(())
    }
}
