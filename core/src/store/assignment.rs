//! Assignment record queries.

use super::{parse_column, MappingStore};
use crate::{
    assignment_store::Assignment,
    error::MappingResult,
    types::{LifecycleStatus, Percent, WorkerKind},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

struct AssignmentRow {
    assignment_id:    String,
    worker_id:        String,
    role_id:          String,
    assignment_type:  String,
    workload_percent: Percent,
    assigned_at:      String,
    status:           String,
}

impl AssignmentRow {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            assignment_id:    r.get(0)?,
            worker_id:        r.get(1)?,
            role_id:          r.get(2)?,
            assignment_type:  r.get(3)?,
            workload_percent: r.get(4)?,
            assigned_at:      r.get(5)?,
            status:           r.get(6)?,
        })
    }

    fn into_assignment(self) -> MappingResult<Assignment> {
        Ok(Assignment {
            assignment_type:  parse_column("assignment", "assignment_type", &self.assignment_type)?,
            assigned_at:      parse_column::<DateTime<Utc>>("assignment", "assigned_at", &self.assigned_at)?,
            status:           parse_column("assignment", "status", &self.status)?,
            assignment_id:    self.assignment_id,
            worker_id:        self.worker_id,
            role_id:          self.role_id,
            workload_percent: self.workload_percent,
        })
    }
}

impl MappingStore {
    pub(super) fn insert_assignment(&self, a: &Assignment) -> MappingResult<()> {
        self.conn.execute(
            "INSERT INTO assignment (
                assignment_id, worker_id, role_id, assignment_type,
                workload_percent, assigned_at, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &a.assignment_id,
                &a.worker_id,
                &a.role_id,
                a.assignment_type.as_str(),
                a.workload_percent,
                a.assigned_at.to_rfc3339(),
                a.status.as_str(),
            ],
        )?;
        Ok(())
    }

    pub(super) fn delete_assignment(&self, assignment_id: &str) -> MappingResult<()> {
        self.conn.execute(
            "DELETE FROM assignment WHERE assignment_id = ?1",
            params![assignment_id],
        )?;
        Ok(())
    }

    pub(super) fn update_assignment_status(
        &self,
        assignment_id: &str,
        status: LifecycleStatus,
    ) -> MappingResult<()> {
        self.conn.execute(
            "UPDATE assignment SET status = ?1 WHERE assignment_id = ?2",
            params![status.as_str(), assignment_id],
        )?;
        Ok(())
    }

    pub fn get_assignment(&self, assignment_id: &str) -> MappingResult<Option<Assignment>> {
        let row = self
            .conn
            .query_row(
                "SELECT assignment_id, worker_id, role_id, assignment_type,
                        workload_percent, assigned_at, status
                 FROM assignment WHERE assignment_id = ?1",
                params![assignment_id],
                AssignmentRow::from_row,
            )
            .optional()?;
        row.map(AssignmentRow::into_assignment).transpose()
    }

    /// Every assignment held by a worker of `kind`, oldest first.
    pub fn assignments_for_kind(&self, kind: WorkerKind) -> MappingResult<Vec<Assignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.assignment_id, a.worker_id, a.role_id, a.assignment_type,
                    a.workload_percent, a.assigned_at, a.status
             FROM assignment a
             JOIN worker w ON w.worker_id = a.worker_id
             WHERE w.kind = ?1
             ORDER BY a.assigned_at, a.assignment_id",
        )?;
        let rows = stmt
            .query_map(params![kind.as_str()], AssignmentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(AssignmentRow::into_assignment).collect()
    }

    pub fn count_assignments(&self, status: LifecycleStatus) -> MappingResult<u32> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM assignment WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?)
    }
}
