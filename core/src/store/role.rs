//! Role requisition queries.

use super::{parse_column, MappingStore};
use crate::{error::MappingResult, role::RoleRequisition, types::WorkerKind};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

struct RoleRow {
    role_id:            String,
    client_id:          String,
    pool:               String,
    title:              String,
    required_headcount: u32,
    required_skills:    String,
    priority:           String,
    due_date:           Option<String>,
    closed:             bool,
}

impl RoleRow {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            role_id:            r.get(0)?,
            client_id:          r.get(1)?,
            pool:               r.get(2)?,
            title:              r.get(3)?,
            required_headcount: r.get(4)?,
            required_skills:    r.get(5)?,
            priority:           r.get(6)?,
            due_date:           r.get(7)?,
            closed:             r.get::<_, i32>(8)? != 0,
        })
    }

    fn into_role(self) -> MappingResult<RoleRequisition> {
        let due_date = match &self.due_date {
            Some(text) => Some(parse_column::<NaiveDate>("role", "due_date", text)?),
            None => None,
        };
        Ok(RoleRequisition {
            pool:               parse_column("role", "pool", &self.pool)?,
            priority:           parse_column("role", "priority", &self.priority)?,
            required_skills:    serde_json::from_str(&self.required_skills)?,
            due_date,
            role_id:            self.role_id,
            client_id:          self.client_id,
            title:              self.title,
            required_headcount: self.required_headcount,
            closed:             self.closed,
        })
    }
}

const ROLE_COLUMNS: &str =
    "role_id, client_id, pool, title, required_headcount, required_skills, priority, due_date, closed";

impl MappingStore {
    pub fn upsert_role(&self, r: &RoleRequisition) -> MappingResult<()> {
        self.conn.execute(
            "INSERT INTO role (
                role_id, client_id, pool, title, required_headcount, required_skills,
                priority, due_date, closed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(role_id) DO UPDATE SET
                client_id=excluded.client_id, pool=excluded.pool, title=excluded.title,
                required_headcount=excluded.required_headcount,
                required_skills=excluded.required_skills, priority=excluded.priority,
                due_date=excluded.due_date, closed=excluded.closed",
            params![
                &r.role_id,
                &r.client_id,
                r.pool.as_str(),
                &r.title,
                r.required_headcount,
                serde_json::to_string(&r.required_skills)?,
                r.priority.as_str(),
                r.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                if r.closed { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }

    pub fn get_role(&self, role_id: &str) -> MappingResult<Option<RoleRequisition>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ROLE_COLUMNS} FROM role WHERE role_id = ?1"),
                params![role_id],
                RoleRow::from_row,
            )
            .optional()?;
        row.map(RoleRow::into_role).transpose()
    }

    pub fn list_roles(&self) -> MappingResult<Vec<RoleRequisition>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ROLE_COLUMNS} FROM role ORDER BY role_id"))?;
        let rows = stmt
            .query_map([], RoleRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RoleRow::into_role).collect()
    }

    pub fn roles_of_kind(&self, kind: WorkerKind) -> MappingResult<Vec<RoleRequisition>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ROLE_COLUMNS} FROM role WHERE pool = ?1 ORDER BY role_id"
        ))?;
        let rows = stmt
            .query_map(params![kind.as_str()], RoleRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RoleRow::into_role).collect()
    }

    pub(super) fn close_role(&self, role_id: &str) -> MappingResult<()> {
        self.conn
            .execute("UPDATE role SET closed = 1 WHERE role_id = ?1", params![role_id])?;
        Ok(())
    }
}
