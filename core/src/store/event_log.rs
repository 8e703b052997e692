//! Event log queries.

use super::{parse_column, MappingStore};
use crate::{error::MappingResult, event::EventLogEntry, types::WorkerKind};
use chrono::{DateTime, Utc};
use rusqlite::params;

impl MappingStore {
    pub(super) fn append_event(&self, entry: &EventLogEntry) -> MappingResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (pool, sequence, event_type, payload, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.pool.as_str(),
                entry.sequence as i64,
                entry.event_type,
                entry.payload,
                entry.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// The full log for one pool, in sequence order.
    pub fn events_for_pool(&self, pool: WorkerKind) -> MappingResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sequence, event_type, payload, recorded_at
             FROM event_log WHERE pool = ?1
             ORDER BY sequence ASC",
        )?;
        let rows = stmt
            .query_map(params![pool.as_str()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)? as u64,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, sequence, event_type, payload, recorded_at)| {
                Ok(EventLogEntry {
                    id: Some(id),
                    sequence,
                    pool,
                    event_type,
                    payload,
                    recorded_at: parse_column::<DateTime<Utc>>("event_log", "recorded_at", &recorded_at)?,
                })
            })
            .collect()
    }

    pub fn count_events(&self, pool: WorkerKind, event_type: &str) -> MappingResult<u32> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE pool = ?1 AND event_type = ?2",
            params![pool.as_str(), event_type],
            |r| r.get(0),
        )?)
    }

    pub(super) fn max_sequence(&self, pool: WorkerKind) -> MappingResult<u64> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(sequence) FROM event_log WHERE pool = ?1",
            params![pool.as_str()],
            |r| r.get(0),
        )?;
        Ok(max.unwrap_or(0) as u64)
    }
}
