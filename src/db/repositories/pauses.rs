use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_i64},
    StoreError,
};
use crate::models::Pause;

impl Database {
    pub async fn insert_pause(&self, pause: &Pause) -> Result<(), StoreError> {
        let record = pause.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO pauses (id, session_id, started_at, ended_at, duration_secs)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.session_id,
                    record.started_at.to_rfc3339(),
                    record.ended_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.duration_secs.map(to_i64).transpose()?,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_open_pause(&self, session_id: &str) -> Result<Option<Pause>, StoreError> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, started_at
                 FROM pauses
                 WHERE session_id = ?1 AND ended_at IS NULL
                 ORDER BY started_at DESC
                 LIMIT 1",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            if let Some(row) = rows.next()? {
                let pause = Pause {
                    id: row.get::<_, String>(0)?,
                    session_id: row.get::<_, String>(1)?,
                    started_at: parse_datetime(&row.get::<_, String>(2)?, "started_at")?,
                    ended_at: None,
                    duration_secs: None,
                };
                Ok(Some(pause))
            } else {
                Ok(None)
            }
        })
        .await
    }

    /// Close every open pause interval for a session, stamping the duration.
    /// Called on resume and on stop-while-paused.
    pub async fn finalize_open_pauses(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, started_at FROM pauses
                 WHERE session_id = ?1 AND ended_at IS NULL",
            )?;

            let mut rows = stmt.query(params![session_id.clone()])?;
            while let Some(row) = rows.next()? {
                let pause_id: String = row.get(0)?;
                let started_at = parse_datetime(&row.get::<_, String>(1)?, "started_at")?;
                let duration_secs = (ended_at - started_at).num_seconds().max(0) as u64;
                conn.execute(
                    "UPDATE pauses
                     SET ended_at = ?1,
                         duration_secs = ?2
                     WHERE id = ?3",
                    params![ended_at.to_rfc3339(), to_i64(duration_secs)?, pause_id],
                )?;
            }

            Ok(())
        })
        .await
    }
}
