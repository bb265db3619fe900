use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime, parse_status, to_i64, to_u64},
    StoreError,
};
use crate::models::Session;

const SESSION_COLUMNS: &str = "id, owner_id, label, target_secs, started_at, paused_at, \
     total_paused_secs, stopped_at, status, created_at, updated_at";

fn row_to_session(row: &Row) -> Result<Session, StoreError> {
    let started_at: String = row.get("started_at")?;
    let paused_at: Option<String> = row.get("paused_at")?;
    let stopped_at: Option<String> = row.get("stopped_at")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let status: String = row.get("status")?;
    let target_secs: i64 = row.get("target_secs")?;
    let total_paused_secs: i64 = row.get("total_paused_secs")?;

    Ok(Session {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        label: row.get("label")?,
        target_secs: to_u64(target_secs, "target_secs")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        paused_at: parse_optional_datetime(paused_at, "paused_at")?,
        total_paused_secs: to_u64(total_paused_secs, "total_paused_secs")?,
        stopped_at: parse_optional_datetime(stopped_at, "stopped_at")?,
        status: parse_status(&status)?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

impl Database {
    /// Insert a freshly started session. The partial unique index on
    /// non-completed sessions rejects a second active session per owner.
    pub async fn create_active(&self, session: &Session) -> Result<(), StoreError> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, owner_id, label, target_secs, started_at, paused_at, \
                 total_paused_secs, stopped_at, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id,
                    record.owner_id,
                    record.label,
                    to_i64(record.target_secs)?,
                    record.started_at.to_rfc3339(),
                    record.paused_at.as_ref().map(|dt| dt.to_rfc3339()),
                    to_i64(record.total_paused_secs)?,
                    record.stopped_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.status.as_str(),
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|err| match err {
                rusqlite::Error::SqliteFailure(code, _)
                    if code.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::ActiveSessionExists
                }
                other => StoreError::Sqlite(other),
            })?;
            Ok(())
        })
        .await
    }

    /// Owner mismatch is indistinguishable from absence.
    pub async fn find_by_id(
        &self,
        owner_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, StoreError> {
        let owner_id = owner_id.to_string();
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1 AND owner_id = ?2"
            ))?;

            let mut rows = stmt.query(params![session_id, owner_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_session(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// The single non-completed session for an owner, if any.
    pub async fn find_active(&self, owner_id: &str) -> Result<Option<Session>, StoreError> {
        let owner_id = owner_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE owner_id = ?1 AND status <> 'Completed'
                 ORDER BY started_at DESC
                 LIMIT 1"
            ))?;

            let mut rows = stmt.query(params![owner_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_session(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn list_recent(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<Session>, StoreError> {
        let owner_id = owner_id.to_string();
        let limit = limit as i64;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE owner_id = ?1
                 ORDER BY started_at DESC
                 LIMIT ?2"
            ))?;

            let mut rows = stmt.query(params![owner_id, limit])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    pub async fn completed_since(
        &self,
        owner_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Session>, StoreError> {
        let owner_id = owner_id.to_string();
        let since = since.to_rfc3339();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE owner_id = ?1 AND status = 'Completed' AND stopped_at >= ?2
                 ORDER BY stopped_at DESC"
            ))?;

            let mut rows = stmt.query(params![owner_id, since])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    /// Running -> Paused, guarded by the expected current status. Returns the
    /// number of rows changed; zero means another transition won the race and
    /// the caller must re-read before deciding anything.
    pub async fn mark_paused(
        &self,
        owner_id: &str,
        session_id: &str,
        paused_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let owner_id = owner_id.to_string();
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE sessions
                 SET status = 'Paused',
                     paused_at = ?1,
                     updated_at = ?2
                 WHERE id = ?3 AND owner_id = ?4 AND status = 'Running'",
                params![
                    paused_at.to_rfc3339(),
                    updated_at.to_rfc3339(),
                    session_id,
                    owner_id,
                ],
            )?;
            Ok(changed)
        })
        .await
    }

    /// Paused -> Running, folding the finished pause into the running total.
    pub async fn mark_running(
        &self,
        owner_id: &str,
        session_id: &str,
        total_paused_secs: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let owner_id = owner_id.to_string();
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE sessions
                 SET status = 'Running',
                     paused_at = NULL,
                     total_paused_secs = ?1,
                     updated_at = ?2
                 WHERE id = ?3 AND owner_id = ?4 AND status = 'Paused'",
                params![
                    to_i64(total_paused_secs)?,
                    updated_at.to_rfc3339(),
                    session_id,
                    owner_id,
                ],
            )?;
            Ok(changed)
        })
        .await
    }

    /// Terminal transition; accepted from Running or Paused, never twice.
    pub async fn finalize(
        &self,
        owner_id: &str,
        session_id: &str,
        total_paused_secs: u64,
        stopped_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let owner_id = owner_id.to_string();
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE sessions
                 SET status = 'Completed',
                     paused_at = NULL,
                     total_paused_secs = ?1,
                     stopped_at = ?2,
                     updated_at = ?3
                 WHERE id = ?4 AND owner_id = ?5 AND status <> 'Completed'",
                params![
                    to_i64(total_paused_secs)?,
                    stopped_at.to_rfc3339(),
                    updated_at.to_rfc3339(),
                    session_id,
                    owner_id,
                ],
            )?;
            Ok(changed)
        })
        .await
    }
}
