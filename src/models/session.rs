use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;

/// Label applied when the caller supplies none (or only whitespace).
pub const DEFAULT_LABEL: &str = "Pomodoro Session";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Running,
    Paused,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "Running",
            SessionStatus::Paused => "Paused",
            SessionStatus::Completed => "Completed",
        }
    }
}

/// The canonical session record. Owned by the store; every other layer works
/// with a [`SessionInfo`] projection derived from it.
///
/// Invariant: `paused_at` is set iff `status == Paused`, `stopped_at` is set
/// iff `status == Completed`, and `total_paused_secs` only grows when a pause
/// is folded on resume or stop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub owner_id: String,
    pub label: String,
    pub target_secs: u64,
    pub started_at: DateTime<Utc>,
    pub paused_at: Option<DateTime<Utc>>,
    pub total_paused_secs: u64,
    pub stopped_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        if self.is_completed() {
            return 0;
        }
        clock::remaining_secs(
            self.target_secs,
            self.started_at,
            self.paused_at,
            self.total_paused_secs,
            now,
        )
    }
}

/// Read-only projection returned by every lifecycle operation, carrying the
/// freshly computed remaining time so callers can resynchronize their display
/// without trusting their own elapsed-time tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub owner_id: String,
    pub label: String,
    pub target_secs: u64,
    pub started_at: DateTime<Utc>,
    pub paused_at: Option<DateTime<Utc>>,
    pub total_paused_secs: u64,
    pub stopped_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub remaining_secs: u64,
}

impl SessionInfo {
    pub fn project(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id.clone(),
            owner_id: session.owner_id.clone(),
            label: session.label.clone(),
            target_secs: session.target_secs,
            started_at: session.started_at,
            paused_at: session.paused_at,
            total_paused_secs: session.total_paused_secs,
            stopped_at: session.stopped_at,
            status: session.status,
            remaining_secs: session.remaining_secs(now),
        }
    }
}
