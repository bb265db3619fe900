use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pause interval in a session's history. The session's
/// `total_paused_secs` stays authoritative for time accounting; these rows
/// are an append-only ledger of when the pauses happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pause {
    pub id: String,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<u64>,
}
