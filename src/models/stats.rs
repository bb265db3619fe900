use serde::{Deserialize, Serialize};

/// Aggregate over the sessions an owner completed since local midnight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusStats {
    pub completed_count: u64,
    pub focus_secs: u64,
    pub paused_secs: u64,
}
