use std::convert::TryFrom;

use chrono::{DateTime, Utc};

use super::StoreError;
use crate::models::SessionStatus;

pub fn to_i64(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("value {value} exceeds SQLite INTEGER range")))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64, StoreError> {
    u64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{field} contains negative value {value}")))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| StoreError::Corrupt(format!("failed to parse {field}: {err}")))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_status(value: &str) -> Result<SessionStatus, StoreError> {
    match value {
        "Running" => Ok(SessionStatus::Running),
        "Paused" => Ok(SessionStatus::Paused),
        "Completed" => Ok(SessionStatus::Completed),
        other => Err(StoreError::Corrupt(format!("unknown session status {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_counters_surface_as_corrupt() {
        match to_u64(-1, "total_paused_secs") {
            Err(StoreError::Corrupt(msg)) => assert!(msg.contains("total_paused_secs")),
            other => panic!("expected corrupt error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_status_surfaces_as_corrupt() {
        assert!(matches!(parse_status("Cancelled"), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn datetime_round_trips_through_rfc3339() {
        let now = Utc::now();
        let parsed = parse_datetime(&now.to_rfc3339(), "started_at").unwrap();
        assert_eq!(parsed, now);
    }
}
