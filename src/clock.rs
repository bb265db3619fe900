//! Wall-clock arithmetic for session timing.
//!
//! Remaining time is always derived from persisted timestamps; nothing in
//! the crate keeps a decrementing counter as the system of record. All
//! functions here are pure so they can be exercised with fixed timestamps.

use chrono::{DateTime, Duration, Local, NaiveTime, Utc};

/// Whole seconds elapsed since the current pause began, floored, never
/// negative (a caller clock stepping backwards reads as zero).
pub fn pause_elapsed_secs(paused_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - paused_at).num_seconds().max(0) as u64
}

/// Seconds left in a session given its persisted timestamps.
///
/// `remaining = target - (now - started_at - total_paused - current_pause)`,
/// floored to whole seconds and clamped at zero. Zero means the session is
/// due for finalization.
pub fn remaining_secs(
    target_secs: u64,
    started_at: DateTime<Utc>,
    paused_at: Option<DateTime<Utc>>,
    total_paused_secs: u64,
    now: DateTime<Utc>,
) -> u64 {
    let elapsed = (now - started_at).num_seconds().max(0) as u64;
    let paused = total_paused_secs
        .saturating_add(paused_at.map(|p| pause_elapsed_secs(p, now)).unwrap_or(0));
    let consumed = elapsed.saturating_sub(paused);
    target_secs.saturating_sub(consumed)
}

/// Focused (non-paused) seconds between start and stop.
pub fn active_secs(
    started_at: DateTime<Utc>,
    stopped_at: DateTime<Utc>,
    total_paused_secs: u64,
) -> u64 {
    let elapsed = (stopped_at - started_at).num_seconds().max(0) as u64;
    elapsed.saturating_sub(total_paused_secs)
}

/// The instant a running session's remaining time reaches zero. Used as the
/// finalization timestamp on natural expiry so that a late observation does
/// not inflate the recorded session length.
pub fn natural_end(
    started_at: DateTime<Utc>,
    target_secs: u64,
    total_paused_secs: u64,
) -> DateTime<Utc> {
    started_at + Duration::seconds(target_secs.saturating_add(total_paused_secs) as i64)
}

/// Today's local-midnight boundary, expressed in UTC for store queries.
pub fn local_midnight_utc(now: DateTime<Local>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(now.timezone())
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    #[test]
    fn fresh_session_has_full_remaining() {
        let t0 = at("2026-08-01T09:00:00Z");
        assert_eq!(remaining_secs(1500, t0, None, 0, t0), 1500);
    }

    #[test]
    fn pause_time_does_not_consume_remaining() {
        // start at t0, pause at t0+100s, resume at t0+160s: the 60 paused
        // seconds fold into total_paused and remaining is 1400 at t0+160s
        let t0 = at("2026-08-01T09:00:00Z");
        let now = at("2026-08-01T09:02:40Z");
        assert_eq!(remaining_secs(1500, t0, None, 60, now), 1400);
    }

    #[test]
    fn current_pause_counts_like_folded_pause() {
        let t0 = at("2026-08-01T09:00:00Z");
        let paused_at = at("2026-08-01T09:01:40Z");
        let now = at("2026-08-01T09:02:40Z");
        // still paused: the open pause interval is excluded from consumption
        assert_eq!(remaining_secs(1500, t0, Some(paused_at), 0, now), 1400);
    }

    #[test]
    fn remaining_clamps_to_zero_past_target() {
        let t0 = at("2026-08-01T09:00:00Z");
        let now = at("2026-08-01T09:01:05Z");
        assert_eq!(remaining_secs(60, t0, None, 0, now), 0);
    }

    #[test]
    fn remaining_floors_subsecond_elapsed() {
        let t0 = at("2026-08-01T09:00:00Z");
        let now = at("2026-08-01T09:00:00.900Z");
        assert_eq!(remaining_secs(1500, t0, None, 0, now), 1500);
    }

    #[test]
    fn clock_skew_before_start_reads_as_untouched() {
        let t0 = at("2026-08-01T09:00:00Z");
        let now = at("2026-08-01T08:59:00Z");
        assert_eq!(remaining_secs(1500, t0, None, 0, now), 1500);
    }

    #[test]
    fn pause_elapsed_floors_and_clamps() {
        let paused_at = at("2026-08-01T09:00:00Z");
        assert_eq!(pause_elapsed_secs(paused_at, at("2026-08-01T09:00:59.999Z")), 59);
        assert_eq!(pause_elapsed_secs(paused_at, at("2026-08-01T08:59:59Z")), 0);
    }

    #[test]
    fn natural_end_accounts_for_folded_pauses() {
        let t0 = at("2026-08-01T09:00:00Z");
        assert_eq!(natural_end(t0, 1500, 60), at("2026-08-01T09:26:00Z"));
    }

    #[test]
    fn active_secs_excludes_paused_time() {
        let t0 = at("2026-08-01T09:00:00Z");
        let t1 = at("2026-08-01T09:26:00Z");
        assert_eq!(active_secs(t0, t1, 60), 1500);
    }

    proptest! {
        #[test]
        fn unpaused_remaining_matches_clamped_subtraction(
            target in 1u64..20_000,
            elapsed in 0i64..40_000,
            folded in 0u64..10_000
        ) {
            let t0 = at("2026-08-01T09:00:00Z");
            let now = t0 + Duration::seconds(elapsed);
            let expected = target
                .saturating_sub((elapsed as u64).saturating_sub(folded));
            prop_assert_eq!(remaining_secs(target, t0, None, folded, now), expected);
        }

        #[test]
        fn open_pause_freezes_remaining(
            target in 60u64..20_000,
            run in 1i64..5_000,
            pause in 0i64..50_000
        ) {
            // however long the open pause lasts, remaining stays what it was
            // at the moment the pause began
            let t0 = at("2026-08-01T09:00:00Z");
            let paused_at = t0 + Duration::seconds(run);
            let now = paused_at + Duration::seconds(pause);
            let at_pause = remaining_secs(target, t0, None, 0, paused_at);
            prop_assert_eq!(
                remaining_secs(target, t0, Some(paused_at), 0, now),
                at_pause
            );
        }
    }
}
