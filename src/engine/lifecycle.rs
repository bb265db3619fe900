//! Pure transition rules for the session state machine.
//!
//! Legal transitions: Running -> Paused -> Running (any number of times),
//! Running/Paused -> Completed. Completed is terminal. Repeating the command
//! that produced the current state is a no-op, not an error.

use chrono::{DateTime, Utc};

use crate::clock;
use crate::error::EngineError;
use crate::models::{Session, SessionStatus};

/// Whether a transition changed the record (and therefore must be persisted)
/// or was an idempotent repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    Noop,
}

pub fn pause(session: &mut Session, now: DateTime<Utc>) -> Result<Applied, EngineError> {
    match session.status {
        SessionStatus::Completed => Err(EngineError::InvalidState("session is already completed")),
        SessionStatus::Paused => Ok(Applied::Noop),
        SessionStatus::Running => {
            session.status = SessionStatus::Paused;
            session.paused_at = Some(now);
            session.updated_at = now;
            Ok(Applied::Changed)
        }
    }
}

pub fn resume(session: &mut Session, now: DateTime<Utc>) -> Result<Applied, EngineError> {
    match session.status {
        SessionStatus::Completed => Err(EngineError::InvalidState("session is already completed")),
        SessionStatus::Running => Ok(Applied::Noop),
        SessionStatus::Paused => {
            fold_open_pause(session, now);
            session.status = SessionStatus::Running;
            session.updated_at = now;
            Ok(Applied::Changed)
        }
    }
}

/// Terminal transition. A paused session folds its open pause before the
/// stop timestamp is recorded, so paused time never counts as focus time.
pub fn finalize(session: &mut Session, at: DateTime<Utc>) -> Result<Applied, EngineError> {
    match session.status {
        SessionStatus::Completed => Err(EngineError::InvalidState("session is already completed")),
        SessionStatus::Running | SessionStatus::Paused => {
            fold_open_pause(session, at);
            session.status = SessionStatus::Completed;
            session.stopped_at = Some(at);
            session.updated_at = at;
            Ok(Applied::Changed)
        }
    }
}

fn fold_open_pause(session: &mut Session, now: DateTime<Utc>) {
    if let Some(paused_at) = session.paused_at.take() {
        session.total_paused_secs = session
            .total_paused_secs
            .saturating_add(clock::pause_elapsed_secs(paused_at, now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn running_session(started_at: DateTime<Utc>) -> Session {
        Session {
            id: "s-1".to_string(),
            owner_id: "owner-1".to_string(),
            label: "Math".to_string(),
            target_secs: 1500,
            started_at,
            paused_at: None,
            total_paused_secs: 0,
            stopped_at: None,
            status: SessionStatus::Running,
            created_at: started_at,
            updated_at: started_at,
        }
    }

    #[test]
    fn pause_is_idempotent() {
        let t0 = at("2026-08-01T09:00:00Z");
        let mut session = running_session(t0);

        let first = pause(&mut session, t0 + Duration::seconds(100)).unwrap();
        assert_eq!(first, Applied::Changed);
        let snapshot = session.clone();

        let second = pause(&mut session, t0 + Duration::seconds(130)).unwrap();
        assert_eq!(second, Applied::Noop);
        assert_eq!(session, snapshot);
    }

    #[test]
    fn resume_on_running_is_a_noop() {
        let t0 = at("2026-08-01T09:00:00Z");
        let mut session = running_session(t0);
        let snapshot = session.clone();

        assert_eq!(resume(&mut session, t0 + Duration::seconds(5)).unwrap(), Applied::Noop);
        assert_eq!(session, snapshot);
    }

    #[test]
    fn pause_resume_round_trip_folds_exactly_the_paused_seconds() {
        let t0 = at("2026-08-01T09:00:00Z");
        let mut session = running_session(t0);

        let pause_at = t0 + Duration::seconds(100);
        let before = session.remaining_secs(pause_at);

        pause(&mut session, pause_at).unwrap();
        let resume_at = pause_at + Duration::seconds(60);
        resume(&mut session, resume_at).unwrap();

        assert_eq!(session.total_paused_secs, 60);
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.paused_at, None);
        assert_eq!(session.remaining_secs(resume_at), before);
    }

    #[test]
    fn stop_while_paused_folds_the_open_pause() {
        let t0 = at("2026-08-01T09:00:00Z");
        let mut session = running_session(t0);

        pause(&mut session, t0 + Duration::seconds(100)).unwrap();
        finalize(&mut session, t0 + Duration::seconds(160)).unwrap();

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.total_paused_secs, 60);
        assert_eq!(session.paused_at, None);
        assert_eq!(session.stopped_at, Some(t0 + Duration::seconds(160)));
    }

    #[test]
    fn completed_sessions_reject_every_command_unchanged() {
        let t0 = at("2026-08-01T09:00:00Z");
        let mut session = running_session(t0);
        finalize(&mut session, t0 + Duration::seconds(900)).unwrap();
        let snapshot = session.clone();

        let later = t0 + Duration::seconds(1000);
        assert!(matches!(
            pause(&mut session, later),
            Err(EngineError::InvalidState(_))
        ));
        assert!(matches!(
            resume(&mut session, later),
            Err(EngineError::InvalidState(_))
        ));
        assert!(matches!(
            finalize(&mut session, later),
            Err(EngineError::InvalidState(_))
        ));
        assert_eq!(session, snapshot);
    }

    proptest! {
        #[test]
        fn resume_after_k_seconds_adds_exactly_k(
            run in 0i64..10_000,
            k in 0i64..10_000,
            prior in 0u64..10_000
        ) {
            let t0 = at("2026-08-01T09:00:00Z");
            let mut session = running_session(t0);
            session.total_paused_secs = prior;

            let pause_at = t0 + Duration::seconds(run);
            pause(&mut session, pause_at).unwrap();
            resume(&mut session, pause_at + Duration::seconds(k)).unwrap();

            prop_assert_eq!(session.total_paused_secs, prior + k as u64);
        }
    }
}
