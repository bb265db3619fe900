use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use log::{info, warn};
use uuid::Uuid;

use crate::clock;
use crate::db::Database;
use crate::engine::lifecycle::{self, Applied};
use crate::error::EngineError;
use crate::events::{EngineEvent, EventBroadcaster};
use crate::models::{FocusStats, Pause, Session, SessionInfo, SessionStatus, DEFAULT_LABEL};
use crate::settings::SettingsStore;

#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    pub label: Option<String>,
    pub duration_minutes: Option<u64>,
}

/// Outcome of loading a session through the expiry check.
enum Loaded {
    Active(Session),
    Expired(Session),
}

/// The lifecycle engine: validates commands against persisted state, writes
/// the transition through the store's guarded updates, and answers every
/// success with a projection carrying authoritative remaining time.
#[derive(Clone)]
pub struct SessionEngine {
    db: Database,
    events: EventBroadcaster,
    settings: Arc<SettingsStore>,
}

impl SessionEngine {
    pub fn new(db: Database, events: EventBroadcaster, settings: Arc<SettingsStore>) -> Self {
        Self {
            db,
            events,
            settings,
        }
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    pub async fn start(
        &self,
        owner_id: &str,
        request: StartRequest,
    ) -> Result<SessionInfo, EngineError> {
        let timer = self.settings.timer();
        let minutes = request.duration_minutes.unwrap_or(timer.focus_minutes);
        if minutes == 0 {
            return Err(EngineError::Validation(
                "planned duration must be a positive number of minutes".into(),
            ));
        }
        let label = normalize_label(request.label);
        let now = Utc::now();

        // A leftover session that already ran out is finalized here instead
        // of blocking the new start; a genuinely active one is a hard error.
        if let Some(active) = self.db.find_active(owner_id).await? {
            if let Loaded::Active(_) = self.reconcile_expiry(active, now).await? {
                return Err(EngineError::InvalidState(
                    "an active session already exists for this owner",
                ));
            }
        }

        let session = Session {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            label,
            target_secs: minutes.saturating_mul(60),
            started_at: now,
            paused_at: None,
            total_paused_secs: 0,
            stopped_at: None,
            status: SessionStatus::Running,
            created_at: now,
            updated_at: now,
        };

        // The partial unique index backstops concurrent starts.
        self.db.create_active(&session).await?;

        info!(
            "Started session {} for owner {} ({}s target)",
            session.id, owner_id, session.target_secs
        );

        let session_info = SessionInfo::project(&session, now);
        self.events.emit(EngineEvent::StateChanged {
            session: session_info.clone(),
        });
        Ok(session_info)
    }

    pub async fn pause(
        &self,
        owner_id: &str,
        session_id: &str,
    ) -> Result<SessionInfo, EngineError> {
        let now = Utc::now();
        let session = self.load(owner_id, session_id).await?;
        let mut session = match self.reconcile_expiry(session, now).await? {
            Loaded::Expired(_) => {
                return Err(EngineError::InvalidState("session is already completed"))
            }
            Loaded::Active(session) => session,
        };

        match lifecycle::pause(&mut session, now)? {
            Applied::Noop => Ok(SessionInfo::project(&session, now)),
            Applied::Changed => {
                let changed = self.db.mark_paused(owner_id, session_id, now, now).await?;
                if changed == 0 {
                    return self.resolve_conflict(owner_id, session_id, now).await;
                }

                let ledger = Pause {
                    id: Uuid::new_v4().to_string(),
                    session_id: session.id.clone(),
                    started_at: now,
                    ended_at: None,
                    duration_secs: None,
                };
                if let Err(err) = self.db.insert_pause(&ledger).await {
                    warn!("Failed to record pause interval for session {}: {err}", session.id);
                }

                let session_info = SessionInfo::project(&session, now);
                self.events.emit(EngineEvent::StateChanged {
                    session: session_info.clone(),
                });
                Ok(session_info)
            }
        }
    }

    pub async fn resume(
        &self,
        owner_id: &str,
        session_id: &str,
    ) -> Result<SessionInfo, EngineError> {
        let now = Utc::now();
        let session = self.load(owner_id, session_id).await?;
        let mut session = match self.reconcile_expiry(session, now).await? {
            Loaded::Expired(_) => {
                return Err(EngineError::InvalidState("session is already completed"))
            }
            Loaded::Active(session) => session,
        };

        match lifecycle::resume(&mut session, now)? {
            Applied::Noop => Ok(SessionInfo::project(&session, now)),
            Applied::Changed => {
                let changed = self
                    .db
                    .mark_running(owner_id, session_id, session.total_paused_secs, now)
                    .await?;
                if changed == 0 {
                    return self.resolve_conflict(owner_id, session_id, now).await;
                }

                if let Err(err) = self.db.finalize_open_pauses(session_id, now).await {
                    warn!("Failed to close pause interval for session {}: {err}", session.id);
                }

                let session_info = SessionInfo::project(&session, now);
                self.events.emit(EngineEvent::StateChanged {
                    session: session_info.clone(),
                });
                Ok(session_info)
            }
        }
    }

    pub async fn stop(
        &self,
        owner_id: &str,
        session_id: &str,
    ) -> Result<SessionInfo, EngineError> {
        let now = Utc::now();
        let session = self.load(owner_id, session_id).await?;
        let mut session = match self.reconcile_expiry(session, now).await? {
            // Natural expiry was finalized on load; the explicit stop that
            // raced it still reports success.
            Loaded::Expired(finished) => return Ok(SessionInfo::project(&finished, now)),
            Loaded::Active(session) => session,
        };

        lifecycle::finalize(&mut session, now)?;

        let changed = self
            .db
            .finalize(owner_id, session_id, session.total_paused_secs, now, now)
            .await?;
        if changed == 0 {
            return Err(EngineError::InvalidState("session is already completed"));
        }

        if let Err(err) = self.db.finalize_open_pauses(session_id, now).await {
            warn!("Failed to close pause interval for session {}: {err}", session.id);
        }

        info!(
            "Stopped session {} for owner {} ({}s paused in total)",
            session.id, owner_id, session.total_paused_secs
        );

        let session_info = SessionInfo::project(&session, now);
        self.events.emit(EngineEvent::StateChanged {
            session: session_info.clone(),
        });
        self.events.emit(EngineEvent::SessionCompleted {
            session: session_info.clone(),
        });
        Ok(session_info)
    }

    /// The owner's single active session, if any, for restore-on-load. An
    /// expired leftover is finalized on the way out.
    pub async fn active(&self, owner_id: &str) -> Result<Option<SessionInfo>, EngineError> {
        let now = Utc::now();
        match self.db.find_active(owner_id).await? {
            None => Ok(None),
            Some(session) => match self.reconcile_expiry(session, now).await? {
                Loaded::Expired(_) => Ok(None),
                Loaded::Active(session) => Ok(Some(SessionInfo::project(&session, now))),
            },
        }
    }

    pub async fn history(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionInfo>, EngineError> {
        let now = Utc::now();
        let sessions = self.db.list_recent(owner_id, limit).await?;
        Ok(sessions
            .iter()
            .map(|session| SessionInfo::project(session, now))
            .collect())
    }

    pub async fn stats_today(&self, owner_id: &str) -> Result<FocusStats, EngineError> {
        let since = clock::local_midnight_utc(Local::now());
        let sessions = self.db.completed_since(owner_id, since).await?;

        let mut stats = FocusStats::default();
        for session in &sessions {
            stats.completed_count += 1;
            if let Some(stopped_at) = session.stopped_at {
                stats.focus_secs +=
                    clock::active_secs(session.started_at, stopped_at, session.total_paused_secs);
            }
            stats.paused_secs += session.total_paused_secs;
        }
        Ok(stats)
    }

    async fn load(&self, owner_id: &str, session_id: &str) -> Result<Session, EngineError> {
        self.db
            .find_by_id(owner_id, session_id)
            .await?
            .ok_or(EngineError::NotFound)
    }

    /// A running session whose remaining time hit zero is finalized at its
    /// natural end before the current command is considered.
    async fn reconcile_expiry(
        &self,
        session: Session,
        now: DateTime<Utc>,
    ) -> Result<Loaded, EngineError> {
        if session.status != SessionStatus::Running || session.remaining_secs(now) > 0 {
            return Ok(Loaded::Active(session));
        }

        let owner_id = session.owner_id.clone();
        let session_id = session.id.clone();
        let end = clock::natural_end(
            session.started_at,
            session.target_secs,
            session.total_paused_secs,
        );

        let mut finished = session;
        lifecycle::finalize(&mut finished, end)?;

        let changed = self
            .db
            .finalize(&owner_id, &session_id, finished.total_paused_secs, end, end)
            .await?;
        if changed == 0 {
            let current = self.load(&owner_id, &session_id).await?;
            return Ok(match current.status {
                SessionStatus::Completed => Loaded::Expired(current),
                _ => Loaded::Active(current),
            });
        }

        info!("Session {} expired naturally; finalized at {}", session_id, end);

        let session_info = SessionInfo::project(&finished, end);
        self.events.emit(EngineEvent::StateChanged {
            session: session_info.clone(),
        });
        self.events.emit(EngineEvent::SessionCompleted {
            session: session_info,
        });
        Ok(Loaded::Expired(finished))
    }

    /// The guarded UPDATE matched nothing: a competing transition was
    /// persisted first. Report the state that actually won.
    async fn resolve_conflict(
        &self,
        owner_id: &str,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionInfo, EngineError> {
        let current = self.load(owner_id, session_id).await?;
        match current.status {
            SessionStatus::Completed => {
                Err(EngineError::InvalidState("session is already completed"))
            }
            _ => Ok(SessionInfo::project(&current, now)),
        }
    }
}

fn normalize_label(label: Option<String>) -> String {
    match label {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                DEFAULT_LABEL.to_string()
            } else {
                trimmed.to_string()
            }
        }
        None => DEFAULT_LABEL.to_string(),
    }
}
