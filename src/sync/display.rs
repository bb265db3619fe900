//! The locally-ticking countdown display, reconciled against authoritative
//! state on every mutating call. The local value is presentation only: it is
//! re-anchored from server-computed remaining time at each sync and
//! recomputed (never decremented) on each tick, so a suspended process shows
//! the correct value as soon as it wakes.

use std::sync::Arc;

use serde::Serialize;
use tokio::{
    sync::Mutex,
    time::{interval, Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::events::{EngineEvent, EventBroadcaster};
use crate::models::{SessionInfo, SessionStatus};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_info;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DisplayStatus {
    /// No session on screen.
    Idle,
    /// Running session with a live local tick.
    Ticking,
    /// Session on screen but the tick is suspended: paused, restored after a
    /// reload, or counted down to zero awaiting the authoritative stop.
    Frozen,
    /// A pause/resume call failed; the display refuses to tick until a fresh
    /// reconcile supplies authoritative state.
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub status: DisplayStatus,
    pub session_id: Option<String>,
    pub remaining_secs: u64,
}

struct DisplayState {
    status: DisplayStatus,
    session_id: Option<String>,
    authoritative_remaining: u64,
    synced_at: Instant,
    ticker: Option<CancellationToken>,
}

impl DisplayState {
    fn current_remaining(&self) -> u64 {
        match self.status {
            DisplayStatus::Ticking => self
                .authoritative_remaining
                .saturating_sub(self.synced_at.elapsed().as_secs()),
            _ => self.authoritative_remaining,
        }
    }

    fn cancel_ticker(&mut self) {
        if let Some(token) = self.ticker.take() {
            token.cancel();
        }
    }
}

/// One per focus context. Feed it the `SessionInfo` from every successful
/// lifecycle call; it owns the 1 Hz local tick and emits `TimerElapsed` when
/// the displayed countdown reaches zero.
pub struct TimerSync {
    events: EventBroadcaster,
    inner: Arc<Mutex<DisplayState>>,
}

impl TimerSync {
    pub fn new(events: EventBroadcaster) -> Self {
        Self {
            events,
            inner: Arc::new(Mutex::new(DisplayState {
                status: DisplayStatus::Idle,
                session_id: None,
                authoritative_remaining: 0,
                synced_at: Instant::now(),
                ticker: None,
            })),
        }
    }

    /// Adopt the authoritative projection returned by a mutating call. The
    /// previous tick is always cancelled first; a new one starts only for a
    /// running session.
    pub async fn reconcile(&self, session: &SessionInfo) {
        let mut state = self.inner.lock().await;
        state.cancel_ticker();
        state.synced_at = Instant::now();

        match session.status {
            SessionStatus::Running => {
                state.session_id = Some(session.id.clone());
                state.authoritative_remaining = session.remaining_secs;
                state.status = DisplayStatus::Ticking;
                let token = CancellationToken::new();
                state.ticker = Some(token.clone());
                drop(state);
                log_info!("display ticking session {}", session.id);
                self.spawn_ticker(token);
            }
            SessionStatus::Paused => {
                state.session_id = Some(session.id.clone());
                state.authoritative_remaining = session.remaining_secs;
                state.status = DisplayStatus::Frozen;
            }
            SessionStatus::Completed => {
                state.session_id = None;
                state.authoritative_remaining = 0;
                state.status = DisplayStatus::Idle;
            }
        }
    }

    /// Adopt the active session found at load time WITHOUT starting the
    /// tick. A reload cannot be told apart from a long suspension, so the
    /// user must explicitly resume before the display counts down again.
    pub async fn restore(&self, session: &SessionInfo) {
        let mut state = self.inner.lock().await;
        state.cancel_ticker();
        state.session_id = Some(session.id.clone());
        state.authoritative_remaining = session.remaining_secs;
        state.synced_at = Instant::now();
        state.status = DisplayStatus::Frozen;
        log_info!("display restored session {} frozen", session.id);
    }

    /// A pause/resume call failed, so the true state is unknown. Freeze the
    /// last displayed value and refuse to tick until the next reconcile.
    pub async fn mark_unknown(&self) {
        let mut state = self.inner.lock().await;
        let displayed = state.current_remaining();
        state.cancel_ticker();
        state.authoritative_remaining = displayed;
        state.status = DisplayStatus::Unknown;
        log_info!("display state unknown; awaiting authoritative refresh");
    }

    pub async fn clear(&self) {
        let mut state = self.inner.lock().await;
        state.cancel_ticker();
        state.session_id = None;
        state.authoritative_remaining = 0;
        state.status = DisplayStatus::Idle;
    }

    pub async fn snapshot(&self) -> DisplaySnapshot {
        let state = self.inner.lock().await;
        DisplaySnapshot {
            status: state.status,
            session_id: state.session_id.clone(),
            remaining_secs: state.current_remaining(),
        }
    }

    fn spawn_ticker(&self, token: CancellationToken) {
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let mut state = inner.lock().await;
                        if token.is_cancelled() || state.status != DisplayStatus::Ticking {
                            break;
                        }
                        if state.current_remaining() == 0 {
                            state.authoritative_remaining = 0;
                            state.status = DisplayStatus::Frozen;
                            state.ticker = None;
                            let session_id = state.session_id.clone();
                            drop(state);
                            if let Some(session_id) = session_id {
                                events.emit(EngineEvent::TimerElapsed { session_id });
                            }
                            break;
                        }
                    }
                    _ = token.cancelled() => break,
                }
            }
        });
    }
}
