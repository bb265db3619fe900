//! Broadcast bus decoupling lifecycle transitions from their side effects.
//!
//! The engine emits here on every successful transition; the break scheduler
//! and any notification layer (sound, toast) subscribe instead of being
//! called by the engine directly.

use serde::Serialize;
use tokio::sync::broadcast::{self, Receiver, Sender};

use crate::breaks::BreakPlan;
use crate::models::SessionInfo;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    tag = "event",
    content = "payload"
)]
pub enum EngineEvent {
    /// A session transitioned state; carries the authoritative projection.
    StateChanged { session: SessionInfo },
    /// A session was finalized (manual stop or natural expiry).
    SessionCompleted { session: SessionInfo },
    BreakStarted { plan: BreakPlan },
    BreakFinished { plan: BreakPlan },
    /// The locally-ticking display hit zero; the caller should issue the
    /// authoritative `stop`.
    TimerElapsed { session_id: String },
}

/// Cloneable event hub over a tokio broadcast channel. Slow subscribers that
/// fall behind the channel capacity observe a lagged error and miss events;
/// they are expected to re-fetch authoritative state rather than replay.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: Sender<EngineEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Send to all current subscribers. Emitting with no subscribers is not
    /// an error; lifecycle transitions must not fail because nobody listens.
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
