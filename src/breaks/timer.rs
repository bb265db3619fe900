//! Process-local break countdown. Nothing here is persisted and nothing here
//! touches a `Session` record; the countdown exists only to signal expiry so
//! the caller can start the next queued session or idle.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::{
    sync::Mutex,
    time::{interval, Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::breaks::BreakPlan;
use crate::events::{EngineEvent, EventBroadcaster};

struct ActiveBreak {
    plan: BreakPlan,
    started: Instant,
    token: CancellationToken,
    generation: u64,
}

/// Drives one break countdown at a time. Starting a new break or cancelling
/// deterministically clears the previous ticker, so rapid state changes can
/// never leave two countdowns decrementing the same display.
pub struct BreakTimer {
    events: EventBroadcaster,
    inner: Arc<Mutex<Option<ActiveBreak>>>,
    generation: AtomicU64,
}

impl BreakTimer {
    pub fn new(events: EventBroadcaster) -> Self {
        Self {
            events,
            inner: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn start(&self, plan: BreakPlan) {
        let token = CancellationToken::new();
        let started = Instant::now();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        {
            let mut guard = self.inner.lock().await;
            if let Some(previous) = guard.take() {
                previous.token.cancel();
            }
            *guard = Some(ActiveBreak {
                plan,
                started,
                token: token.clone(),
                generation,
            });
        }

        self.events.emit(EngineEvent::BreakStarted { plan });

        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        tokio::spawn(async move {
            run_countdown(inner, events, plan, started, token, generation).await;
        });
    }

    /// Remaining break seconds, recomputed from the start anchor. `None`
    /// when no break is live.
    pub async fn remaining_secs(&self) -> Option<u64> {
        let guard = self.inner.lock().await;
        guard.as_ref().map(|active| {
            active
                .plan
                .duration_secs
                .saturating_sub(active.started.elapsed().as_secs())
        })
    }

    pub async fn cancel(&self) {
        let mut guard = self.inner.lock().await;
        if let Some(active) = guard.take() {
            active.token.cancel();
        }
    }
}

async fn run_countdown(
    inner: Arc<Mutex<Option<ActiveBreak>>>,
    events: EventBroadcaster,
    plan: BreakPlan,
    started: Instant,
    token: CancellationToken,
    generation: u64,
) {
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let remaining = plan.duration_secs.saturating_sub(started.elapsed().as_secs());
                if remaining == 0 {
                    let mut guard = inner.lock().await;
                    let owns_slot =
                        matches!(guard.as_ref(), Some(active) if active.generation == generation);
                    if !owns_slot {
                        // a newer break owns the slot; it also owns expiry
                        break;
                    }
                    *guard = None;
                    drop(guard);
                    events.emit(EngineEvent::BreakFinished { plan });
                    break;
                }
            }
            _ = token.cancelled() => break,
        }
    }
}
