//! Owned handle around the engine that drives the one-second tick.
//!
//! There is at most one live tick task. Every accepted intent cancels the
//! current task and, if the engine is still in a ticking state, spawns a
//! fresh one. Each task carries the generation it was spawned for and
//! re-checks it under the engine lock before ticking, so a task that lost a
//! race with a cancellation exits without touching the state.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::config::SessionConfig;
use super::engine::{Stopped, TimerEngine};
use super::state::TimerState;
use super::summary::SessionSummary;
use crate::error::TransitionError;
use crate::events::Event;
use crate::storage::SnapshotBackend;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const EVENT_CAPACITY: usize = 64;

struct Slot<B> {
    engine: TimerEngine<B>,
    generation: u64,
    ticker: Option<JoinHandle<()>>,
}

struct Inner<B> {
    slot: Mutex<Slot<B>>,
    events: broadcast::Sender<Event>,
    period: Duration,
}

impl<B> Inner<B> {
    fn lock(&self) -> MutexGuard<'_, Slot<B>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Cloneable handle to the single timer engine of the application.
///
/// Must be created and used inside a Tokio runtime.
pub struct TimerService<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for TimerService<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: SnapshotBackend + 'static> TimerService<B> {
    /// Wrap `engine`. If the restored state is mid-countdown the tick starts
    /// right away.
    pub fn new(engine: TimerEngine<B>) -> Self {
        Self::with_period(engine, TICK_PERIOD)
    }

    pub fn with_period(engine: TimerEngine<B>, period: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let service = Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot {
                    engine,
                    generation: 0,
                    ticker: None,
                }),
                events,
                period,
            }),
        };
        {
            let mut slot = service.inner.lock();
            service.reschedule(&mut slot);
        }
        service
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe()
    }

    pub fn state(&self) -> TimerState {
        self.inner.lock().engine.state().clone()
    }

    pub fn snapshot(&self) -> Event {
        self.inner.lock().engine.snapshot()
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        self.inner.lock().engine.summary()
    }

    /// Whether a tick task is scheduled.
    pub fn is_ticking(&self) -> bool {
        let slot = self.inner.lock();
        slot.ticker.as_ref().is_some_and(|t| !t.is_finished()) && slot.engine.is_ticking()
    }

    pub fn start_session(
        &self,
        config: SessionConfig,
        session_id: impl Into<String>,
    ) -> Result<Event, TransitionError> {
        let session_id = session_id.into();
        self.apply(move |e| e.start_session(config, session_id))
    }

    pub fn pause(&self) -> Result<Event, TransitionError> {
        self.apply(TimerEngine::pause)
    }

    pub fn resume(&self) -> Result<Event, TransitionError> {
        self.apply(TimerEngine::resume)
    }

    pub fn confirm_break(&self) -> Result<Event, TransitionError> {
        self.apply(TimerEngine::confirm_break)
    }

    pub fn confirm_resume_study(&self) -> Result<Event, TransitionError> {
        self.apply(TimerEngine::confirm_resume_study)
    }

    pub fn confirm(&self) -> Result<Event, TransitionError> {
        self.apply(TimerEngine::confirm)
    }

    /// Cancel the tick, then reset the engine to idle.
    pub fn stop(&self) -> Result<Stopped, TransitionError> {
        let result = {
            let mut slot = self.inner.lock();
            Self::cancel(&mut slot);
            slot.engine.stop()
        };
        if let Ok(stopped) = &result {
            self.inner.publish(stopped.event.clone());
        }
        result
    }

    /// Cancel the tick without touching the state. The snapshot keeps the
    /// countdown where it was.
    pub fn detach(&self) {
        let mut slot = self.inner.lock();
        Self::cancel(&mut slot);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply<F>(&self, op: F) -> Result<Event, TransitionError>
    where
        F: FnOnce(&mut TimerEngine<B>) -> Result<Event, TransitionError>,
    {
        let result = {
            let mut slot = self.inner.lock();
            let result = op(&mut slot.engine);
            if result.is_ok() {
                self.reschedule(&mut slot);
            }
            result
        };
        if let Ok(event) = &result {
            self.inner.publish(event.clone());
        }
        result
    }

    fn cancel(slot: &mut Slot<B>) {
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(ticker) = slot.ticker.take() {
            ticker.abort();
        }
    }

    fn reschedule(&self, slot: &mut Slot<B>) {
        Self::cancel(slot);
        if slot.engine.is_ticking() {
            let generation = slot.generation;
            let inner = Arc::downgrade(&self.inner);
            let period = self.inner.period;
            slot.ticker = Some(tokio::spawn(run_ticker(inner, generation, period)));
            tracing::trace!(generation, "tick scheduled");
        }
    }
}

async fn run_ticker<B: SnapshotBackend + 'static>(
    inner: Weak<Inner<B>>,
    generation: u64,
    period: Duration,
) {
    let mut interval = time::interval_at(time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        // Every handle dropped: nothing left to drive.
        let Some(shared) = inner.upgrade() else {
            return;
        };
        let (event, keep_going) = {
            let mut slot = shared.lock();
            if slot.generation != generation {
                return;
            }
            let event = slot.engine.tick();
            (event, slot.engine.is_ticking())
        };
        if let Some(event) = event {
            shared.publish(event);
        }
        if !keep_going {
            return;
        }
    }
}
