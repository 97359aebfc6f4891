//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine. It does not own a clock:
//! the caller invokes `tick()` once per second while [`TimerEngine::is_ticking`]
//! holds (see [`TimerService`](super::TimerService) for the scheduler).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -start-> Study -0s-> AwaitingBreak -confirm-> Break -0s-> AwaitingStudy
//!                 ^                                                   |
//!                 +-------------------confirm-------------------------+
//!                                                                     |
//!                                    (total elapsed) confirm -> Completed
//! any non-idle -stop-> Idle
//! ```
//!
//! Every accepted intent and every tick is written through to the
//! snapshot store before the call returns. Rejected intents change nothing.

use chrono::Utc;

use super::state::{BreakType, Phase, TimerState};
use super::summary::SessionSummary;
use super::SessionConfig;
use crate::error::{Intent, TransitionError};
use crate::events::Event;
use crate::notify::{NotificationTrigger, Notifier};
use crate::storage::{SnapshotBackend, SnapshotStore};

/// Result of a successful `stop()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stopped {
    pub event: Event,
    /// Totals of the session as it was just before the reset.
    pub summary: SessionSummary,
}

/// Long break after every `cycles_before_long_break`-th completed cycle,
/// never after zero cycles.
pub fn break_type_after(cycles_completed: u32, config: &SessionConfig) -> BreakType {
    let every = config.cycles_before_long_break;
    if cycles_completed != 0 && cycles_completed.checked_rem(every) == Some(0) {
        BreakType::Long
    } else {
        BreakType::Short
    }
}

/// Core timer engine.
pub struct TimerEngine<B> {
    state: TimerState,
    store: SnapshotStore<B>,
    trigger: NotificationTrigger,
}

impl<B: SnapshotBackend> TimerEngine<B> {
    /// Build the engine, restoring the stored snapshot if there is a valid one.
    ///
    /// The snapshot is read exactly once, here.
    pub fn new(store: SnapshotStore<B>, notifier: Box<dyn Notifier>) -> Self {
        let state = store.load().unwrap_or_default();
        let mut trigger = NotificationTrigger::new(notifier);
        trigger.prime(state.phase);
        Self {
            state,
            store,
            trigger,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn store(&self) -> &SnapshotStore<B> {
        &self.store
    }

    pub fn is_ticking(&self) -> bool {
        self.state.is_ticking()
    }

    /// Totals of the active session, `None` when idle.
    pub fn summary(&self) -> Option<SessionSummary> {
        (!self.state.is_idle()).then(|| SessionSummary::from_state(&self.state))
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let s = &self.state;
        Event::StateSnapshot {
            phase: s.phase,
            is_paused: s.is_paused,
            time_left_sec: s.time_left_sec,
            time_elapsed_total_sec: s.time_elapsed_total_sec,
            remaining_session_sec: s.remaining_session_sec(),
            cycles_completed: s.pomodoro_cycles_completed,
            upcoming_break_type: s.upcoming_break_type,
            session_id: s.active_session_id.clone(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start_session(
        &mut self,
        config: SessionConfig,
        session_id: impl Into<String>,
    ) -> Result<Event, TransitionError> {
        if !self.state.is_idle() {
            return Err(TransitionError::AlreadyActive);
        }
        let session_id = session_id.into();
        let study = config.study_duration_sec;
        self.state = TimerState {
            phase: Phase::Study,
            is_paused: false,
            time_left_sec: study,
            time_elapsed_total_sec: 0,
            pomodoro_cycles_completed: 0,
            upcoming_break_type: BreakType::Short,
            config: Some(config),
            active_session_id: Some(session_id.clone()),
            interruptions: 0,
        };
        tracing::info!(%session_id, study_sec = study, "session started");
        self.skip_empty_countdown();
        self.commit();
        Ok(Event::SessionStarted {
            session_id,
            study_duration_sec: study,
            at: Utc::now(),
        })
    }

    /// Advance the countdown by one second. Does nothing unless ticking.
    ///
    /// Returns an event only when the countdown reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_ticking() {
            return None;
        }
        let s = &mut self.state;
        s.time_left_sec -= 1;
        s.time_elapsed_total_sec = s.time_elapsed_total_sec.saturating_add(1);

        let event = if s.time_left_sec > 0 {
            None
        } else {
            self.finish_countdown()
        };
        self.commit();
        event
    }

    pub fn pause(&mut self) -> Result<Event, TransitionError> {
        self.require_running(Intent::Pause)?;
        if self.state.is_paused {
            return Err(TransitionError::AlreadyPaused);
        }
        self.state.is_paused = true;
        self.state.interruptions = self.state.interruptions.saturating_add(1);
        tracing::debug!(time_left = self.state.time_left_sec, "paused");
        self.commit();
        Ok(Event::Paused {
            phase: self.state.phase,
            time_left_sec: self.state.time_left_sec,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Result<Event, TransitionError> {
        self.require_running(Intent::Resume)?;
        if !self.state.is_paused {
            return Err(TransitionError::NotPaused);
        }
        if self.state.time_left_sec == 0 || self.state.config.is_none() {
            return Err(self.invalid(Intent::Resume));
        }
        self.state.is_paused = false;
        tracing::debug!(time_left = self.state.time_left_sec, "resumed");
        self.commit();
        Ok(Event::Resumed {
            phase: self.state.phase,
            time_left_sec: self.state.time_left_sec,
            at: Utc::now(),
        })
    }

    /// Leave `awaiting_break` and start the break.
    pub fn confirm_break(&mut self) -> Result<Event, TransitionError> {
        if self.state.phase != Phase::AwaitingBreak {
            return Err(self.invalid(Intent::ConfirmBreak));
        }
        let Some(cfg) = &self.state.config else {
            return Err(self.invalid(Intent::ConfirmBreak));
        };
        let break_type = break_type_after(self.state.pomodoro_cycles_completed, cfg);
        let duration = match break_type {
            BreakType::Long => cfg.long_break_duration_sec,
            BreakType::Short => cfg.short_break_duration_sec,
        };
        self.state.upcoming_break_type = break_type;
        self.state.phase = Phase::Break;
        self.state.is_paused = false;
        self.state.time_left_sec = duration;
        tracing::debug!(?break_type, duration, "break started");
        self.skip_empty_countdown();
        self.commit();
        Ok(Event::BreakStarted {
            break_type,
            duration_sec: duration,
            at: Utc::now(),
        })
    }

    /// Leave `awaiting_study`: either complete the session or start the
    /// next study interval.
    pub fn confirm_resume_study(&mut self) -> Result<Event, TransitionError> {
        if self.state.phase != Phase::AwaitingStudy {
            return Err(self.invalid(Intent::ConfirmStudy));
        }
        let Some(cfg) = &self.state.config else {
            return Err(self.invalid(Intent::ConfirmStudy));
        };
        let total = cfg.total_session_duration_sec;
        let study = cfg.study_duration_sec;

        let event = if total > 0 && self.state.time_elapsed_total_sec >= total {
            self.state.phase = Phase::Completed;
            self.state.time_left_sec = 0;
            tracing::info!(
                elapsed = self.state.time_elapsed_total_sec,
                cycles = self.state.pomodoro_cycles_completed,
                "session completed"
            );
            Event::SessionCompleted {
                time_elapsed_total_sec: self.state.time_elapsed_total_sec,
                cycles_completed: self.state.pomodoro_cycles_completed,
                at: Utc::now(),
            }
        } else {
            self.state.phase = Phase::Study;
            self.state.time_left_sec = study;
            tracing::debug!(duration = study, "study resumed");
            Event::StudyResumed {
                duration_sec: study,
                at: Utc::now(),
            }
        };
        self.state.is_paused = false;
        self.skip_empty_countdown();
        self.commit();
        Ok(event)
    }

    /// Confirm whichever awaiting phase the timer is in.
    pub fn confirm(&mut self) -> Result<Event, TransitionError> {
        match self.state.phase {
            Phase::AwaitingStudy => self.confirm_resume_study(),
            _ => self.confirm_break(),
        }
    }

    /// Reset to idle and clear the stored snapshot.
    pub fn stop(&mut self) -> Result<Stopped, TransitionError> {
        if self.state.is_idle() {
            return Err(self.invalid(Intent::Stop));
        }
        let summary = SessionSummary::from_state(&self.state);
        let session_id = self.state.active_session_id.take();
        let elapsed = self.state.time_elapsed_total_sec;

        self.state = TimerState::default();
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear timer snapshot");
        }
        self.trigger.observe(Phase::Idle);
        tracing::info!(session_id = ?session_id, elapsed, "session stopped");

        Ok(Stopped {
            event: Event::SessionStopped {
                session_id,
                time_elapsed_total_sec: elapsed,
                at: Utc::now(),
            },
            summary,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Move a running phase whose countdown reached zero into its awaiting
    /// phase.
    fn finish_countdown(&mut self) -> Option<Event> {
        let s = &mut self.state;
        match s.phase {
            Phase::Study => {
                s.pomodoro_cycles_completed = s.pomodoro_cycles_completed.saturating_add(1);
                s.phase = Phase::AwaitingBreak;
                s.is_paused = false;
                if let Some(cfg) = &s.config {
                    s.upcoming_break_type = break_type_after(s.pomodoro_cycles_completed, cfg);
                }
                tracing::debug!(cycles = s.pomodoro_cycles_completed, "study finished");
                Some(Event::AwaitingBreak {
                    cycles_completed: s.pomodoro_cycles_completed,
                    upcoming_break_type: s.upcoming_break_type,
                    at: Utc::now(),
                })
            }
            Phase::Break => {
                s.phase = Phase::AwaitingStudy;
                s.is_paused = false;
                tracing::debug!("break finished");
                Some(Event::AwaitingStudy { at: Utc::now() })
            }
            _ => None,
        }
    }

    /// A zero-length interval has nothing to count down.
    fn skip_empty_countdown(&mut self) {
        if self.state.phase.is_running() && self.state.time_left_sec == 0 {
            self.finish_countdown();
        }
    }

    fn require_running(&self, intent: Intent) -> Result<(), TransitionError> {
        if self.state.phase.is_running() {
            Ok(())
        } else {
            Err(self.invalid(intent))
        }
    }

    fn invalid(&self, intent: Intent) -> TransitionError {
        TransitionError::InvalidPhase {
            intent,
            phase: self.state.phase,
        }
    }

    /// Write-through after a mutation, then let the trigger see the phase.
    fn commit(&mut self) {
        if let Err(e) = self.store.save(&self.state) {
            tracing::warn!(error = %e, "failed to save timer snapshot");
        }
        self.trigger.observe(self.state.phase);
    }
}

impl<B> std::fmt::Debug for TimerEngine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::CountingNotifier;
    use crate::notify::SilentNotifier;
    use crate::storage::MemoryBackend;

    fn classic() -> SessionConfig {
        SessionConfig::from_minutes(25, 5, 15, 4, 120)
    }

    fn tiny() -> SessionConfig {
        SessionConfig {
            study_duration_sec: 3,
            short_break_duration_sec: 2,
            long_break_duration_sec: 4,
            cycles_before_long_break: 2,
            total_session_duration_sec: 12,
            ..classic()
        }
    }

    fn engine() -> TimerEngine<MemoryBackend> {
        TimerEngine::new(SnapshotStore::new(MemoryBackend::new()), Box::new(SilentNotifier))
    }

    fn ticks(engine: &mut TimerEngine<MemoryBackend>, n: u64) {
        for _ in 0..n {
            engine.tick();
        }
    }

    #[test]
    fn start_enters_study() {
        let mut e = engine();
        let event = e.start_session(classic(), "sess-1").unwrap();
        assert!(matches!(event, Event::SessionStarted { study_duration_sec: 1500, .. }));
        let s = e.state();
        assert_eq!(s.phase, Phase::Study);
        assert_eq!(s.time_left_sec, 1500);
        assert_eq!(s.time_elapsed_total_sec, 0);
        assert_eq!(s.upcoming_break_type, BreakType::Short);
        assert_eq!(s.active_session_id.as_deref(), Some("sess-1"));
    }

    #[test]
    fn start_while_active_is_rejected_without_change() {
        let mut e = engine();
        e.start_session(classic(), "a").unwrap();
        e.tick();
        let before = e.state().clone();
        assert_eq!(
            e.start_session(tiny(), "b"),
            Err(TransitionError::AlreadyActive)
        );
        assert_eq!(e.state(), &before);
    }

    #[test]
    fn study_countdown_reaches_awaiting_break() {
        let mut e = engine();
        e.start_session(tiny(), "s").unwrap();
        assert_eq!(e.tick(), None);
        assert_eq!(e.tick(), None);
        let event = e.tick();
        assert!(matches!(
            event,
            Some(Event::AwaitingBreak { cycles_completed: 1, upcoming_break_type: BreakType::Short, .. })
        ));
        let s = e.state();
        assert_eq!(s.phase, Phase::AwaitingBreak);
        assert_eq!(s.time_left_sec, 0);
        assert_eq!(s.time_elapsed_total_sec, 3);
    }

    #[test]
    fn ticks_outside_running_phases_do_nothing() {
        let mut e = engine();
        assert_eq!(e.tick(), None);
        assert_eq!(e.state(), &TimerState::default());

        e.start_session(tiny(), "s").unwrap();
        ticks(&mut e, 3);
        let before = e.state().clone();
        ticks(&mut e, 5);
        assert_eq!(e.state(), &before);
    }

    #[test]
    fn break_and_study_alternate() {
        let mut e = engine();
        e.start_session(tiny(), "s").unwrap();
        ticks(&mut e, 3);
        let event = e.confirm_break().unwrap();
        assert!(matches!(event, Event::BreakStarted { break_type: BreakType::Short, duration_sec: 2, .. }));
        ticks(&mut e, 2);
        assert_eq!(e.phase(), Phase::AwaitingStudy);
        assert_eq!(e.state().time_elapsed_total_sec, 5);

        let event = e.confirm_resume_study().unwrap();
        assert!(matches!(event, Event::StudyResumed { duration_sec: 3, .. }));
        assert_eq!(e.state().time_left_sec, 3);
    }

    #[test]
    fn second_cycle_takes_long_break() {
        let mut e = engine();
        e.start_session(tiny(), "s").unwrap();
        ticks(&mut e, 3);
        e.confirm_break().unwrap();
        ticks(&mut e, 2);
        e.confirm_resume_study().unwrap();
        ticks(&mut e, 3);
        assert_eq!(e.state().pomodoro_cycles_completed, 2);
        assert_eq!(e.state().upcoming_break_type, BreakType::Long);
        let event = e.confirm_break().unwrap();
        assert!(matches!(event, Event::BreakStarted { break_type: BreakType::Long, duration_sec: 4, .. }));
    }

    #[test]
    fn total_elapsed_completes_session() {
        let mut e = engine();
        e.start_session(tiny(), "s").unwrap();
        // 3 + 2 + 3 + 4 = 12 seconds, which meets the total.
        ticks(&mut e, 3);
        e.confirm_break().unwrap();
        ticks(&mut e, 2);
        e.confirm_resume_study().unwrap();
        ticks(&mut e, 3);
        e.confirm_break().unwrap();
        ticks(&mut e, 4);
        let event = e.confirm_resume_study().unwrap();
        assert!(matches!(event, Event::SessionCompleted { time_elapsed_total_sec: 12, cycles_completed: 2, .. }));
        assert_eq!(e.phase(), Phase::Completed);
        assert!(!e.is_ticking());
        assert_eq!(e.tick(), None);
    }

    #[test]
    fn pause_freezes_countdown_and_counts_interruptions() {
        let mut e = engine();
        e.start_session(classic(), "s").unwrap();
        ticks(&mut e, 700);
        assert_eq!(e.state().time_left_sec, 800);
        e.pause().unwrap();
        ticks(&mut e, 10);
        assert_eq!(e.state().time_left_sec, 800);
        e.resume().unwrap();
        assert_eq!(e.state().time_left_sec, 800);
        assert_eq!(e.state().interruptions, 1);
    }

    #[test]
    fn double_pause_equals_single_pause() {
        let mut e = engine();
        e.start_session(classic(), "s").unwrap();
        e.pause().unwrap();
        let once = e.state().clone();
        assert_eq!(e.pause(), Err(TransitionError::AlreadyPaused));
        assert_eq!(e.state(), &once);
    }

    #[test]
    fn pause_while_idle_is_rejected() {
        let mut e = engine();
        assert_eq!(
            e.pause(),
            Err(TransitionError::InvalidPhase { intent: Intent::Pause, phase: Phase::Idle })
        );
        assert_eq!(e.resume(), Err(TransitionError::InvalidPhase { intent: Intent::Resume, phase: Phase::Idle }));
    }

    #[test]
    fn resume_requires_pause() {
        let mut e = engine();
        e.start_session(classic(), "s").unwrap();
        assert_eq!(e.resume(), Err(TransitionError::NotPaused));
    }

    #[test]
    fn confirm_in_wrong_phase_is_rejected() {
        let mut e = engine();
        e.start_session(classic(), "s").unwrap();
        assert!(e.confirm_break().is_err());
        assert!(e.confirm_resume_study().is_err());
        assert_eq!(e.phase(), Phase::Study);
    }

    #[test]
    fn confirm_dispatches_on_phase() {
        let mut e = engine();
        e.start_session(tiny(), "s").unwrap();
        ticks(&mut e, 3);
        assert!(matches!(e.confirm(), Ok(Event::BreakStarted { .. })));
        ticks(&mut e, 2);
        assert!(matches!(e.confirm(), Ok(Event::StudyResumed { .. })));
    }

    #[test]
    fn stop_resets_and_clears_storage() {
        let backend = MemoryBackend::new();
        let mut e = TimerEngine::new(SnapshotStore::new(backend.clone()), Box::new(SilentNotifier));
        e.start_session(tiny(), "sess-9").unwrap();
        ticks(&mut e, 3);
        e.pause().ok();
        assert!(backend.raw().is_some());

        let stopped = e.stop().unwrap();
        assert_eq!(stopped.summary.actual_duration_sec, 3);
        assert_eq!(stopped.summary.pomodoros_completed, 1);
        assert!(matches!(
            stopped.event,
            Event::SessionStopped { ref session_id, .. } if session_id.as_deref() == Some("sess-9")
        ));
        assert_eq!(e.state(), &TimerState::default());
        assert_eq!(backend.raw(), None);
        assert!(e.stop().is_err());
    }

    #[test]
    fn every_mutation_is_written_through() {
        let backend = MemoryBackend::new();
        let mut e = TimerEngine::new(SnapshotStore::new(backend.clone()), Box::new(SilentNotifier));
        e.start_session(classic(), "s").unwrap();
        e.tick();
        let stored = SnapshotStore::new(backend.clone()).load().unwrap();
        assert_eq!(&stored, e.state());
        assert_eq!(stored.time_left_sec, 1499);
    }

    #[test]
    fn rejected_intent_does_not_write() {
        let backend = MemoryBackend::new();
        let mut e = TimerEngine::new(SnapshotStore::new(backend.clone()), Box::new(SilentNotifier));
        assert!(e.pause().is_err());
        assert_eq!(backend.raw(), None);
    }

    #[test]
    fn restores_from_snapshot_on_construction() {
        let backend = MemoryBackend::new();
        {
            let mut e = TimerEngine::new(SnapshotStore::new(backend.clone()), Box::new(SilentNotifier));
            e.start_session(classic(), "s").unwrap();
            ticks(&mut e, 42);
        }
        let e = TimerEngine::new(SnapshotStore::new(backend), Box::new(SilentNotifier));
        assert_eq!(e.state().time_left_sec, 1458);
        assert_eq!(e.state().time_elapsed_total_sec, 42);
    }

    #[test]
    fn notifies_once_per_awaiting_entry() {
        let counter = CountingNotifier::default();
        let mut e = TimerEngine::new(SnapshotStore::new(MemoryBackend::new()), Box::new(counter.clone()));
        e.start_session(tiny(), "s").unwrap();
        ticks(&mut e, 3);
        assert_eq!(counter.fired(), 1);
        ticks(&mut e, 10);
        assert!(e.pause().is_err());
        assert_eq!(counter.fired(), 1);
        e.confirm_break().unwrap();
        ticks(&mut e, 2);
        assert_eq!(counter.fired(), 2);
    }

    #[test]
    fn rehydrated_awaiting_phase_does_not_renotify() {
        let backend = MemoryBackend::new();
        {
            let mut e = TimerEngine::new(SnapshotStore::new(backend.clone()), Box::new(SilentNotifier));
            e.start_session(tiny(), "s").unwrap();
            ticks(&mut e, 3);
        }
        let counter = CountingNotifier::default();
        let mut e = TimerEngine::new(SnapshotStore::new(backend), Box::new(counter.clone()));
        assert_eq!(e.phase(), Phase::AwaitingBreak);
        e.tick();
        assert_eq!(counter.fired(), 0);
    }

    #[test]
    fn zero_length_intervals_move_straight_to_awaiting() {
        let counter = CountingNotifier::default();
        let mut e = TimerEngine::new(SnapshotStore::new(MemoryBackend::new()), Box::new(counter.clone()));
        let cfg = SessionConfig {
            study_duration_sec: 0,
            short_break_duration_sec: 0,
            ..tiny()
        };
        e.start_session(cfg, "s").unwrap();
        assert_eq!(e.phase(), Phase::AwaitingBreak);
        assert_eq!(e.state().pomodoro_cycles_completed, 1);
        assert!(e.state().is_consistent());

        e.confirm_break().unwrap();
        assert_eq!(e.phase(), Phase::AwaitingStudy);
        e.confirm_resume_study().unwrap();
        assert_eq!(e.phase(), Phase::AwaitingBreak);
        assert_eq!(counter.fired(), 3);
        assert!(e.store().load().is_some());
    }

    #[test]
    fn zero_cycle_setting_never_panics() {
        let cfg = SessionConfig {
            cycles_before_long_break: 0,
            ..classic()
        };
        assert_eq!(break_type_after(4, &cfg), BreakType::Short);
    }

    #[test]
    fn long_break_rule() {
        let cfg = classic();
        assert_eq!(break_type_after(0, &cfg), BreakType::Short);
        for cycles in 1..4 {
            assert_eq!(break_type_after(cycles, &cfg), BreakType::Short);
        }
        assert_eq!(break_type_after(4, &cfg), BreakType::Long);
        assert_eq!(break_type_after(8, &cfg), BreakType::Long);
    }
}
