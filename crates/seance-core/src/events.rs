use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{BreakType, Phase};

/// Every state change of the timer produces an Event.
/// Front-ends render them; the service broadcasts them to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_id: String,
        study_duration_sec: u64,
        at: DateTime<Utc>,
    },
    Paused {
        phase: Phase,
        time_left_sec: u64,
        at: DateTime<Utc>,
    },
    Resumed {
        phase: Phase,
        time_left_sec: u64,
        at: DateTime<Utc>,
    },
    /// Study countdown reached zero.
    AwaitingBreak {
        cycles_completed: u32,
        upcoming_break_type: BreakType,
        at: DateTime<Utc>,
    },
    BreakStarted {
        break_type: BreakType,
        duration_sec: u64,
        at: DateTime<Utc>,
    },
    /// Break countdown reached zero.
    AwaitingStudy {
        at: DateTime<Utc>,
    },
    StudyResumed {
        duration_sec: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        time_elapsed_total_sec: u64,
        cycles_completed: u32,
        at: DateTime<Utc>,
    },
    SessionStopped {
        session_id: Option<String>,
        time_elapsed_total_sec: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        is_paused: bool,
        time_left_sec: u64,
        time_elapsed_total_sec: u64,
        remaining_session_sec: i64,
        cycles_completed: u32,
        upcoming_break_type: BreakType,
        session_id: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Phase the timer is in once this event has been applied, when the
    /// event implies one.
    pub fn resulting_phase(&self) -> Option<Phase> {
        match self {
            Event::SessionStarted { .. } | Event::StudyResumed { .. } => Some(Phase::Study),
            Event::AwaitingBreak { .. } => Some(Phase::AwaitingBreak),
            Event::BreakStarted { .. } => Some(Phase::Break),
            Event::AwaitingStudy { .. } => Some(Phase::AwaitingStudy),
            Event::SessionCompleted { .. } => Some(Phase::Completed),
            Event::SessionStopped { .. } => Some(Phase::Idle),
            Event::Paused { phase, .. } | Event::Resumed { phase, .. } => Some(*phase),
            Event::StateSnapshot { phase, .. } => Some(*phase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::AwaitingStudy { at: Utc::now() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "awaiting_study");
    }

    #[test]
    fn stop_leaves_idle() {
        let event = Event::SessionStopped {
            session_id: None,
            time_elapsed_total_sec: 0,
            at: Utc::now(),
        };
        assert_eq!(event.resulting_phase(), Some(Phase::Idle));
    }
}
