use serde::{Deserialize, Serialize};

use super::config::SessionConfig;

/// Stage of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Study,
    Break,
    /// Study countdown hit zero; waiting for the user to start the break.
    AwaitingBreak,
    /// Break countdown hit zero; waiting for the user to resume studying.
    AwaitingStudy,
    Completed,
}

impl Phase {
    /// Phases with a live countdown.
    pub fn is_running(self) -> bool {
        matches!(self, Phase::Study | Phase::Break)
    }

    pub fn is_awaiting(self) -> bool {
        matches!(self, Phase::AwaitingBreak | Phase::AwaitingStudy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Study => "study",
            Phase::Break => "break",
            Phase::AwaitingBreak => "awaiting_break",
            Phase::AwaitingStudy => "awaiting_study",
            Phase::Completed => "completed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakType {
    #[default]
    Short,
    Long,
}

/// Mutable state of the active session.
///
/// `Default` is the idle state that `stop()` resets to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub is_paused: bool,
    pub time_left_sec: u64,
    pub time_elapsed_total_sec: u64,
    pub pomodoro_cycles_completed: u32,
    pub upcoming_break_type: BreakType,
    pub config: Option<SessionConfig>,
    pub active_session_id: Option<String>,
    /// Accepted pauses since the session started.
    #[serde(default)]
    pub interruptions: u32,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            is_paused: false,
            time_left_sec: 0,
            time_elapsed_total_sec: 0,
            pomodoro_cycles_completed: 0,
            upcoming_break_type: BreakType::Short,
            config: None,
            active_session_id: None,
            interruptions: 0,
        }
    }
}

impl TimerState {
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// True while the one-second tick should be live.
    pub fn is_ticking(&self) -> bool {
        self.phase.is_running() && !self.is_paused && self.time_left_sec > 0
    }

    /// Session time left, `total - elapsed`. Negative once the total is
    /// exceeded; display code clamps it.
    pub fn remaining_session_sec(&self) -> i64 {
        let total = self
            .config
            .as_ref()
            .map(|c| c.total_session_duration_sec)
            .unwrap_or(0);
        let total = i64::try_from(total).unwrap_or(i64::MAX);
        let elapsed = i64::try_from(self.time_elapsed_total_sec).unwrap_or(i64::MAX);
        total.saturating_sub(elapsed)
    }

    /// Checks the structural invariants every reachable state satisfies.
    pub fn is_consistent(&self) -> bool {
        let idle = self.phase == Phase::Idle;
        if idle != self.config.is_none() || idle != self.active_session_id.is_none() {
            return false;
        }
        if !self.phase.is_running() && (self.time_left_sec != 0 || self.is_paused) {
            return false;
        }
        // A running phase always has time left; zero moves it on.
        !(self.phase.is_running() && self.time_left_sec == 0)
    }
}

/// `HH:MM:SS`, or `MM:SS` under an hour. Negative values print as zero.
pub fn format_hms(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_consistent_idle() {
        let state = TimerState::default();
        assert!(state.is_idle());
        assert!(state.is_consistent());
        assert!(!state.is_ticking());
    }

    #[test]
    fn idle_with_config_is_inconsistent() {
        let state = TimerState {
            config: Some(SessionConfig::from_minutes(25, 5, 15, 4, 120)),
            ..TimerState::default()
        };
        assert!(!state.is_consistent());
    }

    #[test]
    fn awaiting_with_time_left_is_inconsistent() {
        let state = TimerState {
            phase: Phase::AwaitingBreak,
            time_left_sec: 3,
            config: Some(SessionConfig::from_minutes(25, 5, 15, 4, 120)),
            active_session_id: Some("s".into()),
            ..TimerState::default()
        };
        assert!(!state.is_consistent());
    }

    #[test]
    fn running_with_zero_countdown_is_inconsistent() {
        let state = TimerState {
            phase: Phase::Study,
            config: Some(SessionConfig::from_minutes(25, 5, 15, 4, 120)),
            active_session_id: Some("s".into()),
            ..TimerState::default()
        };
        assert!(!state.is_consistent());
        assert!(!TimerState { is_paused: true, ..state }.is_consistent());
    }

    #[test]
    fn remaining_session_goes_negative() {
        let state = TimerState {
            phase: Phase::AwaitingStudy,
            time_elapsed_total_sec: 7300,
            config: Some(SessionConfig::from_minutes(25, 5, 15, 4, 120)),
            active_session_id: Some("s".into()),
            ..TimerState::default()
        };
        assert_eq!(state.remaining_session_sec(), -100);
        assert_eq!(format_hms(state.remaining_session_sec()), "00:00");
    }

    #[test]
    fn format_hms_switches_to_hours() {
        assert_eq!(format_hms(65), "01:05");
        assert_eq!(format_hms(7200), "02:00:00");
    }

    #[test]
    fn phase_serializes_snake_case() {
        let json = serde_json::to_string(&Phase::AwaitingBreak).unwrap();
        assert_eq!(json, "\"awaiting_break\"");
    }
}
