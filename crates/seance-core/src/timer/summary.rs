use serde::{Deserialize, Serialize};

use super::state::TimerState;

/// Status the séance service records for an ended session.
pub const ENDED_STATUS: &str = "terminee";

/// Totals reported to the séance service when a session ends.
///
/// Field names on the wire follow the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(rename = "duree_reelle")]
    pub actual_duration_sec: u64,
    #[serde(rename = "nbre_pomodoro_effectues")]
    pub pomodoros_completed: u32,
    pub interruptions: u32,
    #[serde(rename = "est_complete")]
    pub is_complete: bool,
    #[serde(rename = "statut")]
    pub status: String,
}

impl SessionSummary {
    pub fn from_state(state: &TimerState) -> Self {
        Self {
            actual_duration_sec: state.time_elapsed_total_sec,
            pomodoros_completed: state.pomodoro_cycles_completed,
            interruptions: state.interruptions,
            is_complete: true,
            status: ENDED_STATUS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_service_field_names() {
        let state = TimerState {
            time_elapsed_total_sec: 1800,
            pomodoro_cycles_completed: 1,
            interruptions: 3,
            ..TimerState::default()
        };
        let json = serde_json::to_value(SessionSummary::from_state(&state)).unwrap();
        assert_eq!(json["duree_reelle"], 1800);
        assert_eq!(json["nbre_pomodoro_effectues"], 1);
        assert_eq!(json["interruptions"], 3);
        assert_eq!(json["est_complete"], true);
        assert_eq!(json["statut"], "terminee");
    }
}
