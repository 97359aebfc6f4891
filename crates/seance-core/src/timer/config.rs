use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Advisory automation switches carried with a session.
///
/// The engine does not branch on any of these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationFlags {
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default)]
    pub sound_alert: bool,
    #[serde(default)]
    pub notification: bool,
    #[serde(default)]
    pub vibration: bool,
    #[serde(default)]
    pub track_total_time: bool,
}

/// Immutable configuration of one study session. All durations are seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub study_duration_sec: u64,
    pub short_break_duration_sec: u64,
    pub long_break_duration_sec: u64,
    pub cycles_before_long_break: u32,
    pub total_session_duration_sec: u64,
    #[serde(default)]
    pub session_name: String,
    #[serde(default)]
    pub session_type: String,
    #[serde(default)]
    pub theme_name: String,
    #[serde(default)]
    pub preset_name: String,
    #[serde(default)]
    pub flags: AutomationFlags,
}

impl SessionConfig {
    /// Build a config from minute values, leaving the labels empty.
    pub fn from_minutes(
        study_min: u64,
        short_break_min: u64,
        long_break_min: u64,
        cycles_before_long_break: u32,
        total_min: u64,
    ) -> Self {
        Self {
            study_duration_sec: study_min.saturating_mul(60),
            short_break_duration_sec: short_break_min.saturating_mul(60),
            long_break_duration_sec: long_break_min.saturating_mul(60),
            cycles_before_long_break,
            total_session_duration_sec: total_min.saturating_mul(60),
            session_name: String::new(),
            session_type: String::new(),
            theme_name: String::new(),
            preset_name: String::new(),
            flags: AutomationFlags::default(),
        }
    }

    /// Shortest total duration that still fits `cycles - 1` study/short-break
    /// pairs followed by a long break.
    pub fn minimum_total_sec(&self) -> u64 {
        let cycles = u64::from(self.cycles_before_long_break.max(1));
        self.study_duration_sec
            .saturating_add(self.short_break_duration_sec)
            .saturating_mul(cycles - 1)
            .saturating_add(self.long_break_duration_sec)
    }

    /// Checks the constraints the session form enforces before a session is
    /// created. The engine never calls this.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positives = [
            ("study_duration_sec", self.study_duration_sec),
            ("short_break_duration_sec", self.short_break_duration_sec),
            ("long_break_duration_sec", self.long_break_duration_sec),
            ("cycles_before_long_break", u64::from(self.cycles_before_long_break)),
            ("total_session_duration_sec", self.total_session_duration_sec),
        ];
        for (field, value) in positives {
            if value == 0 {
                return Err(ValidationError::NotPositive { field });
            }
        }

        let minimum = self.minimum_total_sec();
        if self.total_session_duration_sec < minimum {
            return Err(ValidationError::TotalTooShort {
                total: self.total_session_duration_sec,
                minimum,
            });
        }
        Ok(())
    }
}
