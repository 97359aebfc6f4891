//! Séance service: the remote record of each study session.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{segment, ApiClient};
use crate::error::RemoteError;
use crate::timer::{SessionConfig, SessionSummary};

/// Status a séance is created with.
pub const ACTIVE_STATUS: &str = "en_cours";

/// Pomodoro parameters as the séance service stores them. Seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroSettings {
    #[serde(rename = "duree_seance")]
    pub study_sec: u64,
    #[serde(rename = "duree_pause_courte")]
    pub short_break_sec: u64,
    #[serde(rename = "duree_pause_longue")]
    pub long_break_sec: u64,
    #[serde(rename = "nbre_pomodoro_avant_pause_longue")]
    pub cycles_before_long_break: u32,
    #[serde(rename = "duree_seance_totale")]
    pub total_sec: u64,
    #[serde(rename = "auto_demarrage", default)]
    pub auto_start: bool,
    #[serde(rename = "alerte_sonore", default)]
    pub sound_alert: bool,
    #[serde(default)]
    pub notification: bool,
    #[serde(default)]
    pub vibration: bool,
    #[serde(rename = "nom_seance", default)]
    pub session_name: String,
    #[serde(rename = "theme", default)]
    pub theme_name: String,
    #[serde(rename = "suivi_temps_total", default)]
    pub track_total_time: bool,
    #[serde(rename = "nom_preconfiguration", default)]
    pub preset_name: String,
}

impl From<&SessionConfig> for PomodoroSettings {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            study_sec: cfg.study_duration_sec,
            short_break_sec: cfg.short_break_duration_sec,
            long_break_sec: cfg.long_break_duration_sec,
            cycles_before_long_break: cfg.cycles_before_long_break,
            total_sec: cfg.total_session_duration_sec,
            auto_start: cfg.flags.auto_start,
            sound_alert: cfg.flags.sound_alert,
            notification: cfg.flags.notification,
            vibration: cfg.flags.vibration,
            session_name: cfg.session_name.clone(),
            theme_name: cfg.theme_name.clone(),
            track_total_time: cfg.flags.track_total_time,
            preset_name: cfg.preset_name.clone(),
        }
    }
}

/// Creation payload for a séance.
#[derive(Debug, Clone, Serialize)]
pub struct NewSeance {
    pub client_id: String,
    pub type_seance: String,
    pub nom: String,
    pub date_debut: DateTime<Utc>,
    pub date_fin: DateTime<Utc>,
    pub statut: String,
    pub est_complete: bool,
    pub interruptions: u32,
    pub nbre_pomodoro_effectues: u32,
    pub pomodoro: PomodoroSettings,
}

impl NewSeance {
    /// Payload for a séance starting at `now`, planned to end after the
    /// configured total.
    pub fn from_config(cfg: &SessionConfig, client_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let total = i64::try_from(cfg.total_session_duration_sec).unwrap_or(i64::MAX);
        let date_fin = now
            .checked_add_signed(ChronoDuration::seconds(total))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            client_id: client_id.into(),
            type_seance: cfg.session_type.clone(),
            nom: cfg.session_name.clone(),
            date_debut: now,
            date_fin,
            statut: ACTIVE_STATUS.to_string(),
            est_complete: false,
            interruptions: 0,
            nbre_pomodoro_effectues: 0,
            pomodoro: PomodoroSettings::from(cfg),
        }
    }
}

/// A séance as returned by the service. Only `id` is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seance {
    pub id: String,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub type_seance: Option<String>,
    #[serde(default)]
    pub statut: Option<String>,
    #[serde(default)]
    pub date_debut: Option<String>,
    #[serde(default)]
    pub date_fin: Option<String>,
    #[serde(default)]
    pub est_complete: Option<bool>,
    #[serde(default)]
    pub interruptions: Option<u32>,
    #[serde(default)]
    pub nbre_pomodoro_effectues: Option<u32>,
    #[serde(default)]
    pub pomodoro: Option<PomodoroSettings>,
}

/// Partial update of a séance's pomodoro parameters. Absent fields are
/// left alone by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimerUpdate {
    #[serde(rename = "duree_seance", skip_serializing_if = "Option::is_none")]
    pub study_sec: Option<u64>,
    #[serde(rename = "duree_pause_courte", skip_serializing_if = "Option::is_none")]
    pub short_break_sec: Option<u64>,
    #[serde(rename = "duree_pause_longue", skip_serializing_if = "Option::is_none")]
    pub long_break_sec: Option<u64>,
    #[serde(rename = "nbre_pomodoro_avant_pause_longue", skip_serializing_if = "Option::is_none")]
    pub cycles_before_long_break: Option<u32>,
    #[serde(rename = "duree_seance_totale", skip_serializing_if = "Option::is_none")]
    pub total_sec: Option<u64>,
}

impl TimerUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The create endpoint answers either `{"seance": {...}}` or the bare record.
#[derive(Deserialize)]
#[serde(untagged)]
enum Created {
    Wrapped { seance: Seance },
    Bare(Seance),
}

#[derive(Debug, Clone)]
pub struct SeanceClient {
    api: ApiClient,
}

impl SeanceClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create(&self, seance: &NewSeance) -> Result<Seance, RemoteError> {
        let req = self.api.authed(Method::POST, "seances")?.json(seance);
        let created: Created = self.api.send(req).await?;
        let seance = match created {
            Created::Wrapped { seance } | Created::Bare(seance) => seance,
        };
        tracing::debug!(id = %seance.id, "séance created");
        Ok(seance)
    }

    /// Mark the séance finished with the final counters.
    pub async fn end(&self, id: &str, summary: &SessionSummary) -> Result<serde_json::Value, RemoteError> {
        let path = format!("seances/{}/terminer", segment(id));
        let req = self.api.authed(Method::PATCH, &path)?.json(summary);
        self.api.send(req).await
    }

    pub async fn update_timer(&self, id: &str, update: &TimerUpdate) -> Result<serde_json::Value, RemoteError> {
        let path = format!("seances/{}/minuterie", segment(id));
        let req = self.api.authed(Method::PATCH, &path)?.json(update);
        self.api.send(req).await
    }

    pub async fn update_status(&self, id: &str, status: &str) -> Result<serde_json::Value, RemoteError> {
        let path = format!("seances/{}/statut", segment(id));
        let req = self
            .api
            .authed(Method::PATCH, &path)?
            .json(&json!({ "statut": status }));
        self.api.send(req).await
    }

    /// Séances of the authenticated client.
    pub async fn list(&self) -> Result<Vec<Seance>, RemoteError> {
        let req = self.api.authed(Method::GET, "seances")?;
        self.api.send(req).await
    }
}
