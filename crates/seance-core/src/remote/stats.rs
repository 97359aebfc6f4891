//! Read-only study statistics.

use std::collections::BTreeMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::RemoteError;

/// Aggregates the statistics service computes for the authenticated client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(rename = "nbre_taches_completees", default)]
    pub tasks_completed: u64,
    #[serde(rename = "taux_completion_taches", default)]
    pub completion_rate: f64,
    #[serde(rename = "nbre_taches_par_jour", default)]
    pub tasks_per_day: f64,
    #[serde(rename = "nbre_taches_retard", default)]
    pub tasks_overdue: u64,
    #[serde(rename = "nbre_jours_consecutifs_actifs", default)]
    pub streak_days: u64,
    #[serde(rename = "derniere_date_active", default)]
    pub last_active: Option<String>,
    #[serde(default)]
    pub focus_score: f64,
    #[serde(rename = "meilleur_jour", default)]
    pub best_day: Option<String>,
    /// Average activity per weekday, keyed by English day name.
    #[serde(rename = "activite_par_jour_semaine", default)]
    pub activity_by_weekday: BTreeMap<String, f64>,
    #[serde(rename = "date_mise_a_jour", default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tasks_by_status: BTreeMap<String, u64>,
    #[serde(default)]
    pub total_tasks: u64,
}

#[derive(Debug, Clone)]
pub struct StatsClient {
    api: ApiClient,
}

impl StatsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn fetch(&self) -> Result<Statistics, RemoteError> {
        let req = self.api.authed(Method::GET, "statistique")?;
        self.api.send(req).await
    }

    /// Ask the service to persist a snapshot of the current aggregates.
    pub async fn save_snapshot(&self) -> Result<(), RemoteError> {
        let req = self.api.authed(Method::POST, "statistique/save")?;
        let _: serde_json::Value = self.api.send(req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn fetch_decodes_service_payload() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/statistique")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "nbre_taches_completees": 4,
                    "taux_completion_taches": 66.67,
                    "nbre_taches_par_jour": 1.5,
                    "nbre_taches_retard": 1,
                    "nbre_jours_consecutifs_actifs": 3,
                    "derniere_date_active": "2024-03-02T09:00:00",
                    "focus_score": 40.0,
                    "meilleur_jour": "Monday",
                    "activite_par_jour_semaine": {"Monday": 2.0, "Tuesday": 0.5},
                    "date_mise_a_jour": "2024-03-02T10:00:00",
                    "tasks_by_status": {"à faire": 2, "terminé": 4},
                    "total_tasks": 6,
                    "client_id": "c-1"
                }"#,
            )
            .create_async()
            .await;

        let api = ApiClient::new(&server.url(), Duration::from_secs(5))
            .unwrap()
            .with_token("tok");
        let stats = StatsClient::new(api).fetch().await.unwrap();
        assert_eq!(stats.tasks_completed, 4);
        assert_eq!(stats.streak_days, 3);
        assert_eq!(stats.best_day.as_deref(), Some("Monday"));
        assert_eq!(stats.activity_by_weekday.get("Monday"), Some(&2.0));
        assert_eq!(stats.tasks_by_status.get("terminé"), Some(&4));
    }

    #[test]
    fn missing_fields_default() {
        let stats: Statistics = serde_json::from_str("{}").unwrap();
        assert_eq!(stats, Statistics::default());
    }
}
