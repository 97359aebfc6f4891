//! Task service client.

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use super::{segment, ApiClient};
use crate::error::RemoteError;

/// Status a new task starts with on the service side.
pub const DEFAULT_STATUS: &str = "à faire";

/// Ids come back as integers from one backend and strings from another.
fn flexible_id<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

fn flexible_opt_id<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }
    Ok(Option::<Raw>::deserialize(de)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(rename = "seance_etude_id", default, deserialize_with = "flexible_opt_id")]
    pub seance_id: Option<String>,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "statut", default)]
    pub status: Option<String>,
    #[serde(rename = "priorite", default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub importance: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub date_creation: Option<String>,
    #[serde(rename = "est_terminee", default)]
    pub is_done: Option<bool>,
    #[serde(rename = "duree_estimee", default)]
    pub estimated_sec: Option<u64>,
    #[serde(rename = "duree_reelle", default)]
    pub actual_sec: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTask {
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "statut", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "priorite", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(rename = "seance_etude_id", skip_serializing_if = "Option::is_none")]
    pub seance_id: Option<String>,
}

/// Fields to change on an existing task; `None` leaves the field as is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskUpdate {
    #[serde(rename = "titre", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "statut", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "priorite", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TaskClient {
    api: ApiClient,
}

impl TaskClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Task>, RemoteError> {
        let req = self.api.authed(Method::GET, "taches")?;
        self.api.send(req).await
    }

    pub async fn list_for_seance(&self, seance_id: &str) -> Result<Vec<Task>, RemoteError> {
        let path = format!("taches/seance/{}", segment(seance_id));
        let req = self.api.authed(Method::GET, &path)?;
        self.api.send(req).await
    }

    pub async fn get(&self, id: &str) -> Result<Task, RemoteError> {
        let path = format!("tache/{}", segment(id));
        let req = self.api.authed(Method::GET, &path)?;
        self.api.send(req).await
    }

    pub async fn create(&self, task: &NewTask) -> Result<Task, RemoteError> {
        let req = self.api.authed(Method::POST, "tache")?.json(task);
        self.api.send(req).await
    }

    pub async fn update(&self, id: &str, update: &TaskUpdate) -> Result<Task, RemoteError> {
        let path = format!("tache/{}", segment(id));
        let req = self.api.authed(Method::PUT, &path)?.json(update);
        self.api.send(req).await
    }

    pub async fn update_status(&self, id: &str, status: &str) -> Result<Task, RemoteError> {
        let path = format!("tache/{}", segment(id));
        let req = self
            .api
            .authed(Method::PUT, &path)?
            .json(&json!({ "statut": status }));
        self.api.send(req).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let path = format!("tache/{}", segment(id));
        let req = self.api.authed(Method::DELETE, &path)?;
        let _: serde_json::Value = self.api.send(req).await?;
        Ok(())
    }
}
