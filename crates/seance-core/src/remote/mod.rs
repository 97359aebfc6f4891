//! Clients for the remote auth, séance, task and statistics services.
//!
//! These are best-effort mirrors of local state: nothing here is consulted by
//! the timer engine, and a failed call never touches the running countdown.

pub mod auth;
pub mod seances;
pub mod stats;
pub mod tasks;
pub mod token_store;

pub use auth::{Ack, AuthClient, Claims, Profile, Registration};
pub use seances::{NewSeance, PomodoroSettings, Seance, SeanceClient, TimerUpdate, ACTIVE_STATUS};
pub use stats::{Statistics, StatsClient};
pub use tasks::{NewTask, Task, TaskClient, TaskUpdate};

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::RemoteError;
use crate::storage::ServicesConfig;

/// Shared HTTP plumbing: base URL, timeout, optional bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if `base_url` does not parse or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn require_token(&self) -> Result<&str, RemoteError> {
        self.token.as_deref().ok_or(RemoteError::MissingToken)
    }

    /// Unauthenticated request to `path`, relative to the base URL.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let url = self.base.join(path)?;
        Ok(self.http.request(method, url))
    }

    /// Request carrying the bearer token. Fails before any I/O without one.
    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let token = self.require_token()?;
        Ok(self.request(method, path)?.bearer_auth(token))
    }

    /// Send and decode a JSON body, mapping non-2xx statuses to
    /// [`RemoteError::Status`].
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, RemoteError> {
        let resp = req.send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<T>().await?)
    }
}

async fn check_status(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match resp.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        Err(_) => None,
    }
    .unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string()
    });
    Err(RemoteError::Status { status, message })
}

/// Percent-encode an id for use as one path segment.
fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// All four service clients, configured from [`ServicesConfig`].
#[derive(Debug, Clone)]
pub struct Services {
    pub auth: AuthClient,
    pub seances: SeanceClient,
    pub tasks: TaskClient,
    pub stats: StatsClient,
}

impl Services {
    /// # Errors
    /// Returns an error if any configured URL is invalid.
    pub fn from_config(cfg: &ServicesConfig, token: Option<&str>) -> Result<Self, RemoteError> {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let build = |url: &str| -> Result<ApiClient, RemoteError> {
            let client = ApiClient::new(url, timeout)?;
            Ok(match token {
                Some(t) => client.with_token(t),
                None => client,
            })
        };
        Ok(Self {
            auth: AuthClient::new(build(&cfg.auth_url)?),
            seances: SeanceClient::new(build(&cfg.seance_url)?),
            tasks: TaskClient::new(build(&cfg.task_url)?),
            stats: StatsClient::new(build(&cfg.stats_url)?),
        })
    }
}
