//! Auth service client and bearer token claims.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ApiClient;
use crate::error::RemoteError;

/// Payload of the bearer token issued at login.
///
/// Decoded client-side only to read the subject and role; the signature is
/// the auth service's business.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// # Errors
    /// Returns `MalformedToken` if `token` is not `header.payload.signature`
    /// with a base64url JSON payload.
    pub fn decode(token: &str) -> Result<Self, RemoteError> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| RemoteError::MalformedToken("missing payload segment".into()))?;
        // Some issuers keep the padding.
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| RemoteError::MalformedToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::MalformedToken(e.to_string()))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| now.timestamp() >= exp)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub actif: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub mot_de_passe: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

/// Plain `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    /// Returns the service's message on rejected credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, RemoteError> {
        let req = self
            .api
            .request(Method::POST, "auth/login")?
            .json(&json!({ "email": email, "mot_de_passe": password }));
        let resp: LoginResponse = self.api.send(req).await?;
        Ok(resp.access_token)
    }

    pub async fn register(&self, registration: &Registration) -> Result<serde_json::Value, RemoteError> {
        let req = self
            .api
            .request(Method::POST, "auth/register")?
            .json(registration);
        self.api.send(req).await
    }

    pub async fn me(&self) -> Result<Profile, RemoteError> {
        let req = self.api.authed(Method::GET, "auth/me")?;
        self.api.send(req).await
    }

    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<Ack, RemoteError> {
        let req = self
            .api
            .request(Method::POST, "auth/reset-password")?
            .json(&json!({ "email": email, "new_password": new_password }));
        self.api.send(req).await
    }

    pub async fn change_password(&self, current: &str, new_password: &str) -> Result<Ack, RemoteError> {
        let req = self
            .api
            .authed(Method::PATCH, "auth/change-password")?
            .json(&json!({ "current_password": current, "new_password": new_password }));
        self.api.send(req).await
    }

    pub async fn update_profile(&self, profile: &Profile) -> Result<Ack, RemoteError> {
        let req = self
            .api
            .authed(Method::PATCH, "auth/update-profile")?
            .json(profile);
        self.api.send(req).await
    }

    pub async fn deactivate(&self) -> Result<Ack, RemoteError> {
        let req = self.api.authed(Method::POST, "auth/deactivate")?;
        self.api.send(req).await
    }

    pub async fn delete_account(&self) -> Result<Ack, RemoteError> {
        let req = self.api.authed(Method::DELETE, "auth/delete-account")?;
        self.api.send(req).await
    }
}
