//! Core error types for seance-core.
//!
//! This module defines the error hierarchy using thiserror. Timer intents,
//! snapshot storage, configuration and the remote service clients each get
//! their own enum; `CoreError` wraps them for callers that only need one type.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::Phase;

/// Core error type for seance-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Snapshot / local database errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote service errors
    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteError),

    /// Rejected timer intent
    #[error("Invalid transition: {0}")]
    Transition(#[from] TransitionError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// A timer intent that is not valid in the current phase.
///
/// The engine leaves its state untouched when it returns one of these.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {intent} while {phase}")]
    InvalidPhase { intent: Intent, phase: Phase },

    #[error("a session is already active")]
    AlreadyActive,

    #[error("timer is already paused")]
    AlreadyPaused,

    #[error("timer is not paused")]
    NotPaused,
}

/// User intents accepted by the timer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Pause,
    Resume,
    ConfirmBreak,
    ConfirmStudy,
    Stop,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Intent::Pause => "pause",
            Intent::Resume => "resume",
            Intent::ConfirmBreak => "start the break",
            Intent::ConfirmStudy => "resume studying",
            Intent::Stop => "stop",
        };
        f.write_str(s)
    }
}

/// Local storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Snapshot could not be encoded
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Errors returned by the remote service clients.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Network or transport failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("{status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Base URL could not be joined with an endpoint path
    #[error("invalid service url: {0}")]
    Url(#[from] url::ParseError),

    /// No bearer token is stored
    #[error("Authentication required")]
    MissingToken,

    /// Bearer token is not a decodable JWT
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Credential store failure
    #[error("credential store error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Session configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A duration or count that must be positive is zero
    #[error("'{field}' must be positive")]
    NotPositive { field: &'static str },

    /// Total duration too short to hold one long-break cycle
    #[error(
        "total session duration ({total}s) must be at least {minimum}s to fit a full cycle and a long break"
    )]
    TotalTooShort { total: u64, minimum: u64 },
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
