//! # Séance Core Library
//!
//! Core logic for the séance Pomodoro timer. The CLI binary is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: tick-driven state machine for one study session:
//!   study, awaiting break, break, awaiting study, completed
//! - **Timer Service**: owned handle that drives the one-second tick and
//!   broadcasts [`Event`]s
//! - **Storage**: versioned snapshot of the timer state in SQLite, and
//!   TOML configuration
//! - **Notify**: audible cue on entry into an awaiting phase
//! - **Remote**: clients for the auth, séance, task and statistics services
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`TimerService`]: scheduler and event fan-out
//! - [`SnapshotStore`]: write-through persistence of [`TimerState`]
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod remote;
pub mod storage;
pub mod timer;

pub use error::{
    ConfigError, CoreError, Intent, RemoteError, StorageError, TransitionError, ValidationError,
};
pub use events::Event;
pub use notify::{Cue, NotificationTrigger, Notifier};
pub use storage::{Config, Database, MemoryBackend, SnapshotBackend, SnapshotStore};
pub use timer::{
    BreakType, Phase, SessionConfig, SessionSummary, Stopped, TimerEngine, TimerService,
    TimerState,
};
