mod config;
pub mod database;
pub mod snapshot;

pub use config::{Config, NotificationsConfig, ServicesConfig, SessionDefaults};
pub use database::Database;
pub use snapshot::{MemoryBackend, SnapshotBackend, SnapshotStore, SNAPSHOT_KEY, SNAPSHOT_VERSION};

use std::path::PathBuf;

/// Returns `~/.config/seance[-dev]/` based on SEANCE_ENV.
///
/// Set SEANCE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SEANCE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("seance-dev")
    } else {
        base_dir.join("seance")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
