//! Durable snapshot of the timer state.
//!
//! The record is a single JSON object: the [`TimerState`] fields plus a
//! `version` tag. It is read once when the engine is built, rewritten after
//! every mutation, and removed on stop.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::Database;
use crate::error::StorageError;
use crate::timer::TimerState;

/// Key of the snapshot row in the kv table.
pub const SNAPSHOT_KEY: &str = "timer_state";

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u64 = 1;

/// Raw storage for the single snapshot record.
pub trait SnapshotBackend: Send {
    fn read(&self) -> Result<Option<String>, StorageError>;
    fn write(&self, record: &str) -> Result<(), StorageError>;
    fn remove(&self) -> Result<(), StorageError>;
}

impl SnapshotBackend for Database {
    fn read(&self) -> Result<Option<String>, StorageError> {
        self.kv_get(SNAPSHOT_KEY)
    }

    fn write(&self, record: &str) -> Result<(), StorageError> {
        self.kv_set(SNAPSHOT_KEY, record)
    }

    fn remove(&self) -> Result<(), StorageError> {
        self.kv_delete(SNAPSHOT_KEY)
    }
}

/// In-process backend. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    record: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with a raw record.
    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Arc::new(Mutex::new(Some(record.into()))),
        }
    }

    /// Current raw record.
    pub fn raw(&self) -> Option<String> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.record.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot().clone())
    }

    fn write(&self, record: &str) -> Result<(), StorageError> {
        *self.slot() = Some(record.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.slot() = None;
        Ok(())
    }
}

#[derive(Serialize)]
struct VersionedRef<'a> {
    version: u64,
    #[serde(flatten)]
    state: &'a TimerState,
}

enum Decoded {
    Current(TimerState),
    Newer(u64),
}

fn encode(state: &TimerState) -> Result<String, serde_json::Error> {
    serde_json::to_string(&VersionedRef {
        version: SNAPSHOT_VERSION,
        state,
    })
}

fn decode(raw: &str) -> Result<Decoded, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let version = value
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| "missing version tag".to_string())?;
    if version > SNAPSHOT_VERSION {
        return Ok(Decoded::Newer(version));
    }
    if version != SNAPSHOT_VERSION {
        return Err(format!("unsupported version {version}"));
    }
    let state: TimerState = serde_json::from_value(value).map_err(|e| e.to_string())?;
    if !state.is_consistent() {
        return Err(format!("inconsistent state in phase {}", state.phase));
    }
    Ok(Decoded::Current(state))
}

/// Load-once / save-on-change adapter over a [`SnapshotBackend`].
///
/// Last writer wins; there is no cross-process coordination.
pub struct SnapshotStore<B> {
    backend: B,
}

impl<B: SnapshotBackend> SnapshotStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read the stored state.
    ///
    /// Returns `None` when nothing is stored. A record that cannot be
    /// decoded, or decodes to an inconsistent state, is purged. A record
    /// from a newer schema version is left in place.
    pub fn load(&self) -> Option<TimerState> {
        let raw = match self.backend.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read timer snapshot");
                return None;
            }
        };

        match decode(&raw) {
            Ok(Decoded::Current(state)) => {
                tracing::debug!(phase = %state.phase, "restored timer snapshot");
                Some(state)
            }
            Ok(Decoded::Newer(version)) => {
                tracing::warn!(
                    version,
                    supported = SNAPSHOT_VERSION,
                    "ignoring timer snapshot from a newer version"
                );
                None
            }
            Err(reason) => {
                tracing::warn!(%reason, "purging corrupt timer snapshot");
                if let Err(e) = self.backend.remove() {
                    tracing::warn!(error = %e, "failed to purge timer snapshot");
                }
                None
            }
        }
    }

    /// Overwrite the stored record with `state`.
    ///
    /// # Errors
    /// Returns an error if encoding or the backend write fails.
    pub fn save(&self, state: &TimerState) -> Result<(), StorageError> {
        let record = encode(state)?;
        self.backend.write(&record)
    }

    /// Remove the stored record.
    ///
    /// # Errors
    /// Returns an error if the backend delete fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.backend.remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{BreakType, Phase, SessionConfig};

    fn running_state() -> TimerState {
        TimerState {
            phase: Phase::Break,
            is_paused: true,
            time_left_sec: 120,
            time_elapsed_total_sec: 1680,
            pomodoro_cycles_completed: 1,
            upcoming_break_type: BreakType::Short,
            config: Some(SessionConfig::from_minutes(25, 5, 15, 4, 120)),
            active_session_id: Some("sess-1".into()),
            interruptions: 2,
        }
    }

    #[test]
    fn save_then_load_is_lossless() {
        let store = SnapshotStore::new(MemoryBackend::new());
        let state = running_state();
        store.save(&state).unwrap();
        assert_eq!(store.load(), Some(state));
    }

    #[test]
    fn record_carries_version_tag() {
        let backend = MemoryBackend::new();
        let store = SnapshotStore::new(backend.clone());
        store.save(&running_state()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&backend.raw().unwrap()).unwrap();
        assert_eq!(json["version"], SNAPSHOT_VERSION);
        assert_eq!(json["phase"], "break");
        assert_eq!(json["active_session_id"], "sess-1");
    }

    #[test]
    fn empty_backend_loads_nothing() {
        let store = SnapshotStore::new(MemoryBackend::new());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn garbage_is_purged() {
        let backend = MemoryBackend::with_record("{not json");
        let store = SnapshotStore::new(backend.clone());
        assert_eq!(store.load(), None);
        assert_eq!(backend.raw(), None);
    }

    #[test]
    fn unversioned_record_is_purged() {
        let backend = MemoryBackend::with_record(r#"{"phase":"idle"}"#);
        let store = SnapshotStore::new(backend.clone());
        assert_eq!(store.load(), None);
        assert_eq!(backend.raw(), None);
    }

    #[test]
    fn inconsistent_state_is_purged() {
        let mut state = running_state();
        state.phase = Phase::Idle;
        let record = serde_json::to_string(&VersionedRef {
            version: SNAPSHOT_VERSION,
            state: &state,
        })
        .unwrap();
        let backend = MemoryBackend::with_record(record);
        let store = SnapshotStore::new(backend.clone());
        assert_eq!(store.load(), None);
        assert_eq!(backend.raw(), None);
    }

    #[test]
    fn newer_version_is_kept() {
        let record = r#"{"version":99,"phase":"hyperfocus"}"#;
        let backend = MemoryBackend::with_record(record);
        let store = SnapshotStore::new(backend.clone());
        assert_eq!(store.load(), None);
        assert_eq!(backend.raw().as_deref(), Some(record));
    }

    #[test]
    fn clear_removes_record() {
        let backend = MemoryBackend::new();
        let store = SnapshotStore::new(backend.clone());
        store.save(&running_state()).unwrap();
        store.clear().unwrap();
        assert_eq!(backend.raw(), None);
    }

    #[test]
    fn database_backend_round_trips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seance.db");
        let state = running_state();
        {
            let store = SnapshotStore::new(Database::open_at(&path).unwrap());
            store.save(&state).unwrap();
        }
        let store = SnapshotStore::new(Database::open_at(&path).unwrap());
        assert_eq!(store.load(), Some(state));
    }
}
