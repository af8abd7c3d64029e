//! Per-session accumulators, keyed by session id.
//!
//! The store is shared between concurrent invocations; every access goes
//! through one mutex and a poisoned lock is recovered rather than
//! propagated. Across processes, a snapshot file is read and rewritten only
//! while holding the exclusive lock from [`lock_state`].

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Context as _;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use toktrim_common::tracking::types::MetricRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionState {
    pub records: Vec<MetricRecord>,
    /// Invocations since the last notification.
    pub idle_turns: u32,
}

impl SessionState {
    /// Count one invocation and report whether a notification is due.
    /// `cadence == 0` never notifies. A due notification resets the counter.
    pub fn tick(&mut self, cadence: u32) -> bool {
        self.idle_turns = self.idle_turns.saturating_add(1);
        if cadence > 0 && self.idle_turns >= cadence && !self.records.is_empty() {
            self.idle_turns = 0;
            return true;
        }
        false
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionState>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one invocation for `session_id`.
    ///
    /// Returns a snapshot of the session's records when a notification is
    /// due at `cadence`.
    pub fn record_turn(
        &self,
        session_id: &str,
        record: Option<MetricRecord>,
        cadence: u32,
    ) -> Option<Vec<MetricRecord>> {
        let mut sessions = self.lock();
        let state = sessions.entry(session_id.to_string()).or_default();
        if let Some(record) = record {
            state.records.push(record);
        }
        state.tick(cadence).then(|| state.records.clone())
    }

    pub fn get(&self, session_id: &str) -> Option<SessionState> {
        self.lock().get(session_id).cloned()
    }

    pub fn insert(&self, session_id: &str, state: SessionState) {
        self.lock().insert(session_id.to_string(), state);
    }

    pub fn remove(&self, session_id: &str) -> Option<SessionState> {
        self.lock().remove(session_id)
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Snapshot file for `session_id` under `dir`. Characters outside
/// `[A-Za-z0-9_-]` are replaced so any id maps to a plain file name.
pub fn state_path(dir: &Path, session_id: &str) -> PathBuf {
    let name: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{name}.json"))
}

/// Load a session snapshot. Missing or corrupt snapshots start fresh.
pub fn load_state(path: &Path) -> SessionState {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!("discarding corrupt session state {}: {e}", path.display());
            SessionState::default()
        }),
        Err(_) => SessionState::default(),
    }
}

/// Take the exclusive lock guarding the snapshot at `path`. The lock lives
/// on a `.lock` sidecar and is released when the returned file is dropped.
///
/// # Errors
/// Returns an error if the sidecar cannot be opened or locked.
pub fn lock_state(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create session dir {}", parent.display()))?;
    }
    let lock_path = path.with_extension("lock");
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("open session lock {}", lock_path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("lock session state {}", lock_path.display()))?;
    Ok(file)
}

/// Persist a session snapshot. The file is replaced by rename, so a reader
/// never sees a partial write.
///
/// # Errors
/// Returns an error if the directory cannot be created or the file cannot be
/// written.
pub fn save_state(path: &Path, state: &SessionState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create session dir {}", parent.display()))?;
    }
    let json = serde_json::to_string(state).context("serialize session state")?;
    let name = path
        .file_name()
        .map_or_else(|| "session".into(), |n| n.to_string_lossy());
    let tmp = path.with_file_name(format!("{name}.tmp.{}", std::process::id()));
    std::fs::write(&tmp, json).with_context(|| format!("write session state {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("replace session state {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;
    use toktrim_common::tracking::types::calculate_savings;

    use super::*;

    fn record(session: &str) -> MetricRecord {
        MetricRecord {
            timestamp: "2026-03-01T12:00:00+00:00".to_string(),
            session_id: session.to_string(),
            tool: "bash".to_string(),
            technique: "build".to_string(),
            original_chars: 100,
            filtered_chars: 10,
            savings_percent: calculate_savings(100, 10),
        }
    }

    #[test]
    fn notifies_every_cadence_turns() {
        let store = SessionStore::new();
        assert!(store.record_turn("s", Some(record("s")), 3).is_none());
        assert!(store.record_turn("s", None, 3).is_none());
        let snapshot = store.record_turn("s", None, 3).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.get("s").unwrap().idle_turns, 0);
        assert!(store.record_turn("s", None, 3).is_none());
    }

    #[test]
    fn zero_cadence_never_notifies() {
        let store = SessionStore::new();
        for _ in 0..10 {
            assert!(store.record_turn("s", Some(record("s")), 0).is_none());
        }
        assert_eq!(store.get("s").unwrap().idle_turns, 10);
    }

    #[test]
    fn no_records_no_notification() {
        let store = SessionStore::new();
        assert!(store.record_turn("s", None, 1).is_none());
        assert!(store.record_turn("s", None, 1).is_none());
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        store.record_turn("a", Some(record("a")), 0);
        store.record_turn("b", None, 0);
        assert_eq!(store.get("a").unwrap().records.len(), 1);
        assert!(store.get("b").unwrap().records.is_empty());
        assert_eq!(store.session_ids(), vec!["a", "b"]);
        assert!(store.remove("a").is_some());
        assert!(store.get("a").is_none());
    }

    #[test]
    fn concurrent_sessions() {
        let store = Arc::new(SessionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let id = format!("s{}", t % 2);
                    for _ in 0..50 {
                        store.record_turn(&id, Some(record(&id)), 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.get("s0").unwrap().records.len(), 200);
        assert_eq!(store.get("s1").unwrap().records.len(), 200);
    }

    #[test]
    fn state_round_trips_through_disk() {
        let dir = TempDir::new().expect("tempdir");
        let path = state_path(dir.path(), "chat/42 x");
        assert_eq!(path.file_name().unwrap(), "chat_42_x.json");

        let state = SessionState {
            records: vec![record("chat/42 x")],
            idle_turns: 2,
        };
        save_state(&path, &state).unwrap();
        assert_eq!(load_state(&path), state);
    }

    #[test]
    fn locked_updates_are_not_lost() {
        let dir = TempDir::new().expect("tempdir");
        let path = Arc::new(state_path(dir.path(), "shared"));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = Arc::clone(&path);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let _guard = lock_state(&path).unwrap();
                        let mut state = load_state(&path);
                        state.records.push(record("shared"));
                        state.tick(0);
                        save_state(&path, &state).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let state = load_state(&path);
        assert_eq!(state.records.len(), 200);
        assert_eq!(state.idle_turns, 200);
        assert!(path.with_extension("lock").exists());
    }

    #[test]
    fn corrupt_state_starts_fresh() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{oops").unwrap();
        assert_eq!(load_state(&path), SessionState::default());
        assert_eq!(load_state(&dir.path().join("none.json")), SessionState::default());
    }
}
