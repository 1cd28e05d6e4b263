//! Crash-safe persistence for `Run`, `Plan`, `Monitor`, and `Suite` records.
//!
//! Grounded on `original_source/testbounty_agent/src/api_server.py`'s
//! `load_runs()`/`save_runs()` (one JSON file per record kind, read-modify-
//! write), generalized with a stronger durability discipline: writes land
//! via append-to-temp-then-rename so a crash mid-write never corrupts the
//! live file, and each kind has exactly one writer at a time (a
//! `tokio::sync::Mutex` per kind). Readers take a lock-free snapshot: they
//! read the file directly and never block on the writer lock.

use anyhow::{Context as _, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::protocol::{Monitor, Plan, Run, Suite};

/// One of the four record kinds the store persists, each its own JSON file
/// (one file per kind: `runs.json`, `test_plans.json`, `monitors.json`,
/// `test_suites.json`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Run,
    Plan,
    Monitor,
    Suite,
}

impl Kind {
    fn filename(self) -> &'static str {
        match self {
            Kind::Run => "runs.json",
            Kind::Plan => "test_plans.json",
            Kind::Monitor => "monitors.json",
            Kind::Suite => "test_suites.json",
        }
    }
}

/// Records are stored as id-keyed JSON maps; the store is generic over the
/// serde type per kind via the typed helper methods below rather than a
/// single trait object, since the four record types have nothing in common
/// beyond "has an id".
#[derive(Default)]
struct WriteLocks {
    run: Mutex<()>,
    plan: Mutex<()>,
    monitor: Mutex<()>,
    suite: Mutex<()>,
}

/// Process-wide handle to the on-disk store. Cheap to clone (wraps an
/// `Arc`); clones share the same write locks, matching the "single writer
/// per kind" contract even when multiple orchestrator tasks hold a handle.
#[derive(Clone)]
pub struct RunStore {
    root: PathBuf,
    locks: Arc<WriteLocks>,
}

impl RunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), locks: Arc::new(WriteLocks::default()) }
    }

    fn path_for(&self, kind: Kind) -> PathBuf {
        self.root.join(kind.filename())
    }

    /// Reads the JSON map for `kind`. An unreadable or missing file is
    /// treated as empty and logged;
    /// a file that exists but fails to parse is also treated as empty
    /// (better to lose a cache than to hard-fail every read).
    fn read_map<T: DeserializeOwned>(&self, kind: Kind) -> HashMap<String, T> {
        let path = self.path_for(kind);
        match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "store file unreadable, treating as empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    /// Writes `map` for `kind` via append-to-temp + rename so a crash
    /// mid-write never leaves a half-written file in place.
    fn write_map<T: Serialize>(&self, kind: Kind, map: &HashMap<String, T>) -> Result<()> {
        let path = self.path_for(kind);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating store directory {}", parent.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(map).context("serializing store file")?;
        std::fs::write(&tmp, &bytes)
            .with_context(|| format!("writing temp store file {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
        Ok(())
    }

    async fn put<T: Serialize + DeserializeOwned>(
        &self,
        kind: Kind,
        lock: &Mutex<()>,
        id: String,
        record: T,
    ) -> Result<()> {
        let _guard = lock.lock().await;
        let mut map: HashMap<String, T> = self.read_map(kind);
        map.insert(id, record);
        self.write_map(kind, &map)
    }

    fn get<T: DeserializeOwned>(&self, kind: Kind, id: &str) -> Option<T> {
        self.read_map::<T>(kind).remove(id)
    }

    fn list<T: DeserializeOwned>(&self, kind: Kind) -> Vec<T> {
        self.read_map::<T>(kind).into_values().collect()
    }

    async fn delete<T: Serialize + DeserializeOwned>(
        &self,
        kind: Kind,
        lock: &Mutex<()>,
        id: &str,
    ) -> Result<bool> {
        let _guard = lock.lock().await;
        let mut map: HashMap<String, T> = self.read_map(kind);
        let existed = map.remove(id).is_some();
        if existed {
            self.write_map(kind, &map)?;
        }
        Ok(existed)
    }

    // ---- Run ----

    /// Refuses to overwrite a record already in a terminal state, per the
    /// `Run` ownership invariant: once terminal, a run record never changes
    /// again. The caller (only the
    /// orchestrator for the owning run) is expected never to attempt this;
    /// surfacing it as an error rather than silently dropping the write
    /// makes a violated invariant visible instead of swallowed.
    pub async fn put_run(&self, run: Run) -> Result<()> {
        if let Some(existing) = self.get_run(&run.run_id) {
            if existing.status.is_terminal() {
                anyhow::bail!(
                    "refusing to overwrite terminal run {} (status={:?})",
                    run.run_id,
                    existing.status
                );
            }
        }
        self.put(Kind::Run, &self.locks.run, run.run_id.clone(), run).await
    }

    pub fn get_run(&self, id: &str) -> Option<Run> {
        self.get(Kind::Run, id)
    }

    pub fn list_runs(&self) -> Vec<Run> {
        self.list(Kind::Run)
    }

    pub async fn delete_run(&self, id: &str) -> Result<bool> {
        self.delete::<Run>(Kind::Run, &self.locks.run, id).await
    }

    // ---- Plan ----

    pub async fn put_plan(&self, run_id: &str, plan: Plan) -> Result<()> {
        self.put(Kind::Plan, &self.locks.plan, run_id.to_string(), plan).await
    }

    pub fn get_plan(&self, run_id: &str) -> Option<Plan> {
        self.get(Kind::Plan, run_id)
    }

    // ---- Monitor ----

    pub async fn put_monitor(&self, monitor: Monitor) -> Result<()> {
        self.put(Kind::Monitor, &self.locks.monitor, monitor.id.clone(), monitor).await
    }

    pub fn list_monitors(&self) -> Vec<Monitor> {
        self.list(Kind::Monitor)
    }

    pub async fn delete_monitor(&self, id: &str) -> Result<bool> {
        self.delete::<Monitor>(Kind::Monitor, &self.locks.monitor, id).await
    }

    // ---- Suite ----

    pub async fn put_suite(&self, suite: Suite) -> Result<()> {
        self.put(Kind::Suite, &self.locks.suite, suite.id.clone(), suite).await
    }

    pub fn list_suites(&self) -> Vec<Suite> {
        self.list(Kind::Suite)
    }

    pub async fn delete_suite(&self, id: &str) -> Result<bool> {
        self.delete::<Suite>(Kind::Suite, &self.locks.suite, id).await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{RunMetadata, RunStatus, Target};

    fn sample_run(id_suffix: &str, status: RunStatus) -> Run {
        let dir = std::env::temp_dir();
        let mut run = Run::new(Target::Url("https://example.com".into()), None, RunMetadata::default(), &dir, 3);
        run.run_id = format!("run-{id_suffix}");
        run.status = status;
        run
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempdir();
        let store = RunStore::new(&dir);
        let run = sample_run("a", RunStatus::Running);
        store.put_run(run.clone()).await.unwrap();
        let fetched = store.get_run(&run.run_id).unwrap();
        assert_eq!(fetched, run);
    }

    #[tokio::test]
    async fn delete_then_get_returns_none() {
        let dir = tempdir();
        let store = RunStore::new(&dir);
        let run = sample_run("b", RunStatus::Running);
        store.put_run(run.clone()).await.unwrap();
        assert!(store.delete_run(&run.run_id).await.unwrap());
        assert!(store.get_run(&run.run_id).is_none());
    }

    #[tokio::test]
    async fn terminal_run_cannot_be_overwritten() {
        let dir = tempdir();
        let store = RunStore::new(&dir);
        let mut run = sample_run("c", RunStatus::Completed);
        store.put_run(run.clone()).await.unwrap();
        run.error_log.push("late write".into());
        assert!(store.put_run(run).await.is_err());
    }

    #[tokio::test]
    async fn unreadable_file_is_treated_as_empty() {
        let dir = tempdir();
        std::fs::write(dir.join("runs.json"), b"not json").unwrap();
        let store = RunStore::new(&dir);
        assert!(store.list_runs().is_empty());
    }

    fn tempdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("testpilot-store-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
