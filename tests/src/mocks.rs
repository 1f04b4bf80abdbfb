//! Mock implementations for testing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use pipeline_core::{Error, Result};
use query::{Catalog, Clock, JobStatus, QueryContext, QueryEngine, TableSpec};
use store::ObjectStore;

/// Query engine that plays back a scripted status sequence.
///
/// This implements the same `QueryEngine` trait as the real client,
/// allowing tests to drive the runner's poll loop through exact state
/// transitions without a live engine.
pub struct ScriptedEngine {
    inner: Mutex<ScriptedInner>,
}

struct ScriptedInner {
    /// Statuses returned by successive `get_status` calls; the last entry
    /// repeats once the script is exhausted.
    statuses: Vec<JobStatus>,
    status_calls: usize,
    results: Vec<Vec<String>>,
    started: Vec<String>,
    stopped: Vec<String>,
    next_job: u64,
}

impl ScriptedEngine {
    pub fn new(statuses: Vec<JobStatus>) -> Self {
        Self {
            inner: Mutex::new(ScriptedInner {
                statuses,
                status_calls: 0,
                results: Vec::new(),
                started: Vec::new(),
                stopped: Vec::new(),
                next_job: 1,
            }),
        }
    }

    /// Engine that reports SUCCEEDED immediately with the given raw rows.
    pub fn succeeding(results: Vec<Vec<String>>) -> Self {
        let engine = Self::new(vec![JobStatus::succeeded()]);
        engine.inner.lock().results = results;
        engine
    }

    /// Engine that never leaves RUNNING.
    pub fn never_finishing() -> Self {
        Self::new(vec![JobStatus::running()])
    }

    pub fn with_results(self, results: Vec<Vec<String>>) -> Self {
        self.inner.lock().results = results;
        self
    }

    /// Statements submitted through `start_query`, in order.
    pub fn started_statements(&self) -> Vec<String> {
        self.inner.lock().started.clone()
    }

    /// Job ids passed to `stop_query`, in order.
    pub fn stopped_jobs(&self) -> Vec<String> {
        self.inner.lock().stopped.clone()
    }

    /// How many times `get_status` was polled.
    pub fn poll_count(&self) -> usize {
        self.inner.lock().status_calls
    }
}

#[async_trait]
impl QueryEngine for ScriptedEngine {
    async fn start_query(&self, statement: &str, _ctx: &QueryContext) -> Result<String> {
        let mut inner = self.inner.lock();
        inner.started.push(statement.to_string());
        let id = format!("job-{}", inner.next_job);
        inner.next_job += 1;
        Ok(id)
    }

    async fn get_status(&self, _job_id: &str) -> Result<JobStatus> {
        let mut inner = self.inner.lock();
        let idx = inner.status_calls.min(inner.statuses.len() - 1);
        inner.status_calls += 1;
        Ok(inner.statuses[idx].clone())
    }

    async fn get_results(&self, _job_id: &str) -> Result<Vec<Vec<String>>> {
        Ok(self.inner.lock().results.clone())
    }

    async fn stop_query(&self, job_id: &str) -> Result<()> {
        self.inner.lock().stopped.push(job_id.to_string());
        Ok(())
    }
}

/// Deterministic clock: `sleep` advances the reported time instead of
/// waiting, so timeout behavior is testable without real delays.
pub struct FakeClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Total simulated time elapsed.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }

    async fn sleep(&self, duration: Duration) {
        *self.offset.lock() += duration;
    }
}

/// In-memory catalog with already-exists and not-found signaling.
#[derive(Default)]
pub struct MemoryCatalog {
    inner: Mutex<CatalogInner>,
}

#[derive(Default)]
struct CatalogInner {
    databases: Vec<String>,
    tables: BTreeMap<String, TableSpec>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_table(&self, database: &str, table: &str) -> bool {
        self.inner
            .lock()
            .tables
            .contains_key(&format!("{database}.{table}"))
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.inner.lock().databases.iter().any(|d| d == name)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn create_database(&self, name: &str, _description: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.databases.iter().any(|d| d == name) {
            return Err(Error::CatalogConflict(name.to_string()));
        }
        inner.databases.push(name.to_string());
        Ok(())
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<()> {
        let mut inner = self.inner.lock();
        let key = spec.qualified_name();
        if inner.tables.contains_key(&key) {
            return Err(Error::CatalogConflict(key));
        }
        inner.tables.insert(key, spec.clone());
        Ok(())
    }

    async fn delete_table(&self, database: &str, table: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let key = format!("{database}.{table}");
        if inner.tables.remove(&key).is_none() {
            return Err(Error::CatalogNotFound(key));
        }
        Ok(())
    }
}

/// Object store wrapper that fails `put` for keys containing a marker.
///
/// Used to verify that one failed write never aborts sibling writes in the
/// same batch.
pub struct FlakyStore<S> {
    inner: Arc<S>,
    fail_marker: String,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: Arc<S>, fail_marker: impl Into<String>) -> Self {
        Self {
            inner,
            fail_marker: fail_marker.into(),
        }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for FlakyStore<S> {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        if key.contains(&self.fail_marker) {
            return Err(Error::internal(format!("injected put failure for {key}")));
        }
        self.inner.put(key, body, content_type).await
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        self.inner.get(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_engine_repeats_last_status() {
        let engine = ScriptedEngine::new(vec![JobStatus::running(), JobStatus::succeeded()]);
        assert_eq!(engine.get_status("j").await.unwrap(), JobStatus::running());
        assert_eq!(engine.get_status("j").await.unwrap(), JobStatus::succeeded());
        assert_eq!(engine.get_status("j").await.unwrap(), JobStatus::succeeded());
    }

    #[tokio::test]
    async fn fake_clock_advances_on_sleep() {
        let clock = FakeClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_secs(3)).await;
        assert_eq!(clock.now() - start, Duration::from_secs(3));
    }
}
