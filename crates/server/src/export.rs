//! Cache-aside CSV export pipeline.
//!
//! One request walks `Start -> CacheCheck -> (CacheHit | CacheMiss) -> Respond`:
//!
//! - **Start**: reject a query that is empty after trimming.
//! - **CacheCheck**: derive the key and check the chunked store.
//! - **CacheHit**: reassemble the cached document and snapshot it. An
//!   unreadable entry degrades to the miss path instead of failing.
//! - **CacheMiss**: execute, encode, populate the cache under a deadline,
//!   then snapshot. Population is awaited before responding, so a miss pays
//!   for the cache write up to the deadline.
//!
//! Cache and snapshot failures are logged and never reach the caller.
//! Concurrent identical misses both execute and both write; the last write
//! wins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use sqlexport_core::{
    AppConfig, CacheError, ChunkedStore, Error, QueryExecutor, SnapshotWriter, cache::compute_cache_key, encode_csv,
};

/// Where the served document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// A finished export, ready to stream.
#[derive(Debug, Clone)]
pub struct Export {
    pub document: Bytes,
    pub cache: CacheStatus,
}

/// Cache timing knobs for the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ExportSettings {
    pub cache_ttl: Duration,
    pub cache_write_timeout: Duration,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { cache_ttl: Duration::from_secs(300), cache_write_timeout: Duration::from_secs(5) }
    }
}

impl From<&AppConfig> for ExportSettings {
    fn from(config: &AppConfig) -> Self {
        Self { cache_ttl: config.cache_ttl(), cache_write_timeout: config.cache_write_timeout() }
    }
}

/// Orchestrates cache lookup, query execution, cache population and
/// snapshotting for a single export request.
pub struct Exporter {
    store: ChunkedStore,
    executor: Arc<dyn QueryExecutor>,
    snapshots: SnapshotWriter,
    settings: ExportSettings,
}

impl Exporter {
    pub fn new(
        store: ChunkedStore, executor: Arc<dyn QueryExecutor>, snapshots: SnapshotWriter, settings: ExportSettings,
    ) -> Self {
        Self { store, executor, snapshots, settings }
    }

    /// Produce the CSV document for `raw_query`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if the query is blank
    /// - `Error::Exec` if the backend fails the query
    /// - `Error::Encode` if the result cannot be rendered
    pub async fn export(&self, raw_query: &str) -> Result<Export, Error> {
        let query = raw_query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Query is empty".into()));
        }

        let key = compute_cache_key(query);
        let start = Instant::now();

        if let Some(document) = self.read_cached(&key).await {
            tracing::info!(key = %key, bytes = document.len(), "Cache hit. Exporting cached result");
            self.snapshot(&document).await;
            return Ok(Export { document, cache: CacheStatus::Hit });
        }

        tracing::info!(key = %key, "Cache miss. Executing query");

        let result = self.executor.execute(query).await.inspect_err(|e| {
            tracing::error!(key = %key, error = %e, "query execution failed");
        })?;
        tracing::info!(
            columns = result.columns.len(),
            rows = result.row_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "query executed"
        );

        let document = encode_csv(&result).inspect_err(|e| {
            tracing::error!(key = %key, error = %e, "failed to encode query result");
        })?;

        self.populate(&key, document.clone()).await;
        self.snapshot(&document).await;

        tracing::info!(key = %key, bytes = document.len(), "export ready");
        Ok(Export { document, cache: CacheStatus::Miss })
    }

    /// The cached document, or `None` when the pipeline should recompute.
    async fn read_cached(&self, key: &str) -> Option<Bytes> {
        if !self.store.exists(key).await {
            return None;
        }

        match self.store.get(key).await {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!(key, error = %e, "cached entry unreadable; recomputing");
                None
            }
        }
    }

    async fn populate(&self, key: &str, document: Bytes) {
        let deadline = self.settings.cache_write_timeout;
        let bytes = document.len();
        let write = self.store.put(key, document, self.settings.cache_ttl);

        match tokio::time::timeout(deadline, write).await {
            Ok(Ok(())) => tracing::info!(key, bytes, "cache populated"),
            Ok(Err(e)) => tracing::warn!(key, error = %e, "Failed to cache query result"),
            Err(_) => {
                tracing::warn!(key, error = %CacheError::Timeout(deadline), "Failed to cache query result")
            }
        }
    }

    async fn snapshot(&self, document: &[u8]) {
        if let Err(e) = self.snapshots.persist(document).await {
            tracing::warn!(dir = %self.snapshots.dir().display(), error = %e, "Failed to save snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DownKv, ScriptedExecutor, StalledKv};
    use sqlexport_core::{KvStore, MemoryKv, QueryResult};
    use std::path::Path;

    const SELECT_ONE_CSV: &[u8] = b"?column?\r\n1\r\n";

    struct Harness {
        kv: Arc<MemoryKv>,
        executor: Arc<ScriptedExecutor>,
        exporter: Exporter,
        snapshots: tempfile::TempDir,
    }

    fn harness(executor: Arc<ScriptedExecutor>) -> Harness {
        let kv = Arc::new(MemoryKv::new());
        let snapshots = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(
            ChunkedStore::with_chunk_size(kv.clone(), 8),
            executor.clone(),
            SnapshotWriter::new(snapshots.path()),
            ExportSettings::default(),
        );
        Harness { kv, executor, exporter, snapshots }
    }

    fn snapshot_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_miss_executes_caches_and_snapshots() {
        let h = harness(ScriptedExecutor::select_one());

        let export = h.exporter.export("SELECT 1").await.unwrap();

        assert_eq!(export.cache, CacheStatus::Miss);
        assert_eq!(export.document, SELECT_ONE_CSV);
        assert_eq!(h.executor.calls(), 1);

        let key = compute_cache_key("SELECT 1");
        assert_eq!(h.kv.get(&format!("{key}:meta")).await.unwrap().unwrap(), Bytes::from_static(b"parts:2"));
        assert_eq!(snapshot_count(h.snapshots.path()), 1);
    }

    #[tokio::test]
    async fn test_repeat_within_ttl_is_served_from_cache() {
        let h = harness(ScriptedExecutor::select_one());

        let first = h.exporter.export("SELECT 1").await.unwrap();
        let second = h.exporter.export("  SELECT 1  ").await.unwrap();

        assert_eq!(second.cache, CacheStatus::Hit);
        assert_eq!(second.document, first.document);
        assert_eq!(h.executor.calls(), 1);
        assert_eq!(snapshot_count(h.snapshots.path()), 2);
    }

    #[tokio::test]
    async fn test_blank_query_rejected_without_side_effects() {
        let h = harness(ScriptedExecutor::select_one());

        for query in ["", "   ", "\n\t "] {
            let result = h.exporter.export(query).await;
            assert!(matches!(result, Err(Error::InvalidInput(_))), "{query:?}");
        }

        assert_eq!(h.executor.calls(), 0);
        assert_eq!(h.kv.live_keys().await, 0);
        assert_eq!(snapshot_count(h.snapshots.path()), 0);
    }

    #[tokio::test]
    async fn test_execution_failure_writes_nothing() {
        let h = harness(ScriptedExecutor::failing("syntax error at or near \"SELEC\""));

        let result = h.exporter.export("SELEC 1").await;

        assert!(matches!(result, Err(Error::Exec(_))));
        assert_eq!(h.kv.live_keys().await, 0);
        assert_eq!(snapshot_count(h.snapshots.path()), 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_degrades_to_recompute() {
        let h = harness(ScriptedExecutor::select_one());
        h.exporter.export("SELECT 1").await.unwrap();

        let key = compute_cache_key("SELECT 1");
        assert!(h.kv.remove(&format!("{key}:part:1")).await);

        let export = h.exporter.export("SELECT 1").await.unwrap();
        assert_eq!(export.cache, CacheStatus::Miss);
        assert_eq!(export.document, SELECT_ONE_CSV);
        assert_eq!(h.executor.calls(), 2);

        let repaired = h.exporter.export("SELECT 1").await.unwrap();
        assert_eq!(repaired.cache, CacheStatus::Hit);
        assert_eq!(h.executor.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_recomputed() {
        let h = harness(ScriptedExecutor::select_one());
        h.exporter.export("SELECT 1").await.unwrap();

        tokio::time::advance(ExportSettings::default().cache_ttl).await;

        let export = h.exporter.export("SELECT 1").await.unwrap();
        assert_eq!(export.cache, CacheStatus::Miss);
        assert_eq!(h.executor.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cache_write_is_capped_by_deadline() {
        let executor = ScriptedExecutor::select_one();
        let snapshots = tempfile::tempdir().unwrap();
        let settings = ExportSettings { cache_write_timeout: Duration::from_secs(5), ..Default::default() };
        let exporter = Exporter::new(
            ChunkedStore::new(Arc::new(StalledKv { write_delay: Duration::from_secs(3600) })),
            executor.clone(),
            SnapshotWriter::new(snapshots.path()),
            settings,
        );

        let start = tokio::time::Instant::now();
        let export = exporter.export("SELECT 1").await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(export.document, SELECT_ONE_CSV);
        assert!(elapsed >= Duration::from_secs(5), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(3600), "{elapsed:?}");
        assert_eq!(snapshot_count(snapshots.path()), 1);
    }

    #[tokio::test]
    async fn test_cache_backend_down_still_serves() {
        let executor = ScriptedExecutor::select_one();
        let snapshots = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(
            ChunkedStore::new(Arc::new(DownKv)),
            executor.clone(),
            SnapshotWriter::new(snapshots.path()),
            ExportSettings::default(),
        );

        let export = exporter.export("SELECT 1").await.unwrap();
        assert_eq!(export.cache, CacheStatus::Miss);
        assert_eq!(export.document, SELECT_ONE_CSV);
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_failure_does_not_fail_request() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let kv = Arc::new(MemoryKv::new());
        let exporter = Exporter::new(
            ChunkedStore::new(kv.clone()),
            ScriptedExecutor::select_one(),
            SnapshotWriter::new(blocker.path().join("data")),
            ExportSettings::default(),
        );

        let export = exporter.export("SELECT 1").await.unwrap();
        assert_eq!(export.document, SELECT_ONE_CSV);
        assert!(kv.live_keys().await > 0);
    }

    #[tokio::test]
    async fn test_large_document_spans_many_parts() {
        let mut result = QueryResult::new(vec!["n".into()]);
        for n in 0..500 {
            result.rows.push(vec![sqlexport_core::Value::Int(n)]);
        }
        let h = harness(ScriptedExecutor::returning(result));

        let miss = h.exporter.export("SELECT generate_series(0, 499) AS n").await.unwrap();
        let hit = h.exporter.export("SELECT generate_series(0, 499) AS n").await.unwrap();

        assert_eq!(hit.cache, CacheStatus::Hit);
        assert_eq!(hit.document, miss.document);
        assert!(miss.document.len() > 8 * 100);
    }
}
