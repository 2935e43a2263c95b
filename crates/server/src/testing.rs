//! Test doubles shared by the server's unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sqlexport_core::{CacheError, ExecError, KvStore, QueryExecutor, QueryResult, Value};

/// Executor that replays a fixed outcome and counts calls.
pub struct ScriptedExecutor {
    outcome: Result<QueryResult, String>,
    calls: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn returning(result: QueryResult) -> Arc<Self> {
        Arc::new(Self { outcome: Ok(result), calls: AtomicUsize::new(0) })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self { outcome: Err(message.to_string()), calls: AtomicUsize::new(0) })
    }

    /// `SELECT 1` as PostgreSQL answers it.
    pub fn select_one() -> Arc<Self> {
        Self::returning(QueryResult::new(vec!["?column?".into()]).with_row(vec![Value::Int(1)]))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, _query: &str) -> Result<QueryResult, ExecError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map_err(ExecError::Query)
    }
}

/// Executor that never answers within any reasonable deadline.
pub struct StalledExecutor {
    pub delay: Duration,
}

#[async_trait]
impl QueryExecutor for StalledExecutor {
    async fn execute(&self, _query: &str) -> Result<QueryResult, ExecError> {
        tokio::time::sleep(self.delay).await;
        Ok(QueryResult::default())
    }
}

/// Key-value store whose writes never finish in time and whose reads miss.
pub struct StalledKv {
    pub write_delay: Duration,
}

#[async_trait]
impl KvStore for StalledKv {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        tokio::time::sleep(self.write_delay).await;
        Ok(())
    }
}

/// Key-value store that is unreachable.
pub struct DownKv;

#[async_trait]
impl KvStore for DownKv {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }
}
