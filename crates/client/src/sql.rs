//! PostgreSQL query executor on a bounded connection pool.
//!
//! Queries go over the simple-query protocol, so the server renders every
//! value as text and no client-side type mapping is needed. Only the first
//! result set of a multi-statement query is returned.

use async_trait::async_trait;
use deadpool_postgres::{ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod};
use sqlexport_core::{ExecError, QueryExecutor, QueryResult, Value};
use tokio_postgres::{NoTls, SimpleQueryMessage};

/// `QueryExecutor` backed by a `deadpool-postgres` pool.
#[derive(Clone)]
pub struct PgExecutor {
    pool: Pool,
}

impl PgExecutor {
    /// Build a pool for `url` holding at most `max_size` connections.
    ///
    /// No connection is opened until first use; call [`PgExecutor::ping`] to
    /// verify reachability.
    pub fn connect(url: &str, max_size: usize) -> Result<Self, ExecError> {
        let mut cfg = deadpool_postgres::Config::new();
        cfg.url = Some(url.to_string());
        cfg.manager = Some(ManagerConfig { recycling_method: RecyclingMethod::Fast });
        cfg.pool = Some(PoolConfig::new(max_size));

        let pool = cfg
            .create_pool(None, NoTls)
            .map_err(|e| ExecError::Connection(format!("failed to create pool: {e}")))?;

        Ok(Self { pool })
    }

    /// Round-trip a trivial statement to confirm the backend is reachable.
    pub async fn ping(&self) -> Result<(), ExecError> {
        let client = self.client().await?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| ExecError::Query(e.to_string()))?;
        Ok(())
    }

    async fn client(&self) -> Result<Object, ExecError> {
        self.pool.get().await.map_err(|e| {
            tracing::error!("DB Pool error: {}", e);
            ExecError::Connection(e.to_string())
        })
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn execute(&self, query: &str) -> Result<QueryResult, ExecError> {
        let client = self.client().await?;
        let messages = client
            .simple_query(query)
            .await
            .map_err(|e| ExecError::Query(e.to_string()))?;

        Ok(first_result_set(messages))
    }
}

/// Collect the first row-returning result set from a simple-query response.
///
/// Column names come from the row description, so a query returning no rows
/// still yields its header.
fn first_result_set(messages: Vec<SimpleQueryMessage>) -> QueryResult {
    let mut result = QueryResult::default();
    let mut described = false;

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                if described {
                    break;
                }
                result.columns = columns.iter().map(|c| c.name().to_string()).collect();
                described = true;
            }
            SimpleQueryMessage::Row(row) => {
                if !described {
                    result.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                    described = true;
                }
                let values = (0..row.len())
                    .map(|i| row.get(i).map_or(Value::Null, |s| Value::Text(s.to_string())))
                    .collect();
                result.rows.push(values);
            }
            SimpleQueryMessage::CommandComplete(_) if described => break,
            _ => {}
        }
    }

    result
}
