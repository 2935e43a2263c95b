//! Query results and the relational executor seam.

use std::fmt;

use async_trait::async_trait;

/// A single dynamically-typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// Canonical string form. Null renders as the empty string.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "\\x{}", hex::encode(b)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Column names plus column-aligned rows, in backend order.
///
/// Column names are not required to be unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Errors from a relational executor.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// No usable backend connection.
    #[error("backend unavailable: {0}")]
    Connection(String),

    /// The backend rejected or failed the statement.
    #[error("query failed: {0}")]
    Query(String),
}

/// Runs a query string against the relational backend.
///
/// Implementations neither validate nor retry; a deadline, if any, belongs
/// to the caller.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str) -> Result<QueryResult, ExecError>;
}
