//! Core types and shared functionality for sqlexport.
//!
//! This crate provides:
//! - Chunked, TTL-bound result cache over a pluggable key-value backend
//! - Query result types and the executor seam
//! - CSV encoding and local snapshot persistence
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod query;

pub use cache::{CacheError, ChunkedStore, KvStore, MemoryKv};
pub use config::AppConfig;
pub use error::Error;
pub use export::{CodecError, SnapshotWriter, encode_csv};
pub use query::{ExecError, QueryExecutor, QueryResult, Value};
