//! Chunked, TTL-bound cache for exported documents.
//!
//! This module wraps a plain get/set-with-TTL backend into a store that can
//! hold payloads larger than the backend's single-value limit:
//!
//! - Content-addressed keys using SHA-256 hashing of the query text
//! - Payloads split into bounded parts plus a meta record
//! - One TTL shared by every sub-key; entries expire passively
//! - An in-memory backend for tests and local runs

pub mod chunked;
pub mod hash;
pub mod kv;
pub mod memory;

pub use chunked::{ChunkedStore, DEFAULT_CHUNK_SIZE};
pub use hash::compute_cache_key;
pub use kv::{CacheError, KvStore};
pub use memory::MemoryKv;
