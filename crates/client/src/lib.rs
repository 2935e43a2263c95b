//! Backend clients for sqlexport.
//!
//! This crate provides the concrete collaborators behind the seams defined in
//! `sqlexport-core`: a pooled PostgreSQL query executor and a Redis key-value
//! store.

pub mod kv;
pub mod sql;

pub use kv::RedisKv;
pub use sql::PgExecutor;
