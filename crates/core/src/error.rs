//! Unified error types for sqlexport.
//!
//! Only failures that end a request live here. Cache and snapshot failures
//! are recovered where they happen and never reach the caller.

use crate::export::CodecError;
use crate::query::ExecError;

/// Unified error type for an export request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The relational backend rejected or failed the query.
    #[error("EXEC_FAILED: {0}")]
    Exec(#[from] ExecError),

    /// The query result could not be encoded.
    #[error("ENCODE_FAILED: {0}")]
    Encode(#[from] CodecError),
}
