//! Export document production.
//!
//! - [`codec`]: renders a [`QueryResult`](crate::QueryResult) as CSV
//! - [`snapshot`]: archives a rendered document to local storage

pub mod codec;
pub mod snapshot;

pub use codec::{CodecError, encode_csv, write_csv};
pub use snapshot::SnapshotWriter;
