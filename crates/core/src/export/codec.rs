//! CSV encoding of query results.
//!
//! The header line holds the column names; each row becomes one record.
//! Records end with CRLF and fields are quoted only when they contain a
//! delimiter, quote, or line break. Type information is erased here: every
//! value is written in its `Display` form and NULL becomes an empty field.
//! In a single-column result an empty field is written as `""`, so the
//! record stays distinguishable from a blank line.

use std::io;

use bytes::Bytes;

use crate::query::{QueryResult, Value};

/// Errors from writing CSV to a sink.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to write record: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush output: {0}")]
    Io(#[from] io::Error),
}

/// Encode `result` into an in-memory CSV document.
pub fn encode_csv(result: &QueryResult) -> Result<Bytes, CodecError> {
    write_csv(result, Vec::new()).map(Bytes::from)
}

/// Write `result` as CSV into `sink`, returning the sink once flushed.
pub fn write_csv<W: io::Write>(result: &QueryResult, sink: W) -> Result<W, CodecError> {
    if result.columns.is_empty() {
        return Ok(sink);
    }

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(sink);

    wtr.write_record(&result.columns)?;

    let mut record: Vec<String> = Vec::with_capacity(result.columns.len());
    for row in &result.rows {
        record.clear();
        record.extend(row.iter().map(Value::to_string));
        wtr.write_record(&record)?;
    }

    wtr.into_inner().map_err(|e| CodecError::Io(e.into_error()))
}
