//! Error types for span table reading and trace reconstruction

use crate::domain::PayloadError;
use thiserror::Error;

/// Result type for arrowtrace operations
pub type Result<T> = std::result::Result<T, ArrowTraceError>;

/// Errors that can occur while reading span tables or reconstructing traces
#[derive(Error, Debug)]
pub enum ArrowTraceError {
    /// Input path or glob pattern matched no files
    #[error("No files found matching: {0}")]
    NotFound(String),

    /// Tables being concatenated do not share the same columns
    #[error("Schema mismatch in table {index}: expected columns [{expected}], found [{found}]")]
    SchemaMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// One row's nested span payload could not be decoded
    #[error("Failed to decode span payload at row {row}: {source}")]
    PayloadDecode {
        row: usize,
        #[source]
        source: PayloadError,
    },

    /// Statistics requested on a table without rows
    #[error("Cannot compute statistics on an empty table")]
    EmptyTable,

    /// Missing required column
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Invalid column type
    #[error("Invalid column type for {column}: expected {expected}, got {actual}")]
    InvalidColumnType {
        column: String,
        expected: String,
        actual: String,
    },

    /// A cell holds a value the reader cannot represent
    #[error("Invalid value in column {column} at row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },

    /// Caller supplied an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    /// Error with Arrow data structures or IPC decoding
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ArrowTraceError {
    /// Wraps a payload failure with the row it came from
    pub fn payload_decode(row: usize, source: PayloadError) -> Self {
        ArrowTraceError::PayloadDecode { row, source }
    }
}
