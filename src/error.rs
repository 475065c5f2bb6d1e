//! Error types for the Falcata library.
//!
//! All errors are represented by the [`FalcataError`] enum. The taxonomy is
//! deliberately small: I/O faults and format-decode faults are fatal for the
//! operation in progress and are never retried, while logical absence (a term
//! not in the dictionary, an empty merge result) is not an error at all and
//! is represented as `Ok(None)` or an empty list by the calling code.

use std::io;

use thiserror::Error;

/// The main error type for Falcata operations.
#[derive(Error, Debug)]
pub enum FalcataError {
    /// I/O errors (file operations, seeks, reads, writes).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index-related errors (committing twice, table overflow, etc.).
    #[error("Index error: {0}")]
    Index(String),

    /// Storage-related errors.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Format-decode errors (corrupt postings text, unparsable fields).
    ///
    /// The on-disk formats are produced exclusively by this crate's own
    /// encoders, so a decode failure indicates a storage-integrity violation.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Query-related errors.
    #[error("Query error: {0}")]
    Query(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with FalcataError.
pub type Result<T> = std::result::Result<T, FalcataError>;

impl FalcataError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        FalcataError::Index(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        FalcataError::Storage(msg.into())
    }

    /// Create a new decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        FalcataError::Decode(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        FalcataError::Query(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        FalcataError::Other(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        FalcataError::Other(format!("Invalid argument: {}", msg.into()))
    }
}
