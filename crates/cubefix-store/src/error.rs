//! Error types for the resource store.

use thiserror::Error;

/// Result type alias for resource store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during resource store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error at {path}: {reason}")]
    Deserialize { path: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// The stored stamp moved since the caller read it.
    #[error("write conflict at {path}: expected stamp {expected:?}, found {actual:?}")]
    WriteConflict {
        path: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    #[error("invalid resource path: {0}")]
    Path(#[from] cubefix_core::PathError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
