//! Deployment error types.

use thiserror::Error;

/// Errors that can occur while preparing fixtures.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("store error: {0}")]
    Store(#[from] cubefix_store::StoreError),

    #[error("invalid resource path: {0}")]
    Path(#[from] cubefix_core::PathError),

    #[error("command exited with {code:?}: {command}\n{stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to run command: {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no data staged in resource store for table: {0}")]
    MissingTableData(String),

    #[error("no metadata snapshot directory configured")]
    MissingSnapshot,

    #[error("invalid stream record: {0}")]
    InvalidRecord(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DeployResult<T> = Result<T, DeployError>;
