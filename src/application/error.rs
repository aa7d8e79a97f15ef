//! Application-level errors

use std::path::PathBuf;
use thiserror::Error;

/// Application errors cover everything around the (infallible) core:
/// configuration, reading the snapshot and lookups requested by the user.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("data file not found: {0}")]
    SnapshotNotFound(PathBuf),

    #[error("invalid family data in {path}: {source}")]
    InvalidSnapshot {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },

    #[error("invalid family data: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("person not found: {0}")]
    PersonNotFound(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Why a family document could not be turned into person records.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("malformed JSON or person entry: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no person list under any of the keys [{}]", .0.join(", "))]
    MissingCollection(Vec<String>),

    #[error("expected an array or object, found {0}")]
    UnexpectedShape(&'static str),
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
