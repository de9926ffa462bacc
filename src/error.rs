//! Error Types
//!
//! Two layers, matching how they surface:
//! - `StorageError`: anything the SQLite layer can fail with.
//! - `TaskError`: the lifecycle engine's taxonomy. `NotFound`, `Conflict`
//!   and `HashMismatch` are caller/input problems and map to distinct HTTP
//!   responses at the boundary; the remaining variants are fatal for the
//!   operation and are never retried by the engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StorageError::Constraint(err.to_string())
            }
            _ => StorageError::Database(err.to_string()),
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("result hash mismatch: caller sent {supplied}, engine computed {computed}")]
    HashMismatch { supplied: String, computed: String },

    #[error("invalid timestamp in payload: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TaskResult<T> = std::result::Result<T, TaskError>;
