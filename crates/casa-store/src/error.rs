//! Store errors

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} already exists: {id}")]
    Duplicate { kind: &'static str, id: String },

    #[error("invalid value in column {column}: {value}")]
    InvalidColumn { column: &'static str, value: String },

    #[error("database lock poisoned")]
    LockPoisoned,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
