//! Core error types for onetask-core.
//!
//! This module defines the error hierarchy using thiserror. The pure
//! components (prioritization engine, eligibility filter) never fail;
//! everything that touches the repository or parses external input
//! reports through [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for onetask-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A referenced task id is absent from the repository
    #[error("Task not found: {0}")]
    NotFound(String),

    /// An import payload failed the shape check
    #[error("Invalid import format: {0}")]
    InvalidFormat(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A state-machine transition was requested from the wrong state
    #[error("Cannot {action} while in state '{state}'")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Task name must be non-empty
    #[error("Task name must not be empty")]
    EmptyName,

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
