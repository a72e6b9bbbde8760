//! Error types for practicelog-core
//!
//! The analytics functions are total over well-formed input and never fail.
//! Everything here comes from the data-access boundary: stores, snapshot
//! loading, configuration and file I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for practicelog operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Record Errors
    // ===================
    #[error("Invalid session {id}: {field} {reason}")]
    InvalidSession {
        id: i64,
        field: &'static str,
        reason: String,
    },

    #[error("Unknown instrument: {id}")]
    UnknownInstrument { id: i64 },

    // ===================
    // Store Errors
    // ===================
    #[error("Database error during {operation}")]
    Database {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Store task failed: {message}")]
    TaskJoin { message: String },

    // ===================
    // Snapshot Errors
    // ===================
    #[error("Incomplete snapshot after {fetched} records: {reason}")]
    IncompleteSnapshot { fetched: usize, reason: String },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CoreError {
    /// Wrap a rusqlite error with the operation that produced it
    pub fn database(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| CoreError::Database { operation, source }
    }

    pub(crate) fn invalid_session(id: i64, field: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidSession {
            id,
            field,
            reason: reason.into(),
        }
    }
}

impl From<tokio::task::JoinError> for CoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        CoreError::TaskJoin {
            message: e.to_string(),
        }
    }
}

/// Result alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
