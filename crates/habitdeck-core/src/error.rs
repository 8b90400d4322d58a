//! Core error types for habitdeck-core.
//!
//! Every failure path in this crate degrades a single feature; none of these
//! errors is fatal to a session. Reminder errors never escape the poll
//! boundary, store errors surface from `unlock` and `toggle`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitdeck-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Preference store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reminder source errors
    #[error("Reminder error: {0}")]
    Reminder(#[from] ReminderError),
}

/// Preference store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another process
    #[error("Store is locked")]
    Locked,

    /// A previous writer panicked while holding the store
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Reminder source errors. Swallowed at the poll boundary.
#[derive(Error, Debug)]
pub enum ReminderError {
    /// Network or transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server replied with a non-success status
    #[error("Reminder source returned HTTP {0}")]
    Status(u16),

    /// Body was not a reminder signal
    #[error("Malformed reminder response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Endpoint could not be built from the configured base URL
    #[error("Invalid reminder endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
