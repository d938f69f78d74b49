//! Error types for Janitor operations

use crumb_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Janitor operations
#[derive(Error, Debug)]
pub enum JanitorError {
    /// The cookie database could not be opened or locked
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A query failed (malformed SQL, parameter mismatch, constraint violation)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The preference store could not be read or written
    #[error("Preferences error: {0}")]
    Preferences(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<StoreError> for JanitorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => JanitorError::StoreUnavailable(msg),
            StoreError::Query(e) => JanitorError::Query(e.to_string()),
        }
    }
}
