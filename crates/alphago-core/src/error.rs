//! Error types for alphago-core

use thiserror::Error;

use crate::storage::StorageError;

/// Result type alias using alphago-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in alphago-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Durable storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
