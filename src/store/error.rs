//! Diary store error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

/// Errors surfaced by diary store operations.
///
/// A missing entry is not an error: it reads as the empty entry.
#[derive(Error, Debug)]
pub enum DiaryError {
    /// The remote API could not be reached or rejected the request.
    /// Optimistic changes have already been rolled back when this is returned.
    #[error("Network failure: {0}")]
    NetworkFailure(#[from] ApiError),

    /// Local storage could not be written or read.
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StorageError),

    #[error("Food not found in entry: {0}")]
    FoodNotFound(String),
}

/// Errors from the local key-value storage.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    /// A stored value exists but is not valid JSON for its type.
    #[error("Failed to parse stored value '{0}': {1}")]
    Parse(String, #[source] serde_json::Error),

    #[error("Failed to encode value for '{0}': {1}")]
    Encode(String, #[source] serde_json::Error),
}
