//! Error types for procsearch-storage.

use std::path::PathBuf;

use procsearch_engine::StoreError;
use thiserror::Error;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key that cannot be used as a file name.
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// Path without a parent or file name.
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    /// The catalogue file exists but cannot be parsed.
    #[error("Corrupt catalogue file {path}: {source}")]
    CorruptCatalog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Home directory not found.
    #[error("Could not determine home/data directory")]
    HomeDirNotFound,
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => StoreError::Io(e),
            StorageError::Json(e) => StoreError::Json(e),
            other => StoreError::backend(other.to_string()),
        }
    }
}
