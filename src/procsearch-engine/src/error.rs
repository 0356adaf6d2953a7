//! Error types for catalogue storage, CSV import and bulk upload.

use crate::upload::UploadOutcome;

/// Result type alias for storage port operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors reported by the storage ports (record source, key-value stores, writers).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be serialized or deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record with the given id does not exist.
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// The backing store rejected the operation.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// The record was refused before reaching the store.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    /// Creates a new `RecordNotFound` error.
    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::RecordNotFound(id.into())
    }

    /// Creates a new `Backend` error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Creates a new `InvalidRecord` error.
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord(reason.into())
    }
}

/// Errors that abort a CSV import as a whole.
///
/// Malformed data rows never produce an error; they are skipped and listed
/// in the import report instead.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The file has no data rows after the header.
    #[error("CSV file must have at least a header row and one data row")]
    NotEnoughRows,

    /// The header lacks one or more required columns.
    #[error("CSV must have columns: {}; missing: {}", .required.join(", "), .missing.join(", "))]
    MissingColumns {
        required: Vec<String>,
        missing: Vec<String>,
    },

    /// The reader could not decode a row.
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl ImportError {
    /// Creates a new `MissingColumns` error.
    pub fn missing_columns(
        required: impl IntoIterator<Item = impl Into<String>>,
        missing: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::MissingColumns {
            required: required.into_iter().map(Into::into).collect(),
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }
}

/// Errors from a bulk upload.
///
/// Chunks committed before the failure stay committed; `progress` tells the
/// caller how far the upload got.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// There was nothing to upload.
    #[error("No records to upload")]
    NothingToUpload,

    /// The upload was cancelled between two chunks.
    #[error("Upload cancelled after deleting {} and inserting {} records", .progress.deleted, .progress.inserted)]
    Cancelled { progress: UploadOutcome },

    /// A chunk failed to commit.
    #[error("Upload failed after deleting {} and inserting {} records: {source}", .progress.deleted, .progress.inserted)]
    Store {
        progress: UploadOutcome,
        #[source]
        source: StoreError,
    },
}

impl UploadError {
    /// Returns the progress made before the upload stopped, if any.
    pub fn progress(&self) -> Option<&UploadOutcome> {
        match self {
            Self::NothingToUpload => None,
            Self::Cancelled { progress } | Self::Store { progress, .. } => Some(progress),
        }
    }
}
