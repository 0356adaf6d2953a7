//! Chunked bulk upload into the catalogue.
//!
//! In replace mode every existing record is deleted first, chunk by chunk;
//! then the new records are inserted chunk by chunk. Each chunk is committed
//! on its own, so a failure or cancellation leaves earlier chunks in place.
//! Cancellation is checked before each chunk, never in the middle of one.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::cache::RecordCache;
use crate::config::{DEFAULT_UPLOAD_CHUNK_SIZE, EngineConfig};
use crate::error::{StoreError, StoreResult, UploadError};
use crate::ports::CatalogWriter;
use crate::record::NewRecord;

/// Whether an upload keeps or replaces the existing catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    #[default]
    Append,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadPhase {
    Deleting,
    Uploading,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleting => f.write_str("deleting"),
            Self::Uploading => f.write_str("uploading"),
        }
    }
}

/// Progress after a committed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub phase: UploadPhase,
    pub current: usize,
    pub total: usize,
}

impl UploadProgress {
    /// Completion of the current phase, rounded to a whole percent.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.current.min(self.total) * 100 + self.total / 2) / self.total;
        pct as u8
    }
}

/// Records deleted and inserted by an upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub deleted: usize,
    pub inserted: usize,
}

impl UploadOutcome {
    pub fn is_empty(&self) -> bool {
        self.deleted == 0 && self.inserted == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    pub mode: UploadMode,
    pub chunk_size: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            mode: UploadMode::Append,
            chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
        }
    }
}

impl UploadOptions {
    pub fn new(mode: UploadMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn from_config(config: &EngineConfig, mode: UploadMode) -> Self {
        Self::new(mode).with_chunk_size(config.upload_chunk_size)
    }

    /// Sets the chunk size. Zero is clamped to one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

/// Uploads `records` through `writer`.
///
/// `on_progress` is called after every committed chunk. When anything was
/// committed, `cache` is invalidated, whether the upload finished or not.
pub async fn upload<W>(
    writer: &W,
    records: &[NewRecord],
    options: UploadOptions,
    mut on_progress: impl FnMut(UploadProgress),
    cancel: &CancellationToken,
    cache: Option<&RecordCache>,
) -> Result<UploadOutcome, UploadError>
where
    W: CatalogWriter + ?Sized,
{
    if records.is_empty() {
        return Err(UploadError::NothingToUpload);
    }
    let chunk_size = options.chunk_size.max(1);
    let mut outcome = UploadOutcome::default();

    tracing::info!(
        records = records.len(),
        mode = ?options.mode,
        chunk_size,
        "starting upload"
    );

    let result = async {
        if options.mode == UploadMode::Replace {
            let ids = writer.list_ids().await.map_err(|e| (e, outcome))?;
            let mut processed = 0;
            for chunk in ids.chunks(chunk_size) {
                check_cancelled(cancel, outcome)?;
                let deleted = writer.delete_many(chunk).await.map_err(|e| (e, outcome))?;
                outcome.deleted += deleted;
                processed += chunk.len();
                on_progress(UploadProgress {
                    phase: UploadPhase::Deleting,
                    current: processed,
                    total: ids.len(),
                });
            }
            tracing::debug!(deleted = outcome.deleted, "deleted existing records");
        }

        for chunk in records.chunks(chunk_size) {
            check_cancelled(cancel, outcome)?;
            let ids = writer.insert_many(chunk).await.map_err(|e| (e, outcome))?;
            outcome.inserted += ids.len();
            on_progress(UploadProgress {
                phase: UploadPhase::Uploading,
                current: outcome.inserted,
                total: records.len(),
            });
        }
        Ok::<_, Stop>(outcome)
    }
    .await;

    let committed = match &result {
        Ok(outcome) => *outcome,
        Err(Stop::Cancelled(progress)) | Err(Stop::Failed(_, progress)) => *progress,
    };
    if !committed.is_empty()
        && let Some(cache) = cache
    {
        cache.invalidate();
    }

    match result {
        Ok(outcome) => {
            tracing::info!(
                deleted = outcome.deleted,
                inserted = outcome.inserted,
                "upload finished"
            );
            Ok(outcome)
        }
        Err(Stop::Cancelled(progress)) => {
            tracing::info!(
                deleted = progress.deleted,
                inserted = progress.inserted,
                "upload cancelled"
            );
            Err(UploadError::Cancelled { progress })
        }
        Err(Stop::Failed(source, progress)) => {
            tracing::warn!(
                error = %source,
                deleted = progress.deleted,
                inserted = progress.inserted,
                "upload failed"
            );
            Err(UploadError::Store { progress, source })
        }
    }
}

enum Stop {
    Cancelled(UploadOutcome),
    Failed(StoreError, UploadOutcome),
}

impl From<(StoreError, UploadOutcome)> for Stop {
    fn from((error, progress): (StoreError, UploadOutcome)) -> Self {
        Self::Failed(error, progress)
    }
}

fn check_cancelled(cancel: &CancellationToken, progress: UploadOutcome) -> Result<(), Stop> {
    if cancel.is_cancelled() {
        return Err(Stop::Cancelled(progress));
    }
    Ok(())
}

/// Single-record writes need a procedure name.
fn ensure_named(record: &NewRecord) -> StoreResult<()> {
    if record.procedure_name.trim().is_empty() {
        return Err(StoreError::invalid_record("procedure name is empty"));
    }
    Ok(())
}

/// Inserts one record, invalidates the cache and returns the new id.
pub async fn create_record<W>(
    writer: &W,
    record: &NewRecord,
    cache: Option<&RecordCache>,
) -> StoreResult<String>
where
    W: CatalogWriter + ?Sized,
{
    ensure_named(record)?;
    let id = writer
        .insert_many(std::slice::from_ref(record))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::backend("insert returned no id"))?;
    if let Some(cache) = cache {
        cache.invalidate();
    }
    tracing::info!(id = %id, "record created");
    Ok(id)
}

/// Replaces the text fields of one record and invalidates the cache.
pub async fn edit_record<W>(
    writer: &W,
    id: &str,
    record: &NewRecord,
    cache: Option<&RecordCache>,
) -> StoreResult<()>
where
    W: CatalogWriter + ?Sized,
{
    ensure_named(record)?;
    writer.update_one(id, record).await?;
    if let Some(cache) = cache {
        cache.invalidate();
    }
    tracing::info!(id, "record updated");
    Ok(())
}

/// Deletes one record and invalidates the cache.
pub async fn delete_record<W>(writer: &W, id: &str, cache: Option<&RecordCache>) -> StoreResult<()>
where
    W: CatalogWriter + ?Sized,
{
    let deleted = writer.delete_many(&[id.to_string()]).await?;
    if deleted == 0 {
        return Err(StoreError::record_not_found(id));
    }
    if let Some(cache) = cache {
        cache.invalidate();
    }
    tracing::info!(id, "record deleted");
    Ok(())
}
