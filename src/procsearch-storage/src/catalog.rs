//! Catalogue kept in a single JSON file.
//!
//! The file holds a pretty-printed array of records, newest first. Every
//! write rewrites the whole file atomically and then publishes the new
//! snapshot to subscribers.

use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use procsearch_engine::ports::Subscribers;
use procsearch_engine::{
    CatalogWriter, NewRecord, Record, RecordSource, SnapshotCallback, StoreError, StoreResult,
    Subscription,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::fsutil::write_atomic;

/// A [`RecordSource`] and [`CatalogWriter`] over a JSON file.
///
/// Snapshots are published while the record lock is held, so subscriber
/// callbacks must not call back into the catalogue.
#[derive(Debug)]
pub struct JsonCatalog {
    path: PathBuf,
    records: Mutex<Vec<Record>>,
    subscribers: Subscribers,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonCatalog {
    /// Opens the catalogue at `path`. A missing file is an empty catalogue.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let records = read_records(&path)?;
        info!(path = %path.display(), records = records.len(), "catalogue opened");
        Ok(Self {
            path,
            records: Mutex::new(records),
            subscribers: Subscribers::new(),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of the stored records, newest first.
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Applies `change` to a copy of the records, persists it, then swaps
    /// it in and publishes.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut Vec<Record>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.records.lock().clone();
        let output = change(&mut next)?;

        let content = serde_json::to_vec_pretty(&next)?;
        write_atomic(&self.path, &content).await?;

        let mut records = self.records.lock();
        *records = next;
        self.subscribers.publish(&records);
        debug!(records = records.len(), "catalogue committed");
        Ok(output)
    }
}

fn read_records(path: &Path) -> Result<Vec<Record>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).map_err(|source| StorageError::CorruptCatalog {
        path: path.to_path_buf(),
        source,
    })
}

impl RecordSource for JsonCatalog {
    fn subscribe(&self, callback: SnapshotCallback) -> Subscription {
        let records = self.records.lock();
        self.subscribers.subscribe(callback, Ok(records.clone()))
    }
}

#[async_trait::async_trait]
impl CatalogWriter for JsonCatalog {
    async fn list_ids(&self) -> StoreResult<Vec<String>> {
        Ok(self.records.lock().iter().map(|r| r.id.clone()).collect())
    }

    async fn delete_many(&self, ids: &[String]) -> StoreResult<usize> {
        self.commit(|records| {
            let before = records.len();
            records.retain(|r| !ids.contains(&r.id));
            Ok(before - records.len())
        })
        .await
    }

    async fn insert_many(&self, new_records: &[NewRecord]) -> StoreResult<Vec<String>> {
        let now = Utc::now();
        let inserted: Vec<Record> = new_records
            .iter()
            .cloned()
            .map(|r| r.into_record(Uuid::new_v4().to_string(), now))
            .collect();
        let ids: Vec<String> = inserted.iter().map(|r| r.id.clone()).collect();

        self.commit(move |records| {
            let older = std::mem::replace(records, inserted);
            records.extend(older);
            Ok(())
        })
        .await?;
        Ok(ids)
    }

    async fn update_one(&self, id: &str, update: &NewRecord) -> StoreResult<()> {
        self.commit(|records| {
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| StoreError::record_not_found(id))?;
            record.standard_category = update.standard_category.clone();
            record.issuing_decision_ref = update.issuing_decision_ref.clone();
            record.specialty = update.specialty.clone();
            record.procedure_name = update.procedure_name.clone();
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn new_record(name: &str) -> NewRecord {
        NewRecord::new("QTKT theo chuẩn cũ", "QĐ 1", "Tim mạch", name)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonCatalog::open(dir.path().join("nested").join("catalog.json")).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_writes_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let catalog = JsonCatalog::open(&path).unwrap();
        let ids = catalog
            .insert_many(&[new_record("a"), new_record("b")])
            .await
            .unwrap();
        catalog.insert_many(&[new_record("c")]).await.unwrap();
        catalog.update_one(&ids[1], &new_record("b2")).await.unwrap();
        assert_eq!(catalog.delete_many(&ids[..1]).await.unwrap(), 1);

        let reopened = JsonCatalog::open(&path).unwrap();
        let names: Vec<String> = reopened
            .records()
            .into_iter()
            .map(|r| r.procedure_name)
            .collect();
        assert_eq!(names, vec!["c", "b2"]);
        assert!(reopened.records().iter().all(|r| r.created_at.is_some()));
    }

    #[tokio::test]
    async fn test_update_missing_record_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let catalog = JsonCatalog::open(&path).unwrap();

        let err = catalog
            .update_one("missing", &new_record("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RecordNotFound(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonCatalog::open(&path),
            Err(StorageError::CorruptCatalog { .. })
        ));
    }

    #[tokio::test]
    async fn test_subscribers_receive_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonCatalog::open(dir.path().join("catalog.json")).unwrap();
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&sizes);
        let sub = catalog.subscribe(Box::new(move |result| {
            seen.lock().push(result.map(|r| r.len()).unwrap_or(usize::MAX));
        }));

        catalog.insert_many(&[new_record("a")]).await.unwrap();
        sub.unsubscribe();
        catalog.insert_many(&[new_record("b")]).await.unwrap();

        assert_eq!(*sizes.lock(), vec![0, 1]);
        assert_eq!(catalog.subscriber_count(), 0);
    }
}
