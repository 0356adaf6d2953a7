//! In-memory implementations of the storage ports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::ports::{
    CatalogWriter, KeyValueStore, RecordSource, SnapshotCallback, Subscribers, Subscription,
};
use crate::record::{NewRecord, Record};

/// A [`KeyValueStore`] backed by a hash map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// An in-memory catalogue, kept newest first.
///
/// Snapshots are published while the catalogue lock is held, so subscriber
/// callbacks must not call back into the catalogue.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    records: Mutex<Vec<Record>>,
    subscribers: Subscribers,
    offline: AtomicBool,
    insert_budget: Mutex<Option<usize>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalogue holding `records` in the given order.
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
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

    /// Simulates losing the connection: subscribers receive an error and
    /// every write fails until the catalogue is back online.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        let records = self.records.lock();
        if offline {
            self.subscribers
                .publish_error(|| StoreError::backend("catalogue is offline"));
        } else {
            self.subscribers.publish(&records);
        }
    }

    /// Lets the next `calls` insert calls succeed, then fails every later one.
    pub fn fail_inserts_after(&self, calls: usize) {
        *self.insert_budget.lock() = Some(calls);
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::backend("catalogue is offline"));
        }
        Ok(())
    }
}

impl RecordSource for MemoryCatalog {
    fn subscribe(&self, callback: SnapshotCallback) -> Subscription {
        let records = self.records.lock();
        let initial = match self.ensure_online() {
            Ok(()) => Ok(records.clone()),
            Err(e) => Err(e),
        };
        self.subscribers.subscribe(callback, initial)
    }
}

#[async_trait::async_trait]
impl CatalogWriter for MemoryCatalog {
    async fn list_ids(&self) -> StoreResult<Vec<String>> {
        self.ensure_online()?;
        Ok(self.records.lock().iter().map(|r| r.id.clone()).collect())
    }

    async fn delete_many(&self, ids: &[String]) -> StoreResult<usize> {
        self.ensure_online()?;
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| !ids.contains(&r.id));
        let deleted = before - records.len();
        self.subscribers.publish(&records);
        Ok(deleted)
    }

    async fn insert_many(&self, new_records: &[NewRecord]) -> StoreResult<Vec<String>> {
        self.ensure_online()?;
        {
            let mut budget = self.insert_budget.lock();
            match budget.as_mut() {
                Some(0) => return Err(StoreError::backend("insert rejected")),
                Some(remaining) => *remaining -= 1,
                None => {}
            }
        }

        let now = Utc::now();
        let inserted: Vec<Record> = new_records
            .iter()
            .cloned()
            .map(|r| r.into_record(Uuid::new_v4().to_string(), now))
            .collect();
        let ids = inserted.iter().map(|r| r.id.clone()).collect();

        let mut records = self.records.lock();
        let older = std::mem::replace(&mut *records, inserted);
        records.extend(older);
        self.subscribers.publish(&records);
        Ok(ids)
    }

    async fn update_one(&self, id: &str, update: &NewRecord) -> StoreResult<()> {
        self.ensure_online()?;
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::record_not_found(id))?;
        record.standard_category = update.standard_category.clone();
        record.issuing_decision_ref = update.issuing_decision_ref.clone();
        record.specialty = update.specialty.clone();
        record.procedure_name = update.procedure_name.clone();
        self.subscribers.publish(&records);
        Ok(())
    }
}
