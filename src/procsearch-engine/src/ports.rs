//! Storage ports.
//!
//! The engine never talks to a concrete database. It reads snapshots from a
//! [`RecordSource`], writes through a [`CatalogWriter`] and keeps small
//! string values (cache entries, session state) in a [`KeyValueStore`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::record::{NewRecord, Record};

/// Callback receiving every snapshot of the catalogue, newest record first.
pub type SnapshotCallback = Box<dyn Fn(StoreResult<Vec<Record>>) + Send + Sync>;

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. A missing key is `Ok(None)`.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deletes a value. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;
}

/// A live view of the catalogue.
pub trait RecordSource: Send + Sync {
    /// Registers `callback` for catalogue snapshots.
    ///
    /// The current snapshot is delivered once immediately, then again after
    /// every change. Delivery stops when the returned subscription is dropped.
    fn subscribe(&self, callback: SnapshotCallback) -> Subscription;
}

/// Write access to the catalogue.
///
/// Each call is committed on its own; a failed call leaves earlier calls in place.
#[async_trait::async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Lists the ids of every stored record.
    async fn list_ids(&self) -> StoreResult<Vec<String>>;

    /// Deletes the given records and returns how many existed.
    async fn delete_many(&self, ids: &[String]) -> StoreResult<usize>;

    /// Inserts records, assigning ids and creation times. Returns the new ids.
    async fn insert_many(&self, records: &[NewRecord]) -> StoreResult<Vec<String>>;

    /// Replaces the text fields of one record.
    async fn update_one(&self, id: &str, record: &NewRecord) -> StoreResult<()>;
}

/// Handle to an active [`RecordSource`] subscription.
#[must_use = "dropping a subscription stops snapshot delivery"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a subscription that runs `cancel` when it ends.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Stops delivery now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type SharedCallback = Arc<dyn Fn(StoreResult<Vec<Record>>) + Send + Sync>;

#[derive(Default)]
struct SubscriberList {
    next_id: u64,
    callbacks: Vec<(u64, SharedCallback)>,
}

/// Subscriber registry shared by record source implementations.
#[derive(Clone, Default)]
pub struct Subscribers {
    inner: Arc<Mutex<SubscriberList>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback`, delivers `initial` to it, and returns the handle.
    pub fn subscribe(
        &self,
        callback: SnapshotCallback,
        initial: StoreResult<Vec<Record>>,
    ) -> Subscription {
        let callback: SharedCallback = Arc::from(callback);
        let id = {
            let mut list = self.inner.lock();
            let id = list.next_id;
            list.next_id += 1;
            list.callbacks.push((id, Arc::clone(&callback)));
            id
        };

        callback(initial);

        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.lock().callbacks.retain(|(cid, _)| *cid != id);
            }
        })
    }

    /// Delivers a copy of `snapshot` to every subscriber.
    pub fn publish(&self, snapshot: &[Record]) {
        for callback in self.snapshot_callbacks() {
            callback(Ok(snapshot.to_vec()));
        }
    }

    /// Delivers an error built by `make_error` to every subscriber.
    pub fn publish_error(&self, make_error: impl Fn() -> StoreError) {
        for callback in self.snapshot_callbacks() {
            callback(Err(make_error()));
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.inner.lock().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Callbacks run without the lock held so they may unsubscribe.
    fn snapshot_callbacks(&self) -> Vec<SharedCallback> {
        self.inner
            .lock()
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect()
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.len())
            .finish()
    }
}
