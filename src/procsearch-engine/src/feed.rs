//! Catalogue feed: the record snapshot the search runs against.
//!
//! Loading is cache-first. On a cache hit the feed serves the cached
//! collection and does not subscribe. Otherwise it subscribes to the record
//! source; every delivered snapshot replaces the previous one and is written
//! back to the cache.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::cache::RecordCache;
use crate::ports::{RecordSource, Subscription};
use crate::record::Record;

/// Where the current snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrigin {
    Cache,
    Store,
}

#[derive(Debug)]
struct FeedState {
    records: Arc<[Record]>,
    loading: bool,
    last_error: Option<String>,
    origin: Option<FeedOrigin>,
    generation: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            loading: true,
            last_error: None,
            origin: None,
            generation: 0,
        }
    }
}

impl FeedState {
    fn replace(&mut self, records: Arc<[Record]>, origin: FeedOrigin, error: Option<String>) {
        self.records = records;
        self.loading = false;
        self.last_error = error;
        self.origin = Some(origin);
        self.generation += 1;
    }
}

/// Holds the latest catalogue snapshot.
pub struct CatalogFeed {
    cache: Arc<RecordCache>,
    state: Arc<RwLock<FeedState>>,
    subscription: Mutex<Option<Subscription>>,
}

impl CatalogFeed {
    pub fn new(cache: Arc<RecordCache>) -> Self {
        Self {
            cache,
            state: Arc::new(RwLock::new(FeedState::default())),
            subscription: Mutex::new(None),
        }
    }

    /// Loads the catalogue, from the cache when it is fresh.
    pub fn start(&self, source: &dyn RecordSource) -> FeedOrigin {
        if let Some(records) = self.cache.get() {
            tracing::debug!(records = records.len(), "loaded catalogue from cache");
            self.state.write().replace(records, FeedOrigin::Cache, None);
            return FeedOrigin::Cache;
        }
        self.subscribe(source);
        FeedOrigin::Store
    }

    /// Drops the cache and subscribes to the source again.
    pub fn refresh(&self, source: &dyn RecordSource) {
        self.stop();
        self.cache.invalidate();
        self.state.write().loading = true;
        self.subscribe(source);
    }

    /// Stops receiving snapshots. The current snapshot stays available.
    pub fn stop(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.unsubscribe();
        }
    }

    /// The current snapshot.
    pub fn records(&self) -> Arc<[Record]> {
        Arc::clone(&self.state.read().records)
    }

    /// True until the first snapshot arrives.
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// Message of the last subscription error, cleared by the next good snapshot.
    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    pub fn origin(&self) -> Option<FeedOrigin> {
        self.state.read().origin
    }

    /// Number of snapshots received so far.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().is_some()
    }

    fn subscribe(&self, source: &dyn RecordSource) {
        let state = Arc::clone(&self.state);
        let cache = Arc::clone(&self.cache);
        let subscription = source.subscribe(Box::new(move |result| match result {
            Ok(records) => {
                tracing::debug!(records = records.len(), "received catalogue snapshot");
                let records: Arc<[Record]> = records.into();
                cache.put(Arc::clone(&records));
                state.write().replace(records, FeedOrigin::Store, None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalogue subscription failed");
                state
                    .write()
                    .replace(Arc::from(Vec::new()), FeedOrigin::Store, Some(e.to_string()));
            }
        }));
        *self.subscription.lock() = Some(subscription);
    }
}

impl Drop for CatalogFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CatalogFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogFeed")
            .field("records", &self.state.read().records.len())
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::memory::MemoryCatalog;
    use crate::ports::CatalogWriter;
    use crate::record::NewRecord;
    use std::time::Duration;

    fn record(id: &str) -> Record {
        NewRecord::new("old", "QĐ", "Tim mạch", format!("procedure {id}"))
            .into_record(id, chrono::Utc::now())
    }

    #[test]
    fn test_cache_hit_skips_subscription() {
        let cache = Arc::new(RecordCache::with_defaults());
        cache.put(vec![record("cached")]);
        let catalog = MemoryCatalog::with_records(vec![record("a"), record("b")]);

        let feed = CatalogFeed::new(cache);
        assert!(feed.is_loading());
        assert_eq!(feed.start(&catalog), FeedOrigin::Cache);
        assert!(!feed.is_loading());
        assert_eq!(feed.records().len(), 1);
        assert!(!feed.is_subscribed());
        assert_eq!(catalog.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_miss_subscribes_and_caches() {
        let cache = Arc::new(RecordCache::with_defaults());
        let catalog = MemoryCatalog::with_records(vec![record("a")]);

        let feed = CatalogFeed::new(cache.clone());
        assert_eq!(feed.start(&catalog), FeedOrigin::Store);
        assert_eq!(feed.records().len(), 1);
        assert_eq!(cache.get().map(|r| r.len()), Some(1));

        catalog
            .insert_many(&[NewRecord::new("new", "QĐ", "Nhi", "procedure c")])
            .await
            .unwrap();
        assert_eq!(feed.records().len(), 2);
        assert_eq!(feed.records()[0].procedure_name, "procedure c");
        assert_eq!(feed.generation(), 2);
        assert_eq!(cache.get().map(|r| r.len()), Some(2));
    }

    #[test]
    fn test_expired_cache_falls_back_to_store() {
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(RecordCache::with_defaults().with_clock(clock.clone()));
        cache.put(vec![record("stale")]);
        clock.advance(Duration::from_secs(25 * 60 * 60));

        let catalog = MemoryCatalog::with_records(vec![record("a"), record("b")]);
        let feed = CatalogFeed::new(cache);
        assert_eq!(feed.start(&catalog), FeedOrigin::Store);
        assert_eq!(feed.records().len(), 2);
    }

    #[test]
    fn test_subscription_error_publishes_empty_snapshot() {
        let cache = Arc::new(RecordCache::with_defaults());
        let catalog = MemoryCatalog::with_records(vec![record("a")]);
        let feed = CatalogFeed::new(cache.clone());
        feed.start(&catalog);

        catalog.set_offline(true);
        assert!(feed.records().is_empty());
        assert!(feed.last_error().is_some());
        assert!(!feed.is_loading());
        // the good snapshot stays cached
        assert_eq!(cache.get().map(|r| r.len()), Some(1));

        catalog.set_offline(false);
        assert_eq!(feed.records().len(), 1);
        assert!(feed.last_error().is_none());
    }

    #[test]
    fn test_stop_and_drop_unsubscribe() {
        let catalog = MemoryCatalog::new();
        let feed = CatalogFeed::new(Arc::new(RecordCache::with_defaults()));
        feed.start(&catalog);
        assert_eq!(catalog.subscriber_count(), 1);
        feed.stop();
        assert_eq!(catalog.subscriber_count(), 0);

        feed.refresh(&catalog);
        assert_eq!(catalog.subscriber_count(), 1);
        drop(feed);
        assert_eq!(catalog.subscriber_count(), 0);
    }
}
