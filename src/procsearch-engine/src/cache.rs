//! Record cache with a freshness window and optional persistence.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::ports::KeyValueStore;
use crate::record::Record;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        let mut now = self.now.lock();
        if let Some(next) = now.checked_add_signed(delta) {
            *now = next;
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Persisted form of a cached collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "data")]
    pub records: Vec<Record>,

    /// When the collection was fetched, as milliseconds since the epoch.
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Returns true when the entry is older than `ttl` at `now`.
    ///
    /// An entry stamped in the future counts as fresh.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        is_stale(self.fetched_at, now, ttl)
    }
}

fn is_stale(fetched_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    match (now - fetched_at).to_std() {
        Ok(elapsed) => elapsed > ttl,
        Err(_) => false,
    }
}

#[derive(Debug, Clone)]
struct Cached {
    records: Arc<[Record]>,
    fetched_at: DateTime<Utc>,
}

/// Cache of the last fetched record collection.
pub struct RecordCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    persistent: Option<Arc<dyn KeyValueStore>>,
    entry: RwLock<Option<Cached>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RecordCache {
    /// Creates an in-memory cache using the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            persistent: None,
            entry: RwLock::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a cache with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Uses `clock` for timestamps and freshness checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Persists entries through `store` when persistence is enabled.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        if self.config.persist {
            self.persistent = Some(store);
        }
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the cached collection if it is fresh and non-empty.
    pub fn get(&self) -> Option<Arc<[Record]>> {
        if !self.config.enabled {
            return None;
        }

        let now = self.clock.now();
        let ttl = self.config.ttl();

        let in_memory = self.entry.read().clone();
        match in_memory.or_else(|| self.load_persisted()) {
            Some(cached) if !cached.records.is_empty() && !is_stale(cached.fetched_at, now, ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(records = cached.records.len(), "record cache hit");
                Some(cached.records)
            }
            Some(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("record cache stale or empty");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("record cache miss");
                None
            }
        }
    }

    /// Stores `records` stamped with the current time, replacing any entry.
    pub fn put(&self, records: impl Into<Arc<[Record]>>) {
        if !self.config.enabled {
            return;
        }

        let cached = Cached {
            records: records.into(),
            fetched_at: self.clock.now(),
        };

        if let Some(store) = &self.persistent {
            let entry = CacheEntry {
                records: cached.records.to_vec(),
                fetched_at: cached.fetched_at,
            };
            let written = serde_json::to_string(&entry)
                .map_err(Into::into)
                .and_then(|json| store.write(&self.config.key, &json));
            if let Err(e) = written {
                tracing::warn!(error = %e, key = %self.config.key, "failed to persist record cache");
            }
        }

        *self.entry.write() = Some(cached);
    }

    /// Drops the cached entry from memory and from the persistent store.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
        if let Some(store) = &self.persistent
            && let Err(e) = store.delete(&self.config.key)
        {
            tracing::warn!(error = %e, key = %self.config.key, "failed to delete persisted record cache");
        }
        tracing::debug!("record cache invalidated");
    }

    /// When the current entry was fetched, fresh or not.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        let in_memory = self.entry.read().as_ref().map(|c| c.fetched_at);
        in_memory.or_else(|| self.load_persisted().map(|c| c.fetched_at))
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        CacheStats {
            records: self.entry.read().as_ref().map_or(0, |c| c.records.len()),
            hits,
            misses,
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
        }
    }

    // Unreadable or corrupt data is treated as absent.
    fn load_persisted(&self) -> Option<Cached> {
        let store = self.persistent.as_ref()?;
        let raw = match store.read(&self.config.key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::debug!(error = %e, "could not read persisted record cache");
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring corrupt persisted record cache");
                return None;
            }
        };

        let cached = Cached {
            records: entry.records.into(),
            fetched_at: entry.fetched_at,
        };
        *self.entry.write() = Some(cached.clone());
        Some(cached)
    }
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache")
            .field("config", &self.config)
            .field("persistent", &self.persistent.is_some())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of records held in memory.
    pub records: usize,

    /// Number of cache hits.
    pub hits: u64,

    /// Number of cache misses.
    pub misses: u64,

    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn record(id: &str) -> Record {
        Record {
            id: id.to_string(),
            standard_category: String::new(),
            issuing_decision_ref: String::new(),
            specialty: String::new(),
            procedure_name: format!("procedure {id}"),
            created_at: None,
        }
    }

    fn cache_with_clock() -> (RecordCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = RecordCache::with_defaults().with_clock(clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_put_then_get_hits() {
        let (cache, _) = cache_with_clock();
        assert!(cache.get().is_none());

        cache.put(vec![record("1"), record("2")]);
        let records = cache.get().expect("fresh entry");
        assert_eq!(records.len(), 2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_freshness_window() {
        let (cache, clock) = cache_with_clock();
        cache.put(vec![record("1")]);

        clock.advance(Duration::from_secs(24 * 60 * 60));
        assert!(cache.get().is_some(), "exactly at the window is still fresh");

        clock.advance(Duration::from_millis(1));
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_empty_collection_is_a_miss() {
        let (cache, _) = cache_with_clock();
        cache.put(Vec::<Record>::new());
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let now = Utc::now();
        let entry = CacheEntry {
            records: vec![record("1")],
            fetched_at: now + chrono::Duration::hours(1),
        };
        assert!(!entry.is_stale(now, Duration::from_secs(60)));
    }

    #[test]
    fn test_invalidate() {
        let (cache, _) = cache_with_clock();
        cache.put(vec![record("1")]);
        cache.invalidate();
        assert!(cache.get().is_none());
        assert!(cache.fetched_at().is_none());
    }

    #[test]
    fn test_disabled_cache() {
        let cache = RecordCache::new(CacheConfig {
            enabled: false,
            ..Default::default()
        });
        cache.put(vec![record("1")]);
        assert!(cache.get().is_none());
        assert_eq!(cache.stats().records, 0);
    }

    #[test]
    fn test_persisted_entry_survives_new_cache() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());

        let first = RecordCache::with_defaults()
            .with_clock(clock.clone())
            .with_store(store.clone());
        first.put(vec![record("1")]);

        let raw = store.read("qtkt_records_cache").unwrap().expect("persisted");
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["data"].is_array());
        assert!(value["timestamp"].is_i64());

        let second = RecordCache::with_defaults()
            .with_clock(clock.clone())
            .with_store(store.clone());
        assert_eq!(second.get().map(|r| r.len()), Some(1));

        second.invalidate();
        assert!(store.read("qtkt_records_cache").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_persisted_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store.write("qtkt_records_cache", "{not json").unwrap();

        let cache = RecordCache::with_defaults().with_store(store);
        assert!(cache.get().is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_persistence_disabled_ignores_store() {
        let store = Arc::new(MemoryStore::new());
        let cache = RecordCache::new(CacheConfig {
            persist: false,
            ..Default::default()
        })
        .with_store(store.clone());

        cache.put(vec![record("1")]);
        assert!(store.read("qtkt_records_cache").unwrap().is_none());
    }
}
