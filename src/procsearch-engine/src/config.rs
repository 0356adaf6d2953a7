//! Configuration types for the search engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default key under which the record cache is persisted.
pub const DEFAULT_CACHE_KEY: &str = "qtkt_records_cache";

/// Default key under which the session query state is persisted.
pub const DEFAULT_SESSION_KEY: &str = "qtkt_query_state";

/// Default freshness window of the record cache: 24 hours.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Maximum number of writes committed together during a bulk upload.
pub const DEFAULT_UPLOAD_CHUNK_SIZE: usize = 500;

/// Configuration for the search engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Record cache configuration.
    pub cache: CacheConfig,

    /// Key for the session-scoped query state.
    pub session_key: String,

    /// Concrete labels the "old"/"new" category filters resolve to.
    pub category_labels: CategoryLabels,

    /// Number of records per committed chunk during bulk upload.
    pub upload_chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            category_labels: CategoryLabels::default(),
            upload_chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
        }
    }
}

impl EngineConfig {
    /// Creates a builder for constructing a configuration.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parses a configuration from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Configuration for the record cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,

    /// Freshness window in seconds.
    pub ttl_seconds: u64,

    /// Whether to persist the cache through the local key-value store.
    pub persist: bool,

    /// Key of the persisted cache entry.
    pub key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_CACHE_TTL_SECS,
            persist: true,
            key: DEFAULT_CACHE_KEY.to_string(),
        }
    }
}

impl CacheConfig {
    /// Returns the freshness window.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Labels stored in `standard_category` for the two well-known standards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryLabels {
    pub old: String,
    pub new: String,
}

impl Default for CategoryLabels {
    fn default() -> Self {
        Self {
            old: "QTKT theo chuẩn cũ".to_string(),
            new: "QTKT theo chuẩn mới".to_string(),
        }
    }
}

impl CategoryLabels {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Builder for creating `EngineConfig` instances.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Enables or disables caching.
    pub fn enable_cache(mut self, enable: bool) -> Self {
        self.config.cache.enabled = enable;
        self
    }

    /// Sets the cache freshness window in seconds.
    pub fn cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.config.cache.ttl_seconds = ttl_seconds;
        self
    }

    /// Sets whether the cache is persisted.
    pub fn persist_cache(mut self, persist: bool) -> Self {
        self.config.cache.persist = persist;
        self
    }

    /// Sets the persisted cache key.
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.config.cache.key = key.into();
        self
    }

    /// Sets the session state key.
    pub fn session_key(mut self, key: impl Into<String>) -> Self {
        self.config.session_key = key.into();
        self
    }

    /// Sets the category labels.
    pub fn category_labels(mut self, labels: CategoryLabels) -> Self {
        self.config.category_labels = labels;
        self
    }

    /// Sets the upload chunk size. Zero is clamped to one.
    pub fn upload_chunk_size(mut self, size: usize) -> Self {
        self.config.upload_chunk_size = size.max(1);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
