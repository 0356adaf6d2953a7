//! Shared command context: configuration, data paths and opened stores.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use procsearch_engine::{CatalogFeed, EngineConfig, KeyValueStore, RecordCache, SearchSession};
use procsearch_storage::{FileStore, JsonCatalog, ProcsearchPaths};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::GlobalArgs;

/// Default number of rows printed by `search` and `list`.
pub const DEFAULT_LIMIT: usize = 50;

/// Contents of `config.toml`.
///
/// Engine settings sit at the top level; CLI-only settings live in
/// `[display]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,

    pub display: DisplayConfig,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rows printed when `--limit` is not given.
    pub limit: usize,

    /// Highlight matches on a terminal.
    pub highlight: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            highlight: true,
        }
    }
}

impl CliConfig {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. The default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => match procsearch_storage::config_file() {
                Ok(path) => (path, false),
                Err(e) => {
                    debug!(error = %e, "no config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read config {}", path.display()));
            }
        };
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Everything a command needs to reach the catalogue.
pub struct AppContext {
    pub config: CliConfig,
    pub paths: ProcsearchPaths,
    pub store: Arc<FileStore>,
    pub catalog: Arc<JsonCatalog>,
    pub cache: Arc<RecordCache>,
}

impl AppContext {
    /// Loads the configuration and opens the stores.
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let config = CliConfig::load(global.config.as_deref())?;
        let paths = match &global.data_dir {
            Some(dir) => ProcsearchPaths::from_root(dir.clone()),
            None => ProcsearchPaths::new().context("Failed to locate the data directory")?,
        };
        Self::with_paths(config, paths)
    }

    /// Opens the stores under `paths`.
    pub fn with_paths(config: CliConfig, paths: ProcsearchPaths) -> Result<Self> {
        paths.ensure_dirs().with_context(|| {
            format!("Failed to create data directory {}", paths.data_dir.display())
        })?;

        let store = Arc::new(FileStore::open(&paths.cache_dir)?);
        let catalog = Arc::new(
            JsonCatalog::open(&paths.catalog_path).with_context(|| {
                format!("Failed to open catalogue {}", paths.catalog_path.display())
            })?,
        );
        let persisted: Arc<dyn KeyValueStore> = store.clone();
        let cache = Arc::new(RecordCache::new(config.engine.cache.clone()).with_store(persisted));
        debug!(data_dir = %paths.data_dir.display(), "context opened");

        Ok(Self {
            config,
            paths,
            store,
            catalog,
            cache,
        })
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.config.engine
    }

    /// Starts a feed over the catalogue, served from the cache when fresh.
    pub fn feed(&self) -> CatalogFeed {
        let feed = CatalogFeed::new(self.cache.clone());
        let origin = feed.start(self.catalog.as_ref());
        debug!(?origin, records = feed.records().len(), "catalogue loaded");
        feed
    }

    /// The persisted search session.
    pub fn session(&self) -> Result<SearchSession> {
        let store = FileStore::open(&self.paths.session_dir)?;
        Ok(SearchSession::restore(self.engine(), Arc::new(store)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_from_toml() {
        let config = CliConfig::from_toml_str(
            r#"
            upload_chunk_size = 200

            [cache]
            ttl_seconds = 60

            [category_labels]
            old = "cũ"
            new = "mới"

            [display]
            limit = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.upload_chunk_size, 200);
        assert_eq!(config.engine.cache.ttl_seconds, 60);
        assert!(config.engine.cache.persist);
        assert_eq!(config.engine.category_labels.old, "cũ");
        assert_eq!(config.display.limit, 5);
        assert!(config.display.highlight);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(CliConfig::from_toml_str("").unwrap(), CliConfig::default());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_context_opens_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProcsearchPaths::from_root(dir.path().join("data"));
        let ctx = AppContext::with_paths(CliConfig::default(), paths).unwrap();
        assert!(ctx.paths.cache_dir.is_dir());
        assert!(ctx.catalog.is_empty());
        assert!(ctx.feed().records().is_empty());
    }
}
