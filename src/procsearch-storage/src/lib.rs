//! Procsearch Storage - OS-aware, file-backed storage for procsearch.
//!
//! Data lives in a per-user directory:
//!
//! - **Windows**: `%APPDATA%\Procsearch\`
//! - **macOS**: `~/Library/Application Support/Procsearch/`
//! - **Linux**: `~/.local/share/Procsearch/`
//!
//! # Features
//!
//! - Automatic OS detection for storage paths
//! - [`FileStore`], a key-value store for the record cache and session state
//! - [`JsonCatalog`], a catalogue kept in one JSON file with live snapshots
//! - Atomic, fsynced file replacement
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use procsearch_engine::{CatalogFeed, EngineConfig, RecordCache};
//! use procsearch_storage::{FileStore, JsonCatalog, ProcsearchPaths};
//!
//! fn main() -> procsearch_storage::Result<()> {
//!     let paths = ProcsearchPaths::new()?;
//!     paths.ensure_dirs()?;
//!
//!     let store = Arc::new(FileStore::open(&paths.cache_dir)?);
//!     let cache = RecordCache::new(EngineConfig::default().cache).with_store(store);
//!     let catalog = JsonCatalog::open(&paths.catalog_path)?;
//!
//!     let feed = CatalogFeed::new(Arc::new(cache));
//!     feed.start(&catalog);
//!     println!("{} procedures", feed.records().len());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod fsutil;
pub mod kv;
pub mod paths;

// Re-export main types at crate root
pub use catalog::JsonCatalog;
pub use error::{Result, StorageError};
pub use kv::FileStore;
pub use paths::{ProcsearchPaths, config_file, procsearch_config_dir, procsearch_data_dir};
