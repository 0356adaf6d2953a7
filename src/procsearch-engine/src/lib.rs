#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::uninlined_format_args
)]
//! Procsearch Engine - text matching and result pipeline for the procedure catalogue.
//!
//! Staff search a catalogue of procedure records by procedure name, specialty
//! and standard category. This crate holds everything between the store and
//! the screen:
//!
//! - Case-insensitive matching in three modes: flexible (every word, any
//!   order), sequential (every word, in order) and exact (one phrase)
//! - Highlight spans for matched words, in char offsets
//! - A stable filter pipeline and a three-state column sort
//! - A record cache with a freshness window, persisted through a key-value port
//! - Session query state with optional instant search
//! - CSV import and chunked, cancellable bulk upload
//!
//! Storage is reached only through the traits in [`ports`]; the in-memory
//! implementations in [`memory`] back the tests.
//!
//! # Example
//!
//! ```
//! use procsearch_engine::{CategoryLabels, MatchMode, QueryState, Record, filter, highlight};
//!
//! let records: Vec<Record> = serde_json::from_str(
//!     r#"[{"id":"1","chuanqtkt":"QTKT theo chuẩn cũ","qdbanhanh":"QĐ 1",
//!          "chuyenkhoa":"Tiêu hóa","tenqtkt":"Nội soi dạ dày"}]"#,
//! ).unwrap();
//!
//! let query = QueryState::new()
//!     .with_search_text("dạ dày")
//!     .with_match_mode(MatchMode::Sequential);
//! let hits = filter(&records, &query, &CategoryLabels::default());
//! assert_eq!(hits.len(), 1);
//!
//! let marked = highlight(&hits[0].procedure_name, &query.search_text, "[", "]");
//! assert_eq!(marked, "Nội soi [dạ] [dày]");
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod filter;
pub mod highlight;
pub mod import;
pub mod matcher;
pub mod memory;
pub mod normalize;
pub mod ports;
pub mod query;
pub mod record;
pub mod session;
pub mod sort;
pub mod upload;

pub use cache::{CacheEntry, CacheStats, Clock, ManualClock, RecordCache, SystemClock};
pub use config::{CacheConfig, CategoryLabels, EngineConfig, EngineConfigBuilder};
pub use error::{ImportError, StoreError, StoreResult, UploadError};
pub use feed::{CatalogFeed, FeedOrigin};
pub use filter::{RecordFilter, filter, filter_owned};
pub use highlight::{Span, compute_spans, highlight, render};
pub use import::{ImportReport, REQUIRED_COLUMNS, SkippedRow, parse_csv};
pub use matcher::{MatchMode, Pattern, matches};
pub use memory::{MemoryCatalog, MemoryStore};
pub use normalize::tokenize;
pub use ports::{CatalogWriter, KeyValueStore, RecordSource, SnapshotCallback, Subscription};
pub use query::{CategoryFilter, QueryState};
pub use record::{NewRecord, Record, RecordField};
pub use session::SearchSession;
pub use sort::{SortDirection, SortState};
pub use upload::{
    UploadMode, UploadOptions, UploadOutcome, UploadPhase, UploadProgress, create_record,
    delete_record, edit_record, upload,
};
