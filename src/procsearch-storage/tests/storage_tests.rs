//! End-to-end tests of the file-backed stores driving the engine.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use procsearch_engine::{
    CatalogFeed, EngineConfig, FeedOrigin, KeyValueStore, MatchMode, RecordCache, SearchSession,
    UploadMode, UploadOptions, parse_csv, upload,
};
use procsearch_storage::{FileStore, JsonCatalog, ProcsearchPaths};
use tokio_util::sync::CancellationToken;

const CSV: &str = "chuanqtkt,qdbanhanh,chuyenkhoa,tenqtkt\n\
                   QTKT theo chuẩn cũ,QĐ 1,Tiêu hóa,Nội soi dạ dày\n\
                   QTKT theo chuẩn mới,QĐ 2,Tim mạch,Siêu âm tim\n\
                   QTKT theo chuẩn mới,QĐ 3,Tiêu hóa,Nội soi đại tràng\n";

#[tokio::test]
async fn test_upload_then_reload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ProcsearchPaths::from_root(dir.path().to_path_buf());
    paths.ensure_dirs().unwrap();

    let report = parse_csv(CSV).unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&paths.cache_dir).unwrap());
    let config = EngineConfig::default();

    {
        let catalog = JsonCatalog::open(&paths.catalog_path).unwrap();
        let cache = RecordCache::new(config.cache.clone()).with_store(store.clone());
        let outcome = upload(
            &catalog,
            &report.records,
            UploadOptions::new(UploadMode::Replace).with_chunk_size(2),
            |_| {},
            &CancellationToken::new(),
            Some(&cache),
        )
        .await
        .unwrap();
        assert_eq!(outcome.inserted, 3);
    }

    // Fresh process: cache miss, catalogue read from disk, snapshot cached.
    let catalog = JsonCatalog::open(&paths.catalog_path).unwrap();
    let feed = CatalogFeed::new(Arc::new(
        RecordCache::new(config.cache.clone()).with_store(store.clone()),
    ));
    assert_eq!(feed.start(&catalog), FeedOrigin::Store);
    assert_eq!(feed.records().len(), 3);
    feed.stop();

    let cached = CatalogFeed::new(Arc::new(
        RecordCache::new(config.cache.clone()).with_store(store.clone()),
    ));
    assert_eq!(cached.start(&catalog), FeedOrigin::Cache);

    let session = SearchSession::restore(&config, store.clone());
    session.set_match_mode(MatchMode::Sequential);
    session.set_search_text("nội soi");
    let records = cached.records();
    let hits: Vec<&str> = session
        .results(&records)
        .iter()
        .map(|r| r.procedure_name.as_str())
        .collect();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|name| name.starts_with("Nội soi")));

    let restored = SearchSession::restore(&config, store);
    assert_eq!(restored.query().search_text, "nội soi");
    assert_eq!(restored.query().match_mode, MatchMode::Sequential);
}
