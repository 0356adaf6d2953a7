//! Command-level tests against a temporary data directory.

use clap::Parser;
use pretty_assertions::assert_eq;
use procsearch_cli::cli::{Cli, Commands};
use procsearch_cli::context::{AppContext, CliConfig};
use procsearch_cli::record_cmd::{AddCli, EditCli};
use procsearch_cli::search_cmd::SearchCli;
use procsearch_engine::{
    FeedOrigin, MatchMode, UploadMode, UploadOptions, create_record, delete_record, edit_record,
    parse_csv, upload,
};
use procsearch_storage::ProcsearchPaths;
use tokio_util::sync::CancellationToken;

const CSV: &str = "chuanqtkt,qdbanhanh,chuyenkhoa,tenqtkt\n\
                   QTKT theo chuẩn cũ,QĐ 1,Tiêu hóa,Nội soi dạ dày\n\
                   QTKT theo chuẩn mới,QĐ 2,Tim mạch,Siêu âm tim\n\
                   QTKT theo chuẩn mới,QĐ 3,Tiêu hóa,\"Nội soi đại tràng, sinh thiết\"\n\
                   broken row\n";

fn open(dir: &tempfile::TempDir) -> AppContext {
    let paths = ProcsearchPaths::from_root(dir.path().to_path_buf());
    AppContext::with_paths(CliConfig::default(), paths).unwrap()
}

async fn import(ctx: &AppContext) {
    let report = parse_csv(CSV).unwrap();
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.skipped.len(), 1);

    let mut phases = Vec::new();
    upload(
        ctx.catalog.as_ref(),
        &report.records,
        UploadOptions::from_config(ctx.engine(), UploadMode::Replace),
        |p| phases.push(p.phase),
        &CancellationToken::new(),
        Some(ctx.cache.as_ref()),
    )
    .await
    .unwrap();
    assert!(!phases.is_empty());
}

fn search(ctx: &AppContext, args: &[&str]) -> Vec<String> {
    let mut argv = vec!["search"];
    argv.extend_from_slice(args);
    let cli = SearchCli::try_parse_from(argv).unwrap();

    let feed = ctx.feed();
    let session = ctx.session().unwrap();
    cli.apply_to(&session);
    let records = feed.records();
    let mut matched = session.results(&records);
    cli.sort.state().apply(&mut matched);
    matched.iter().map(|r| r.procedure_name.clone()).collect()
}

#[tokio::test]
async fn test_import_then_search() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = open(&dir);
    import(&ctx).await;

    assert_eq!(
        search(&ctx, &["soi", "nội", "--sort", "procedure-name"]),
        vec!["Nội soi dạ dày", "Nội soi đại tràng, sinh thiết"]
    );
    assert!(search(&ctx, &["soi", "nội", "--mode", "sequential"]).is_empty());
    assert_eq!(
        search(&ctx, &["--category", "new", "-s", "tiêu"]),
        vec!["Nội soi đại tràng, sinh thiết"]
    );
}

#[tokio::test]
async fn test_saved_query_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    import(&open(&dir)).await;

    let first = open(&dir);
    search(&first, &["siêu", "âm", "--mode", "exact"]);
    drop(first);

    let second = open(&dir);
    let query = second.session().unwrap().query();
    assert_eq!(query.search_text, "siêu âm");
    assert_eq!(query.match_mode, MatchMode::Exact);
    assert_eq!(search(&second, &["--last"]), vec!["Siêu âm tim"]);
}

#[tokio::test]
async fn test_second_process_reads_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    import(&open(&dir)).await;

    let first = open(&dir).feed();
    assert_eq!(first.origin(), Some(FeedOrigin::Store));
    first.stop();

    let second = open(&dir).feed();
    assert_eq!(second.origin(), Some(FeedOrigin::Cache));
    assert_eq!(second.records().len(), 3);
}

#[tokio::test]
async fn test_edit_and_delete_invalidate_cache() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = open(&dir);
    import(&ctx).await;
    ctx.feed().stop();
    assert!(ctx.cache.get().is_some());

    let target = ctx
        .catalog
        .records()
        .into_iter()
        .find(|r| r.procedure_name == "Siêu âm tim")
        .unwrap();
    let edit = EditCli::try_parse_from([
        "edit",
        target.id.as_str(),
        "--name",
        "Siêu âm tim qua thực quản",
    ])
    .unwrap();
    edit_record(ctx.catalog.as_ref(), &target.id, &edit.merge(&target), Some(ctx.cache.as_ref()))
        .await
        .unwrap();
    assert!(ctx.cache.get().is_none());
    assert_eq!(search(&ctx, &["thực", "quản"]), vec!["Siêu âm tim qua thực quản"]);

    delete_record(ctx.catalog.as_ref(), &target.id, Some(ctx.cache.as_ref()))
        .await
        .unwrap();
    assert_eq!(ctx.catalog.len(), 2);
    assert!(delete_record(ctx.catalog.as_ref(), &target.id, None).await.is_err());
}

#[tokio::test]
async fn test_add_invalidates_cache() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = open(&dir);
    import(&ctx).await;
    ctx.feed().stop();
    assert!(ctx.cache.get().is_some());

    let cli = Cli::try_parse_from([
        "procsearch",
        "add",
        "--specialty",
        "Nhi",
        "--name",
        "Khám sàng lọc sơ sinh",
    ])
    .unwrap();
    let Commands::Add(add) = cli.command else {
        panic!("expected add command");
    };
    let id = create_record(ctx.catalog.as_ref(), &add.to_record(), Some(ctx.cache.as_ref()))
        .await
        .unwrap();
    assert!(ctx.cache.get().is_none());
    assert_eq!(ctx.catalog.len(), 4);
    assert!(ctx.catalog.records().iter().any(|r| r.id == id));
    assert_eq!(search(&ctx, &["sàng", "lọc"]), vec!["Khám sàng lọc sơ sinh"]);

    assert!(AddCli::try_parse_from(["add", "--name", " "]).is_err());
}

#[test]
fn test_data_dir_flag_reaches_context() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("custom");
    let cli = Cli::try_parse_from([
        "procsearch",
        "--data-dir",
        root.to_str().unwrap(),
        "cache",
        "show",
        "--json",
    ])
    .unwrap();
    assert!(matches!(cli.command, Commands::Cache(_)));

    let ctx = AppContext::open(&cli.global).unwrap();
    assert_eq!(ctx.paths.data_dir, root);
    assert!(ctx.paths.catalog_path.starts_with(&root));
}
