//! Cache management command.
//!
//! Shows the state of the persisted record cache and clears it.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;

use crate::cli::GlobalArgs;
use crate::context::AppContext;
use crate::styled_output::{MessageType, print_info, print_success, styled_label};

/// Cache CLI command.
#[derive(Debug, Parser)]
pub struct CacheCli {
    #[command(subcommand)]
    pub subcommand: Option<CacheSubcommand>,
}

/// Cache subcommands.
#[derive(Debug, clap::Subcommand)]
pub enum CacheSubcommand {
    /// Show cache information
    #[command(visible_alias = "info")]
    Show(CacheShowArgs),

    /// Drop the cached catalogue
    Clear(CacheClearArgs),
}

/// Arguments for cache show command.
#[derive(Debug, Parser)]
pub struct CacheShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for cache clear command.
#[derive(Debug, Parser)]
pub struct CacheClearArgs {
    /// Show what would be cleared without clearing it
    #[arg(long)]
    pub dry_run: bool,
}

/// Cache status.
#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub enabled: bool,
    pub key: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub size_human: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub age_seconds: Option<i64>,
    pub ttl_seconds: u64,
    pub fresh: bool,
    pub records: usize,
}

impl CacheStatus {
    /// Reads the cache state from the context.
    pub fn collect(ctx: &AppContext) -> Result<Self> {
        let config = ctx.cache.config();
        let path = ctx.store.path_for(&config.key)?;
        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let fetched_at = ctx.cache.fetched_at();
        let cached = ctx.cache.get();

        Ok(Self {
            enabled: ctx.cache.is_enabled(),
            key: config.key.clone(),
            size_human: format_size(size_bytes),
            path,
            size_bytes,
            fetched_at,
            age_seconds: fetched_at.map(|at| (Utc::now() - at).num_seconds()),
            ttl_seconds: config.ttl_seconds,
            fresh: cached.is_some(),
            records: cached.map_or(0, |records| records.len()),
        })
    }
}

/// Format bytes as human-readable string.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn format_age(seconds: i64) -> String {
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h {}m", s / 3600, (s % 3600) / 60),
        s => format!("{}d {}h", s / 86_400, (s % 86_400) / 3600),
    }
}

impl CacheCli {
    /// Run the cache command.
    pub async fn run(self, global: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(global)?;
        match self.subcommand {
            None => run_show(&ctx, CacheShowArgs { json: false }),
            Some(CacheSubcommand::Show(args)) => run_show(&ctx, args),
            Some(CacheSubcommand::Clear(args)) => run_clear(&ctx, args),
        }
    }
}

fn run_show(ctx: &AppContext, args: CacheShowArgs) -> Result<()> {
    let status = CacheStatus::collect(ctx)?;
    let mut stdout = std::io::stdout().lock();

    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &status)?;
        writeln!(stdout)?;
        return Ok(());
    }

    let state = match (status.enabled, status.fetched_at, status.fresh) {
        (false, _, _) => styled_label(MessageType::Dim, "disabled"),
        (true, None, _) => styled_label(MessageType::Dim, "empty"),
        (true, Some(_), true) => styled_label(MessageType::Success, "fresh"),
        (true, Some(_), false) => styled_label(MessageType::Warning, "stale"),
    };
    writeln!(stdout, "Cache:     {state}")?;
    writeln!(stdout, "Location:  {}", status.path.display())?;
    writeln!(stdout, "Size:      {}", status.size_human)?;
    if let (Some(at), Some(age)) = (status.fetched_at, status.age_seconds) {
        writeln!(
            stdout,
            "Fetched:   {} ({} ago)",
            at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_age(age.max(0))
        )?;
    }
    writeln!(stdout, "Window:    {}", format_age(status.ttl_seconds as i64))?;
    if status.fresh {
        writeln!(stdout, "Records:   {}", status.records)?;
    }
    Ok(())
}

fn run_clear(ctx: &AppContext, args: CacheClearArgs) -> Result<()> {
    let path = ctx.store.path_for(&ctx.cache.config().key)?;
    if args.dry_run {
        print_info(&format!("Would clear {}", path.display()));
        return Ok(());
    }
    ctx.cache.invalidate();
    print_success("Cache cleared");
    Ok(())
}
