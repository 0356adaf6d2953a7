//! Procsearch CLI - Main entry point.
//!
//! The CLI is structured as follows:
//! - `cli/` - Command-line argument parsing and dispatch
//! - `*_cmd.rs` - Individual command implementations

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use procsearch_cli::cli::{Cli, GlobalArgs, LogLevel, dispatch_command};
use procsearch_cli::styled_output::{print_error, set_color_mode};

/// Environment variable overriding `--log-level`.
const LOG_LEVEL_ENV: &str = "PROCSEARCH_LOG_LEVEL";

/// Guard that flushes the log file when dropped.
struct LogFileGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

fn resolve_log_level(global: &GlobalArgs) -> LogLevel {
    if global.trace {
        LogLevel::Trace
    } else if global.verbose {
        LogLevel::Debug
    } else if let Ok(env_level) = std::env::var(LOG_LEVEL_ENV) {
        LogLevel::from_str_loose(&env_level).unwrap_or(global.log_level)
    } else {
        global.log_level
    }
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_filter_str();
        EnvFilter::new(format!(
            "error,procsearch={level},procsearch_cli={level},procsearch_engine={level},procsearch_storage={level}"
        ))
    })
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

/// Logs to stderr, and to `--log-file` when given.
fn init_logging(global: &GlobalArgs) -> Result<Option<LogFileGuard>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let Some(path) = &global.log_file else {
        tracing_subscriber::registry()
            .with(env_filter(resolve_log_level(global)))
            .with(stderr_layer)
            .init();
        return Ok(None);
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(open_log_file(path)?);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter(resolve_log_level(global)))
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(Some(LogFileGuard { _guard: guard }))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    set_color_mode(cli.global.color);

    let _log_guard = match init_logging(&cli.global) {
        Ok(guard) => guard,
        Err(e) => {
            print_error(&format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    match dispatch_command(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
