//! CLI argument structures and parsing.
//!
//! Defines all command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::styles::{AFTER_HELP, categories, get_styles};
use crate::cache_cmd::CacheCli;
use crate::import_cmd::ImportCli;
use crate::record_cmd::{AddCli, DeleteCli, EditCli};
use crate::search_cmd::{ListCli, SearchCli};

/// Build-time version string with commit hash.
pub fn get_long_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = match option_env!("PROCSEARCH_GIT_HASH") {
        Some(v) => v,
        None => "unknown",
    };

    static LONG_VERSION: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    LONG_VERSION.get_or_init(|| format!("{} ({})", VERSION, GIT_HASH))
}

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Color output mode for CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if output is a terminal
    #[default]
    Auto,
    /// Always output with colors
    Always,
    /// Never output with colors
    Never,
}

/// Procsearch - procedure catalogue search
///
/// Searches the local procedure catalogue and keeps it up to date from
/// spreadsheet exports.
#[derive(Debug, Parser)]
#[command(name = "procsearch")]
#[command(author, version, long_version = get_long_version())]
#[command(about = "Procsearch - procedure catalogue search", long_about = None)]
#[command(styles = get_styles(), after_help = AFTER_HELP)]
pub struct Cli {
    #[clap(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Enable verbose output (same as --log-level debug)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Enable trace-level logging for debugging
    #[arg(long = "trace", global = true)]
    pub trace: bool,

    /// Log verbosity
    #[arg(long = "log-level", global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Also write logs to this file
    #[arg(long = "log-file", global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Control color output: auto (default), always, or never
    #[arg(long = "color", global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Configuration file (default: <config dir>/config.toml)
    #[arg(long = "config", short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory holding the catalogue, cache and session
    #[arg(long = "data-dir", global = true, value_name = "DIR", env = "PROCSEARCH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search the catalogue
    #[command(visible_alias = "s", display_order = 10)]
    #[command(next_help_heading = categories::SEARCH)]
    Search(SearchCli),

    /// List the whole catalogue
    #[command(visible_alias = "ls", display_order = 11)]
    #[command(next_help_heading = categories::SEARCH)]
    List(ListCli),

    /// Import records from a CSV export
    #[command(display_order = 20)]
    #[command(next_help_heading = categories::CATALOGUE)]
    Import(ImportCli),

    /// Add one record
    #[command(display_order = 21)]
    #[command(next_help_heading = categories::CATALOGUE)]
    Add(AddCli),

    /// Edit one record
    #[command(display_order = 22)]
    #[command(next_help_heading = categories::CATALOGUE)]
    Edit(EditCli),

    /// Delete one record
    #[command(visible_alias = "rm", display_order = 23)]
    #[command(next_help_heading = categories::CATALOGUE)]
    Delete(DeleteCli),

    /// Inspect or clear the record cache
    #[command(display_order = 30)]
    #[command(next_help_heading = categories::MAINTENANCE)]
    Cache(CacheCli),

    /// Generate shell completion scripts
    #[command(display_order = 31)]
    #[command(next_help_heading = categories::MAINTENANCE)]
    Completion(CompletionCommand),
}

/// Shell completion generation.
#[derive(Debug, Args)]
pub struct CompletionCommand {
    /// Shell to generate completions for (default: from $SHELL).
    #[arg(value_enum)]
    pub shell: Option<clap_complete::Shell>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_from_str_loose() {
        assert_eq!(LogLevel::from_str_loose("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str_loose(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str_loose("loud"), None);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["procsearch", "list", "--verbose", "--color", "never"])
            .unwrap();
        assert!(cli.global.verbose);
        assert_eq!(cli.global.color, ColorMode::Never);
        assert!(matches!(cli.command, Commands::List(_)));
    }
}
