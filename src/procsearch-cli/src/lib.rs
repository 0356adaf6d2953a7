//! Procsearch CLI library module.
//!
//! Command implementations behind the `procsearch` binary:
//! - `search` and `list` over the local catalogue
//! - `import` of spreadsheet exports with chunked upload
//! - `edit` and `delete` of single records
//! - `cache` inspection and clearing
//! - Shell completions
//!
//! # Module Organization
//!
//! - `cli/` - CLI argument parsing and command dispatch
//! - `context` - Configuration loading and the opened stores
//! - Command modules - Individual CLI commands (`*_cmd.rs`)
//! - `output` - Result rendering
//! - `styled_output` - Themed terminal output formatting

pub mod cli;
pub mod context;
pub mod output;
pub mod styled_output;

pub mod cache_cmd;
pub mod import_cmd;
pub mod record_cmd;
pub mod search_cmd;
