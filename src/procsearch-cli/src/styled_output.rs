//! Styled CLI output.
//!
//! Status messages go to stderr with an icon and, on a terminal, a color.
//! Colors follow `--color`, then the `NO_COLOR` environment variable, then
//! whether the stream is a terminal.
//!
//! # Examples
//!
//! ```
//! use procsearch_cli::styled_output::{print_info, print_success};
//!
//! print_info("Parsed 120 rows");
//! print_success("Imported 120 procedures");
//! ```

use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use crate::cli::ColorMode;

static COLOR_MODE: AtomicU8 = AtomicU8::new(0);

/// Sets the process-wide color mode.
pub fn set_color_mode(mode: ColorMode) {
    let raw = match mode {
        ColorMode::Auto => 0,
        ColorMode::Always => 1,
        ColorMode::Never => 2,
    };
    COLOR_MODE.store(raw, Ordering::Relaxed);
}

fn color_mode() -> ColorMode {
    match COLOR_MODE.load(Ordering::Relaxed) {
        1 => ColorMode::Always,
        2 => ColorMode::Never,
        _ => ColorMode::Auto,
    }
}

/// Check if colors should be disabled based on NO_COLOR env var.
fn colors_disabled() -> bool {
    std::env::var("NO_COLOR")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

/// Whether output written to stdout (or stderr) should carry ANSI codes.
pub fn use_colors(stderr: bool) -> bool {
    match color_mode() {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            let terminal = if stderr {
                std::io::stderr().is_terminal()
            } else {
                std::io::stdout().is_terminal()
            };
            terminal && !colors_disabled()
        }
    }
}

mod codes {
    pub const SUCCESS: &str = "\x1b[38;2;0;245;212m"; // #00F5D4
    pub const ERROR: &str = "\x1b[38;2;255;107;107m"; // #FF6B6B
    pub const WARNING: &str = "\x1b[38;2;255;200;87m"; // #FFC857
    pub const INFO: &str = "\x1b[38;2;72;202;228m"; // #48CAE4
    pub const DIM: &str = "\x1b[38;2;130;154;177m"; // #829AB1
    pub const BOLD: &str = "\x1b[1m";
    pub const RESET: &str = "\x1b[0m";
}

pub use codes::{BOLD, RESET};

/// Message type for styled output.
#[derive(Debug, Clone, Copy)]
pub enum MessageType {
    Success,
    Error,
    Warning,
    Info,
    /// Neutral/dimmed message
    Dim,
}

impl MessageType {
    fn icon(&self) -> &'static str {
        match self {
            MessageType::Success => "[OK]",
            MessageType::Error => "[ERROR]",
            MessageType::Warning => "[WARN]",
            MessageType::Info => "[INFO]",
            MessageType::Dim => "-",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            MessageType::Success => codes::SUCCESS,
            MessageType::Error => codes::ERROR,
            MessageType::Warning => codes::WARNING,
            MessageType::Info => codes::INFO,
            MessageType::Dim => codes::DIM,
        }
    }
}

fn format_with(msg_type: MessageType, message: &str, colors: bool) -> String {
    if colors {
        format!("{}{} {}{}", msg_type.color(), msg_type.icon(), message, codes::RESET)
    } else {
        format!("{} {}", msg_type.icon(), message)
    }
}

fn print_styled(msg_type: MessageType, message: &str) {
    let line = format_with(msg_type, message, use_colors(true));
    let _ = writeln!(std::io::stderr(), "{}", line);
}

/// Print a success message to stderr.
pub fn print_success(message: &str) {
    print_styled(MessageType::Success, message);
}

/// Print an error message to stderr.
pub fn print_error(message: &str) {
    print_styled(MessageType::Error, message);
}

/// Print a warning message to stderr.
pub fn print_warning(message: &str) {
    print_styled(MessageType::Warning, message);
}

/// Print an info message to stderr.
pub fn print_info(message: &str) {
    print_styled(MessageType::Info, message);
}

/// Print a dimmed/muted message to stderr.
pub fn print_dim(message: &str) {
    print_styled(MessageType::Dim, message);
}

/// Return a styled label string for inline use on stdout.
pub fn styled_label(msg_type: MessageType, label: &str) -> String {
    if use_colors(false) {
        format!("{}{}{}", msg_type.color(), label, codes::RESET)
    } else {
        label.to_string()
    }
}
