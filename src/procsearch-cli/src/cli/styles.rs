//! CLI styling and formatting.
//!
//! Defines ANSI colors and formatting for the CLI help output.

use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Procsearch CLI styled help theme.
pub fn get_styles() -> Styles {
    Styles::styled()
        // Headers (USAGE, COMMANDS, OPTIONS) - Bold cyan
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Yellow.on_default())
}

/// After-help section with examples and environment variables.
pub const AFTER_HELP: &str = color_print::cstr!(
    r#"<cyan,bold>QUICK START</>
    <green,bold>procsearch import</> <dim>catalogue.csv --replace</>   Load a spreadsheet export
    <green,bold>procsearch search</> <dim>"nội soi"</>                  Find procedures by name
    <green,bold>procsearch search</> <dim>--specialty "tim" --category new</>
    <green,bold>procsearch search --last</>                     Repeat the saved query

<cyan,bold>ENVIRONMENT VARIABLES</>
    <yellow>PROCSEARCH_DATA_DIR</>     Override the data directory
    <yellow>PROCSEARCH_CONFIG_DIR</>   Override the config directory
    <yellow>PROCSEARCH_LOG_LEVEL</>    Log verbosity (error, warn, info, debug, trace)
    <yellow>NO_COLOR</>                Disable colored output (set to '1' or 'true')

<cyan,bold>PATHS</>
    <dim>Config</>      ~/.config/Procsearch/config.toml
    <dim>Catalogue</>   ~/.local/share/Procsearch/catalog.json
    <dim>Cache</>       ~/.local/share/Procsearch/cache/"#
);

/// Command category display names for styled help output.
pub mod categories {
    pub const SEARCH: &str = "Search";
    pub const CATALOGUE: &str = "Catalogue";
    pub const MAINTENANCE: &str = "Maintenance";
}
