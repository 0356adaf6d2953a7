//! Command handlers for the CLI.

use std::io::{self, Write};

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};

use super::args::{Cli, Commands, CompletionCommand};

/// Binary name used in generated completion scripts.
const BIN_NAME: &str = "procsearch";

/// Dispatch the parsed command to its handler.
pub async fn dispatch_command(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Search(search_cli) => search_cli.run(&global).await,
        Commands::List(list_cli) => list_cli.run(&global).await,
        Commands::Import(import_cli) => import_cli.run(&global).await,
        Commands::Add(add_cli) => add_cli.run(&global).await,
        Commands::Edit(edit_cli) => edit_cli.run(&global).await,
        Commands::Delete(delete_cli) => delete_cli.run(&global).await,
        Commands::Cache(cache_cli) => cache_cli.run(&global).await,
        Commands::Completion(completion_cli) => handle_completion(completion_cli),
    }
}

fn handle_completion(completion_cli: CompletionCommand) -> Result<()> {
    let shell = completion_cli.shell.unwrap_or_else(detect_shell_from_env);
    let script = completion_script(shell);
    let mut stdout = io::stdout().lock();
    match stdout.write_all(&script).and_then(|()| stdout.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.map_err(Into::into),
    }
}

/// Completion script for `shell`.
pub fn completion_script(shell: Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut buffer);
    buffer
}

/// Detect the user's shell from the SHELL environment variable.
fn detect_shell_from_env() -> Shell {
    let Ok(shell_path) = std::env::var("SHELL") else {
        return if cfg!(windows) {
            Shell::PowerShell
        } else {
            Shell::Bash
        };
    };
    shell_from_path(&shell_path).unwrap_or_else(|| {
        tracing::warn!(shell = %shell_path, "unknown shell in $SHELL, defaulting to bash");
        Shell::Bash
    })
}

fn shell_from_path(shell_path: &str) -> Option<Shell> {
    let shell_name = std::path::Path::new(shell_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    match shell_name.trim_end_matches(".exe") {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "powershell" | "pwsh" => Some(Shell::PowerShell),
        "elvish" => Some(Shell::Elvish),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_from_path() {
        assert_eq!(shell_from_path("/usr/bin/zsh"), Some(Shell::Zsh));
        assert_eq!(shell_from_path("/opt/homebrew/bin/fish"), Some(Shell::Fish));
        assert_eq!(shell_from_path("pwsh.exe"), Some(Shell::PowerShell));
        assert_eq!(shell_from_path("/bin/tcsh"), None);
    }

    #[test]
    fn test_completion_script_names_subcommands() {
        let script = String::from_utf8(completion_script(Shell::Bash)).unwrap();
        assert!(script.contains("procsearch"));
        assert!(script.contains("import"));
        assert!(script.contains("cache"));
    }
}
