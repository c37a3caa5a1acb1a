//! Completions command implementation.
//!
//! This module implements `sway --completions <shell>`.

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

use crate::cli::Cli;

/// Result type for completions command operations.
pub type CompletionsCommandResult = Result<(), CompletionsCommandError>;

/// Error type for completions command operations.
#[derive(Debug, thiserror::Error)]
pub enum CompletionsCommandError {
    /// The specified shell is not supported for completions.
    #[error("Unsupported shell: {0}")]
    UnsupportedShell(String),
}

/// Map a shell name to a clap_complete shell.
pub fn parse_shell(shell: &str) -> Result<Shell, CompletionsCommandError> {
    match shell {
        "bash" => Ok(Shell::Bash),
        "zsh" => Ok(Shell::Zsh),
        "fish" => Ok(Shell::Fish),
        _ => Err(CompletionsCommandError::UnsupportedShell(shell.to_string())),
    }
}

/// Write the completion script for `shell` to stdout.
pub fn completions(shell: &str) -> CompletionsCommandResult {
    let shell = parse_shell(shell)?;
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "sway", &mut io::stdout());
    Ok(())
}
