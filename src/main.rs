//! sway - run prompt-template commands against Gemini.
//!
//! This is the main entry point for the sway CLI tool.

use std::io::{self, IsTerminal};

use clap::Parser;
use sway_agent::cli::Cli;
use sway_agent::logging;

fn main() -> std::process::ExitCode {
    logging::init();
    let cli = Cli::parse();

    match cli.execute() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "startup failed");
            if io::stderr().is_terminal() {
                eprintln!("\x1b[31mError:\x1b[0m {e}");
            } else {
                eprintln!("Error: {e}");
            }
            std::process::ExitCode::FAILURE
        }
    }
}
