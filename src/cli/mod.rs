//! CLI commands and argument handling.
//!
//! This module contains the clap CLI definition and the shared startup
//! context; command implementations live in `commands`.

pub mod commands;

use std::path::PathBuf;

use clap::Parser;

use crate::config::{self, AgentConfig, CommandError, CommandStore, ConfigError};
use crate::model::{GeminiClient, ModelError};
use crate::runner::{DispatchError, Dispatcher};

/// Name of the command that starts the maintenance loop.
pub const MAINTAIN_COMMAND: &str = "maintain";

/// Run prompt-template commands against Gemini.
///
/// Each command is a TOML file under ~/.gemini/commands with a `prompt`
/// field. `{{args}}` in the prompt is replaced by the remaining arguments.
///
/// Examples:
///   sway greet world       # Run ~/.gemini/commands/greet.toml
///   sway git/autosync      # Run ~/.gemini/commands/git/autosync.toml
///   sway maintain          # Run the maintenance loop every 5 minutes
#[derive(Parser, Debug)]
#[command(name = "sway")]
#[command(author, version = crate::VERSION, about, long_about = None)]
pub struct Cli {
    /// Command to run, or `maintain` to start the maintenance loop.
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    /// Text substituted for {{args}}, joined with single spaces.
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,

    /// List available commands and exit.
    #[arg(long)]
    pub list: bool,

    /// Print a shell completion script and exit.
    #[arg(long, value_name = "SHELL", value_parser = ["bash", "zsh", "fish"])]
    pub completions: Option<String>,

    /// Stop the maintenance loop after this many cycles.
    #[arg(long, value_name = "N")]
    pub cycles: Option<u64>,

    /// Config directory (defaults to ~/.gemini).
    #[arg(long, env = "SWAY_CONFIG_DIR", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name, overriding the settings file.
    #[arg(long, env = "GEMINI_MODEL")]
    pub model: Option<String>,
}

/// Error type for CLI startup and execution.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Settings could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
    /// The HTTP client could not be built.
    #[error("Failed to create model client: {0}")]
    Client(#[from] ModelError),
    /// The commands directory could not be read.
    #[error("Failed to list commands: {0}")]
    Commands(#[from] CommandError),
    /// Output could not be written.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// Shell completions could not be generated.
    #[error(transparent)]
    Completions(#[from] commands::completions::CompletionsCommandError),
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Dispatch(DispatchError::Output(e))
    }
}

/// Resolved settings shared by all commands.
#[derive(Clone)]
pub struct Context {
    /// Config directory (`~/.gemini` unless overridden).
    pub config_dir: PathBuf,
    /// Agent settings with CLI overrides applied.
    pub config: AgentConfig,
    /// Command definitions.
    pub store: CommandStore,
    api_key: Option<String>,
}

impl Context {
    /// Resolve directories and load settings for a parsed command line.
    pub fn load(cli: &Cli) -> Result<Self, CliError> {
        let config_dir = config::resolve_config_dir(cli.config_dir.as_deref())?;
        let mut config = AgentConfig::load(&AgentConfig::settings_file(&config_dir))?;
        if let Some(model) = &cli.model {
            config.model = model.clone();
        }

        let store = CommandStore::new(config::commands_dir(&config_dir));
        tracing::debug!(config_dir = %config_dir.display(), model = %config.model, "context loaded");

        Ok(Self {
            config_dir,
            config,
            store,
            api_key: cli.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    /// Build the Gemini client for these settings.
    ///
    /// A missing API key is not an error here; each model call reports it.
    pub fn client(&self) -> Result<GeminiClient, CliError> {
        if self.api_key.is_none() {
            tracing::debug!("no API key configured");
        }
        Ok(GeminiClient::new(self.api_key.clone(), &self.config)?)
    }

    /// Build a dispatcher backed by the Gemini client.
    pub fn dispatcher(&self) -> Result<Dispatcher<GeminiClient>, CliError> {
        Ok(Dispatcher::new(self.store.clone(), self.client()?))
    }
}

impl Cli {
    /// Execute the parsed command line.
    pub fn execute(&self) -> Result<(), CliError> {
        if let Some(shell) = &self.completions {
            commands::completions::completions(shell)?;
            return Ok(());
        }

        let ctx = Context::load(self)?;

        if self.list {
            return commands::list::list(&ctx);
        }

        match self.command.as_deref() {
            None => commands::list::usage(&ctx),
            Some(MAINTAIN_COMMAND) => commands::maintain::maintain(&ctx, self.cycles),
            Some(name) => commands::invoke::invoke(&ctx, name, &self.args),
        }
    }
}
