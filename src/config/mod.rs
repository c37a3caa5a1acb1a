//! Configuration models for `~/.gemini/sway.toml`.
//!
//! This module contains the Serde models for the agent settings and the
//! path helpers shared with the command store.

pub mod command;

use serde::{Deserialize, Serialize};

pub use command::{CommandDefinition, CommandError, CommandStore};
use std::fs;
use std::path::{Path, PathBuf};

/// Per-user config directory, relative to the home directory.
pub const GEMINI_DIR: &str = ".gemini";
/// Commands directory, relative to the config directory.
pub const COMMANDS_DIR: &str = "commands";
/// Settings file, relative to the config directory.
pub const SETTINGS_FILE: &str = "sway.toml";
/// Extension of command definition files.
pub const COMMAND_EXTENSION: &str = "toml";

/// Retry behaviour for model requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before the first retry, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound for any single backoff, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// One step of the maintenance cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceStep {
    /// Command name to dispatch (e.g. "git/autosync").
    pub command: String,
    /// Progress label printed before the step runs.
    pub label: String,
}

impl MaintenanceStep {
    /// Create a new step.
    pub fn new(command: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            label: label.into(),
        }
    }
}

/// Configuration for the unattended maintenance loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Pause between cycles, in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Ordered steps run on every cycle.
    #[serde(default = "default_steps")]
    pub steps: Vec<MaintenanceStep>,
}

fn default_interval_secs() -> u64 {
    300
}

fn default_steps() -> Vec<MaintenanceStep> {
    vec![
        MaintenanceStep::new("healthcheck", "Running health check"),
        MaintenanceStep::new("git/autosync", "Syncing with git"),
        MaintenanceStep::new("deploy", "Checking deployment"),
        MaintenanceStep::new("optimize", "Running optimization"),
    ]
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            steps: default_steps(),
        }
    }
}

/// Main agent configuration model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Gemini model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the Generative Language API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retry policy for failed requests.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Maintenance loop settings.
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            retry: RetryConfig::default(),
            maintenance: MaintenanceConfig::default(),
        }
    }
}

/// Error type for config operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading the settings file from disk.
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Error parsing the settings file TOML.
    #[error("Failed to parse settings TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    /// The home directory could not be determined.
    #[error("Could not determine the home directory")]
    NoHomeDirectory,
}

impl AgentConfig {
    /// Load settings from a file, or return defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: AgentConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Path of the settings file inside a config directory.
    pub fn settings_file(config_dir: &Path) -> PathBuf {
        config_dir.join(SETTINGS_FILE)
    }
}

/// Resolve the config directory.
///
/// Uses the explicit override when given, otherwise `~/.gemini`.
pub fn resolve_config_dir(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }

    let home = directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .filter(|p| !p.as_os_str().is_empty());
    home.map(|h| h.join(GEMINI_DIR))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Commands directory inside a config directory.
pub fn commands_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(COMMANDS_DIR)
}
