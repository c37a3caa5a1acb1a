//! Command definition loading.
//!
//! Each command lives in its own TOML file under the commands directory.
//! Namespaced names map to subdirectories, so `git/autosync` is read from
//! `commands/git/autosync.toml`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::COMMAND_EXTENSION;

/// Valid command names: path segments of word characters, dots and dashes.
static COMMAND_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+(/[A-Za-z0-9_.-]+)*$").expect("COMMAND_NAME regex is valid")
});

/// A named prompt template loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDefinition {
    /// Command name, matching the file's base name.
    pub name: String,
    /// Prompt template, possibly containing the `{{args}}` placeholder.
    pub prompt_template: String,
    /// Optional one-line description.
    pub description: Option<String>,
}

/// On-disk shape of a command file. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct CommandFile {
    prompt: Option<String>,
    description: Option<String>,
}

/// Error type for loading a command that exists but can't be used.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Name is empty or not usable as a relative file path.
    #[error("Invalid command name: '{0}'")]
    InvalidName(String),
    /// Error reading the command file.
    #[error("Failed to read command file: {0}")]
    ReadError(#[from] io::Error),
    /// Error parsing the command file TOML.
    #[error("Failed to parse command TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    /// The file has no `prompt` field.
    #[error("Missing required 'prompt' field")]
    MissingPrompt,
}

/// Read-only access to the commands directory.
#[derive(Debug, Clone)]
pub struct CommandStore {
    root: PathBuf,
}

impl CommandStore {
    /// Create a store rooted at the given commands directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The commands directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file that backs `name`.
    pub fn command_path(&self, name: &str) -> Result<PathBuf, CommandError> {
        validate_name(name)?;
        let mut path = self.root.clone();
        for segment in name.split('/') {
            path.push(segment);
        }
        let file_name = format!(
            "{}.{COMMAND_EXTENSION}",
            path.file_name().map(|f| f.to_string_lossy()).unwrap_or_default()
        );
        path.set_file_name(file_name);
        Ok(path)
    }

    /// Load a command definition.
    ///
    /// Returns `Ok(None)` when no file exists for the name. The file is read
    /// fresh on every call.
    pub fn load(&self, name: &str) -> Result<Option<CommandDefinition>, CommandError> {
        let path = self.command_path(name)?;
        tracing::debug!(command = name, path = %path.display(), "loading command");

        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: CommandFile = toml::from_str(&contents)?;
        let prompt_template = file.prompt.ok_or(CommandError::MissingPrompt)?;

        Ok(Some(CommandDefinition {
            name: name.to_string(),
            prompt_template,
            description: file.description,
        }))
    }

    /// List all command names, sorted.
    ///
    /// A missing commands directory yields an empty list.
    pub fn list(&self) -> Result<Vec<String>, CommandError> {
        let mut names = Vec::new();
        if self.root.is_dir() {
            collect_names(&self.root, "", &mut names)?;
        }
        names.sort();
        Ok(names)
    }
}

fn collect_names(dir: &Path, prefix: &str, names: &mut Vec<String>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().to_string();

        if path.is_dir() {
            collect_names(&path, &format!("{prefix}{file_name}/"), names)?;
        } else if path.extension().is_some_and(|ext| ext == COMMAND_EXTENSION) {
            if let Some(stem) = path.file_stem() {
                let name = format!("{prefix}{}", stem.to_string_lossy());
                if validate_name(&name).is_ok() {
                    names.push(name);
                }
            }
        }
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), CommandError> {
    let has_dot_segment = name.split('/').any(|s| s == "." || s == "..");
    if !COMMAND_NAME.is_match(name) || has_dot_segment {
        return Err(CommandError::InvalidName(name.to_string()));
    }
    Ok(())
}
