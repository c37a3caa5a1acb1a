//! sway - run prompt-template commands against Gemini.
//!
//! Commands are TOML files holding a prompt template. A dispatch loads one,
//! substitutes the caller's arguments for `{{args}}`, sends the prompt to the
//! model and prints the reply. `maintain` repeats a fixed list of commands on
//! a timer until interrupted.

#![deny(missing_docs)]

/// Version string from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod logging;
pub mod model;
pub mod prompt;
pub mod runner;

// Re-export key types for convenience
pub use config::{AgentConfig, CommandDefinition, CommandStore};
pub use model::{GeminiClient, ModelClient, ModelError, ModelReply};
pub use runner::{DispatchOutcome, DispatchRequest, Dispatcher, LoopController};
