//! Command implementations for the sway CLI.
//!
//! This module contains the actual implementations of CLI commands,
//! separated from the argument parsing definitions in cli/mod.rs.

pub mod completions;
pub mod invoke;
pub mod list;
pub mod maintain;
