//! Diagnostic logging.
//!
//! Diagnostics go to stderr through `tracing`; user-facing output never
//! does. The filter is read from `SWAY_LOG` using `EnvFilter` syntax.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SWAY_LOG";

/// Filter used when `SWAY_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Build the log filter from the environment.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
