//! Command dispatch and the unattended maintenance loop.
//!
//! A dispatch is one load-render-invoke-print cycle. The maintenance loop
//! repeats a fixed list of dispatches until interrupted.

mod controller;
mod dispatch;
mod output_handler;

pub use controller::{install_interrupt_handler, run_maintenance, LoopController, LoopState};
pub use dispatch::{DispatchRequest, Dispatcher};
pub use output_handler::{OutputHandler, SEPARATOR_WIDTH};

/// How a single dispatch ended. Every variant has already been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The model replied and the reply was printed.
    Completed,
    /// No definition file exists for the command.
    NotFound,
    /// The definition file exists but is unusable.
    ConfigInvalid,
    /// The model call failed.
    RemoteCallFailed,
}

impl DispatchOutcome {
    /// Whether the command produced a reply.
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Completed)
    }
}

/// Faults a dispatch does not absorb.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Output could not be written.
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Reason for stopping the maintenance loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// User interrupted (Ctrl+C).
    UserInterrupt,
    /// The requested number of cycles ran.
    CycleLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::UserInterrupt => write!(f, "User interrupted"),
            StopReason::CycleLimit => write!(f, "Cycle limit reached"),
        }
    }
}

/// Result of running the maintenance loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    /// Number of cycles that ran all their steps.
    pub cycles_completed: u64,
    /// Steps that did not end in [`DispatchOutcome::Completed`].
    pub steps_failed: u64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}
