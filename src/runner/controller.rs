//! Loop controller for the unattended maintenance loop.
//!
//! Each cycle dispatches the configured steps in order, then sleeps for the
//! interval. Step failures are reported by the dispatcher and never stop the
//! loop; only an interrupt (or an optional cycle limit) does.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::{MaintenanceConfig, MaintenanceStep};
use crate::model::ModelClient;

use super::dispatch::{DispatchRequest, Dispatcher};
use super::output_handler::OutputHandler;
use super::{DispatchError, LoopSummary, StopReason};

/// Longest uninterrupted stretch of the inter-cycle sleep.
const SLEEP_SLICE: Duration = Duration::from_millis(250);

/// Mutable state of a running loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    /// Number of the current cycle, starting at 1 once the first cycle begins.
    pub cycle_index: u64,
    /// Steps run on every cycle, in order.
    pub command_sequence: Vec<MaintenanceStep>,
}

/// Controls the maintenance loop lifecycle.
pub struct LoopController<M, W: Write> {
    dispatcher: Dispatcher<M>,
    output: OutputHandler<W>,
    state: LoopState,
    interval: Duration,
    max_cycles: Option<u64>,
    interrupted: Arc<AtomicBool>,
}

impl<M: ModelClient, W: Write> LoopController<M, W> {
    /// Create a controller for the given maintenance settings.
    pub fn new(
        dispatcher: Dispatcher<M>,
        output: OutputHandler<W>,
        config: &MaintenanceConfig,
    ) -> Self {
        Self {
            dispatcher,
            output,
            state: LoopState {
                cycle_index: 0,
                command_sequence: config.steps.clone(),
            },
            interval: Duration::from_secs(config.interval_secs),
            max_cycles: None,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the pause between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop after `max_cycles` cycles instead of running forever.
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Use an externally owned interrupt flag.
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    /// Get the interrupt flag for external signaling.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    /// Current loop state.
    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// The dispatcher used for each step.
    pub fn dispatcher(&self) -> &Dispatcher<M> {
        &self.dispatcher
    }

    /// Consume the controller and return its output handler.
    pub fn into_output(self) -> OutputHandler<W> {
        self.output
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Run the loop until interrupted or the cycle limit is reached.
    ///
    /// Returns an error only when output can no longer be written.
    pub fn run(&mut self) -> Result<LoopSummary, DispatchError> {
        let result = self.run_cycles();
        if let Err(ref e) = result {
            tracing::error!(cycle = self.state.cycle_index, error = %e, "maintenance loop aborted");
        }
        result
    }

    fn run_cycles(&mut self) -> Result<LoopSummary, DispatchError> {
        self.output.info("Starting autonomous maintenance loop...")?;
        match self.max_cycles {
            Some(n) => self
                .output
                .dim(&format!("Running {n} cycle(s). Press Ctrl+C to stop."))?,
            None => self
                .output
                .dim("This will run indefinitely. Press Ctrl+C to stop.")?,
        }

        let mut cycles_completed = 0;
        let mut steps_failed = 0;

        let stop_reason = 'cycles: loop {
            if self.max_cycles.is_some_and(|max| cycles_completed >= max) {
                break StopReason::CycleLimit;
            }

            self.state.cycle_index += 1;
            let started = chrono::Local::now();
            self.output.line("")?;
            self.output.dim(&format!(
                "Cycle {} started at {}",
                self.state.cycle_index,
                started.format("%Y-%m-%d %H:%M:%S")
            ))?;

            for step in &self.state.command_sequence {
                if self.interrupted.load(Ordering::SeqCst) {
                    break 'cycles StopReason::UserInterrupt;
                }

                self.output.step(&step.label)?;
                let request = DispatchRequest::new(step.command.as_str(), "");
                let outcome = self.dispatcher.dispatch(&request, &mut self.output)?;
                if !outcome.is_success() {
                    steps_failed += 1;
                }
                tracing::debug!(
                    cycle = self.state.cycle_index,
                    command = %step.command,
                    ?outcome,
                    "maintenance step finished"
                );
            }

            cycles_completed += 1;

            if self.max_cycles.is_some_and(|max| cycles_completed >= max) {
                break StopReason::CycleLimit;
            }

            self.output.line("")?;
            self.output.dim(&format!(
                "Waiting {} before next cycle...",
                format_interval(self.interval)
            ))?;

            if self.sleep_interruptibly() {
                break StopReason::UserInterrupt;
            }
        };

        if stop_reason == StopReason::UserInterrupt {
            self.output.line("")?;
            self.output.info("Autonomous loop stopped by user")?;
        }

        Ok(LoopSummary {
            cycles_completed,
            steps_failed,
            stop_reason,
        })
    }

    /// Sleep for the interval, waking early on interrupt.
    ///
    /// Returns true if interrupted.
    fn sleep_interruptibly(&self) -> bool {
        let mut remaining = self.interval;
        while !remaining.is_zero() {
            if self.is_interrupted() {
                return true;
            }
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice);
            remaining -= slice;
        }
        self.is_interrupted()
    }
}

/// Human-readable interval, e.g. "5 minutes" or "90 seconds".
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs == 0 {
        return format!("{} ms", interval.as_millis());
    }
    let (value, unit) = if secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if value == 1 {
        format!("1 {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

/// Install a Ctrl+C handler that sets `flag`.
///
/// A second Ctrl+C while the flag is already set exits immediately with 130.
pub fn install_interrupt_handler(flag: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            eprintln!("\n\x1b[31mForce quit\x1b[0m");
            std::process::exit(130);
        }
        eprintln!("\n\x1b[33mStopping after the current step... press Ctrl+C again to force quit\x1b[0m");
    })
}

/// Run the maintenance loop on stdout with a Ctrl+C handler installed.
///
/// Convenience function that creates a LoopController and runs it. Ctrl+C
/// sets `interrupted`, so a client sharing the flag can stop early too.
pub fn run_maintenance<M: ModelClient>(
    dispatcher: Dispatcher<M>,
    config: &MaintenanceConfig,
    max_cycles: Option<u64>,
    interrupted: Arc<AtomicBool>,
) -> Result<LoopSummary, DispatchError> {
    let mut controller = LoopController::new(dispatcher, OutputHandler::new(), config)
        .with_max_cycles(max_cycles)
        .with_interrupt_flag(interrupted);

    if let Err(e) = install_interrupt_handler(controller.interrupt_flag()) {
        // Non-fatal: the loop still runs, it just can't be stopped gracefully.
        eprintln!("\x1b[2mWarning: Could not set up Ctrl+C handler: {e}\x1b[0m");
    }

    controller.run()
}
