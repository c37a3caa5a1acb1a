//! Maintenance loop: `sway maintain`.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::cli::{CliError, Context};
use crate::runner::{run_maintenance, Dispatcher};

/// Run the maintenance loop until Ctrl+C (or `cycles` cycles).
pub fn maintain(ctx: &Context, cycles: Option<u64>) -> Result<(), CliError> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let client = ctx.client()?.with_interrupt_flag(interrupted.clone());
    let dispatcher = Dispatcher::new(ctx.store.clone(), client);

    let summary = run_maintenance(dispatcher, &ctx.config.maintenance, cycles, interrupted)?;
    tracing::info!(
        cycles = summary.cycles_completed,
        failed_steps = summary.steps_failed,
        reason = %summary.stop_reason,
        "maintenance loop finished"
    );
    Ok(())
}
