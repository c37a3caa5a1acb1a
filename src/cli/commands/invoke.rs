//! Single dispatch: `sway <command> [args...]`.

use crate::cli::{CliError, Context};
use crate::runner::{DispatchRequest, OutputHandler};

/// Dispatch one command with the given argument words.
///
/// Not-found commands, invalid definitions and failed model calls are
/// reported on stdout and still count as success here.
pub fn invoke(ctx: &Context, name: &str, args: &[String]) -> Result<(), CliError> {
    let dispatcher = ctx.dispatcher()?;
    let request = DispatchRequest::from_words(name, args);
    let mut output = OutputHandler::new();

    let outcome = dispatcher.dispatch(&request, &mut output)?;
    tracing::debug!(command = name, ?outcome, "dispatch finished");
    Ok(())
}
