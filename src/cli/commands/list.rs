//! Usage text and `sway --list`.

use std::io::Write;

use crate::cli::{CliError, Context, MAINTAIN_COMMAND};
use crate::config::CommandStore;
use crate::runner::OutputHandler;

/// Print the usage line and the available command names.
pub fn usage(ctx: &Context) -> Result<(), CliError> {
    write_usage(&ctx.store, &mut OutputHandler::new())
}

/// Print every command with its description.
pub fn list(ctx: &Context) -> Result<(), CliError> {
    write_list(&ctx.store, &mut OutputHandler::new())
}

/// Write the usage text.
pub fn write_usage<W: Write>(
    store: &CommandStore,
    output: &mut OutputHandler<W>,
) -> Result<(), CliError> {
    let mut names = store.list()?;
    names.push(MAINTAIN_COMMAND.to_string());

    output.line("Usage: sway <command> [args]")?;
    output.line(&format!("Commands: {}", names.join(", ")))?;
    if names.len() == 1 {
        output.dim(&format!(
            "No commands found in {}",
            store.root().display()
        ))?;
    }
    Ok(())
}

/// Write the command listing.
pub fn write_list<W: Write>(
    store: &CommandStore,
    output: &mut OutputHandler<W>,
) -> Result<(), CliError> {
    let names = store.list()?;
    let width = names
        .iter()
        .map(|n| n.len())
        .chain([MAINTAIN_COMMAND.len()])
        .max()
        .unwrap_or_default();

    for name in &names {
        let description = match store.load(name) {
            Ok(Some(cmd)) => cmd.description.unwrap_or_default(),
            Ok(None) => continue,
            Err(e) => format!("(invalid: {e})"),
        };
        output.line(&format!("  {name:<width$}  {description}"))?;
    }
    output.line(&format!(
        "  {MAINTAIN_COMMAND:<width$}  Run the maintenance loop"
    ))?;
    Ok(())
}
