//! User-facing output for dispatches and the maintenance loop.
//!
//! Everything the user reads goes through [`OutputHandler`], which writes
//! to stdout by default and to any `Write` in tests. ANSI colour is only
//! applied when writing to a terminal.

use std::io::{self, IsTerminal, Write};

/// Width of the separator printed under the progress lines.
pub const SEPARATOR_WIDTH: usize = 50;

/// Writes progress, replies and diagnostics.
pub struct OutputHandler<W: Write = io::Stdout> {
    out: W,
    color: bool,
}

impl OutputHandler<io::Stdout> {
    /// Output handler for stdout, coloured when stdout is a terminal.
    pub fn new() -> Self {
        let color = io::stdout().is_terminal();
        Self::with_writer(io::stdout(), color)
    }
}

impl Default for OutputHandler<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> OutputHandler<W> {
    /// Output handler over an arbitrary writer.
    pub fn with_writer(out: W, color: bool) -> Self {
        Self { out, color }
    }

    /// Consume the handler and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    /// Write one plain line.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    /// Progress lines printed before the model call.
    pub fn command_header(&mut self, name: &str, args: &str) -> io::Result<()> {
        let executing = self.paint("1", "Executing:");
        let task = self.paint("2", "Task:");
        writeln!(self.out, "{executing} {name}")?;
        writeln!(self.out, "{task} {args}")?;
        let separator = self.paint("2", &"-".repeat(SEPARATOR_WIDTH));
        writeln!(self.out, "{separator}")?;
        self.out.flush()
    }

    /// Model reply text, printed exactly as received.
    pub fn reply(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    /// Report a command with no definition file.
    pub fn not_found(&mut self, name: &str) -> io::Result<()> {
        let msg = self.paint("33", &format!("Command '{name}' not found"));
        writeln!(self.out, "{msg}")
    }

    /// Display error message.
    pub fn error(&mut self, msg: &str) -> io::Result<()> {
        let label = self.paint("31", "Error:");
        writeln!(self.out, "{label} {msg}")?;
        self.out.flush()
    }

    /// Display info message.
    pub fn info(&mut self, msg: &str) -> io::Result<()> {
        let text = self.paint("36", msg);
        writeln!(self.out, "{text}")
    }

    /// Display dim message.
    pub fn dim(&mut self, msg: &str) -> io::Result<()> {
        let text = self.paint("2", msg);
        writeln!(self.out, "{text}")
    }

    /// Step label in the maintenance loop, preceded by a blank line.
    pub fn step(&mut self, label: &str) -> io::Result<()> {
        let text = self.paint("36", &format!("{label}..."));
        writeln!(self.out)?;
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }
}
