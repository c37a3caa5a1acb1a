//! Single-command dispatch: load, render, invoke, print.

use std::io::Write;

use crate::config::CommandStore;
use crate::model::ModelClient;
use crate::prompt::render;

use super::output_handler::OutputHandler;
use super::{DispatchError, DispatchOutcome};

/// One requested command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    /// Name of the command to run.
    pub command_name: String,
    /// Text substituted for the placeholder. May be empty.
    pub argument_text: String,
}

impl DispatchRequest {
    /// Create a request.
    pub fn new(command_name: impl Into<String>, argument_text: impl Into<String>) -> Self {
        Self {
            command_name: command_name.into(),
            argument_text: argument_text.into(),
        }
    }

    /// Create a request from command-line words, joining them with single spaces.
    pub fn from_words<S: AsRef<str>>(command_name: impl Into<String>, words: &[S]) -> Self {
        let argument_text = words
            .iter()
            .map(|w| w.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        Self::new(command_name, argument_text)
    }
}

/// Runs commands from a store against a model client.
pub struct Dispatcher<M> {
    store: CommandStore,
    client: M,
}

impl<M: ModelClient> Dispatcher<M> {
    /// Create a dispatcher.
    pub fn new(store: CommandStore, client: M) -> Self {
        Self { store, client }
    }

    /// The model client.
    pub fn client(&self) -> &M {
        &self.client
    }

    /// Run one command and print its outcome.
    ///
    /// Missing commands, invalid command files and failed model calls are
    /// reported through `output` and returned as an outcome. Only a failure
    /// to write the output itself is returned as an error.
    pub fn dispatch<W: Write>(
        &self,
        request: &DispatchRequest,
        output: &mut OutputHandler<W>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let name = request.command_name.as_str();

        let command = match self.store.load(name) {
            Ok(Some(command)) => command,
            Ok(None) => {
                output.not_found(name)?;
                return Ok(DispatchOutcome::NotFound);
            }
            Err(e) => {
                tracing::debug!(command = name, error = %e, "invalid command definition");
                output.error(&format!(
                    "Command '{name}' has an invalid configuration: {e}"
                ))?;
                return Ok(DispatchOutcome::ConfigInvalid);
            }
        };

        let prompt = render(&command.prompt_template, &request.argument_text);
        output.command_header(name, &request.argument_text)?;

        match self.client.generate(&prompt) {
            Ok(reply) => {
                output.reply(&reply)?;
                Ok(DispatchOutcome::Completed)
            }
            Err(e) => {
                tracing::debug!(command = name, error = %e, "model call failed");
                output.error(&e.to_string())?;
                Ok(DispatchOutcome::RemoteCallFailed)
            }
        }
    }
}
