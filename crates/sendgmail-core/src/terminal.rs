//! Interactive input.
//!
//! The relay reads its message from stdin, so prompts go through a
//! [`Terminal`] created once at start-up and handed to every component that
//! may need to ask the user something.

use crate::error::{Error, Result};
use sendgmail_oauth::EndpointFailure;
use std::io;

/// Prompting capability of the controlling terminal.
pub trait Terminal: Send + Sync {
    /// Returns true if someone can answer prompts.
    fn has_interactive_input(&self) -> bool;

    /// Prints `prompt` and reads a line without echoing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn prompt_masked(&self, prompt: &str) -> io::Result<String>;

    /// Prints `prompt` and reads a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn prompt_line(&self, prompt: &str) -> io::Result<String>;

    /// Prints `prompt` and asks for a yes/no answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn confirm(&self, prompt: &str) -> io::Result<bool>;
}

/// A terminal nobody is sitting at.
///
/// Every prompt fails and every confirmation is declined.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl Terminal for Detached {
    fn has_interactive_input(&self) -> bool {
        false
    }

    fn prompt_masked(&self, _prompt: &str) -> io::Result<String> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn prompt_line(&self, _prompt: &str) -> io::Result<String> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn confirm(&self, _prompt: &str) -> io::Result<bool> {
        Ok(false)
    }
}

/// Asks for a secret, failing at once when nobody can answer.
pub(crate) fn ask_secret(terminal: &dyn Terminal, prompt: &str) -> Result<String> {
    if !terminal.has_interactive_input() {
        return Err(Error::NoInteractiveInput);
    }
    Ok(terminal.prompt_masked(prompt)?.trim().to_string())
}

/// Shows a failure and asks whether to try again.
///
/// Without interactive input the answer is always no.
pub(crate) fn offer_retry(terminal: &dyn Terminal, failure: &EndpointFailure) -> Result<bool> {
    if !terminal.has_interactive_input() {
        return Ok(false);
    }
    Ok(terminal.confirm(&format!("{failure} Keep trying?"))?)
}
