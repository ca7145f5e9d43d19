//! Prompts on the controlling terminal.
//!
//! The message arrives on stdin, so the console is reached directly: on
//! Unix through `/dev/tty`, elsewhere through the console crossterm reads
//! key events from. Lines are read key by key in raw mode, which lets a
//! masked prompt echo `*` instead of the typed character.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use sendgmail_core::Terminal;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// How typed characters are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Echo {
    Plain,
    Masked,
}

/// What a key press does to the line being read.
#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyOutcome {
    /// Show this text.
    Print(String),
    /// Erase the last shown character.
    Erase,
    /// The line is complete.
    Submit,
    /// The user pressed Ctrl-C.
    Abort,
    /// Nothing to do.
    Ignore,
}

/// Line editing state for one prompt.
#[derive(Debug)]
struct LineBuffer {
    text: String,
    echo: Echo,
}

impl LineBuffer {
    const fn new(echo: Echo) -> Self {
        Self {
            text: String::new(),
            echo,
        }
    }

    fn apply(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::Ignore;
        }
        match key.code {
            KeyCode::Enter => KeyOutcome::Submit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyOutcome::Abort,
            KeyCode::Backspace => {
                if self.text.pop().is_some() {
                    KeyOutcome::Erase
                } else {
                    KeyOutcome::Ignore
                }
            }
            KeyCode::Char(c) => {
                self.text.push(c);
                KeyOutcome::Print(match self.echo {
                    Echo::Plain => c.to_string(),
                    Echo::Masked => "*".to_string(),
                })
            }
            _ => KeyOutcome::Ignore,
        }
    }

    fn into_text(self) -> String {
        self.text
    }
}

/// Restores cooked mode when dropped.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            debug!("Failed to leave raw mode: {e}");
        }
    }
}

type Output = Box<dyn Write + Send>;

/// [`Terminal`] backed by the user's console.
pub struct ConsoleTerminal {
    output: Option<Mutex<Output>>,
}

impl ConsoleTerminal {
    /// Looks for a console someone can type into.
    #[must_use]
    pub fn detect() -> Self {
        match open_console() {
            Ok(output) => Self {
                output: Some(Mutex::new(output)),
            },
            Err(e) => {
                debug!("No interactive console: {e}");
                Self { output: None }
            }
        }
    }

    fn with_output<T>(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<T>) -> io::Result<T> {
        let Some(output) = &self.output else {
            return Err(io::ErrorKind::NotConnected.into());
        };
        let mut output = output.lock().unwrap_or_else(PoisonError::into_inner);
        f(output.as_mut())
    }

    fn read_line(&self, prompt: &str, echo: Echo) -> io::Result<String> {
        self.with_output(|out| {
            writeln!(out, "{prompt}")?;
            out.flush()?;

            let mut line = LineBuffer::new(echo);
            let outcome = {
                let _raw = RawMode::enable()?;
                edit_line(&mut line, out)
            };
            write!(out, "\r\n")?;
            out.flush()?;

            outcome.map(|()| line.into_text())
        })
    }
}

impl Terminal for ConsoleTerminal {
    fn has_interactive_input(&self) -> bool {
        self.output.is_some()
    }

    fn prompt_masked(&self, prompt: &str) -> io::Result<String> {
        self.read_line(prompt, Echo::Masked)
    }

    fn prompt_line(&self, prompt: &str) -> io::Result<String> {
        self.read_line(prompt, Echo::Plain)
    }

    fn confirm(&self, prompt: &str) -> io::Result<bool> {
        self.with_output(|out| {
            writeln!(out, "{prompt} (y/n)")?;
            out.flush()?;

            let key = {
                let _raw = RawMode::enable()?;
                next_key()?
            };
            write!(out, "\r\n")?;
            out.flush()?;

            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Err(io::ErrorKind::Interrupted.into());
            }
            Ok(matches!(key.code, KeyCode::Char('y' | 'Y')))
        })
    }
}

impl std::fmt::Debug for ConsoleTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleTerminal")
            .field("interactive", &self.output.is_some())
            .finish()
    }
}

/// Reads keys into `line` until Enter, echoing to `out`.
fn edit_line(line: &mut LineBuffer, out: &mut dyn Write) -> io::Result<()> {
    loop {
        match line.apply(next_key()?) {
            KeyOutcome::Print(text) => write!(out, "{text}")?,
            KeyOutcome::Erase => write!(out, "\x08 \x08")?,
            KeyOutcome::Submit => return Ok(()),
            KeyOutcome::Abort => return Err(io::ErrorKind::Interrupted.into()),
            KeyOutcome::Ignore => continue,
        }
        out.flush()?;
    }
}

/// Blocks until the next key press.
fn next_key() -> io::Result<KeyEvent> {
    loop {
        if let Event::Key(key) = event::read()?
            && key.kind != KeyEventKind::Release
        {
            return Ok(key);
        }
    }
}

#[cfg(unix)]
fn open_console() -> io::Result<Output> {
    let tty = std::fs::OpenOptions::new().write(true).open("/dev/tty")?;
    Ok(Box::new(tty))
}

#[cfg(not(unix))]
fn open_console() -> io::Result<Output> {
    use std::io::IsTerminal;

    if io::stderr().is_terminal() {
        Ok(Box::new(io::stderr()))
    } else {
        Err(io::Error::new(io::ErrorKind::NotConnected, "stderr is not a console"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_keys(echo: Echo, keys: &[KeyEvent]) -> (String, Vec<KeyOutcome>) {
        let mut line = LineBuffer::new(echo);
        let outcomes = keys.iter().map(|key| line.apply(*key)).collect();
        (line.into_text(), outcomes)
    }

    #[test]
    fn test_masked_input_echoes_stars() {
        let (text, outcomes) = type_keys(
            Echo::Masked,
            &[press(KeyCode::Char('a')), press(KeyCode::Char('b')), press(KeyCode::Enter)],
        );
        assert_eq!(text, "ab");
        assert_eq!(
            outcomes,
            [
                KeyOutcome::Print("*".into()),
                KeyOutcome::Print("*".into()),
                KeyOutcome::Submit
            ]
        );
    }

    #[test]
    fn test_plain_input_echoes_characters() {
        let (text, outcomes) = type_keys(Echo::Plain, &[press(KeyCode::Char('x'))]);
        assert_eq!(text, "x");
        assert_eq!(outcomes, [KeyOutcome::Print("x".into())]);
    }

    #[test]
    fn test_backspace_removes_last_character() {
        let (text, outcomes) = type_keys(
            Echo::Masked,
            &[
                press(KeyCode::Backspace),
                press(KeyCode::Char('a')),
                press(KeyCode::Char('b')),
                press(KeyCode::Backspace),
            ],
        );
        assert_eq!(text, "a");
        assert_eq!(outcomes[0], KeyOutcome::Ignore);
        assert_eq!(outcomes[3], KeyOutcome::Erase);
    }

    #[test]
    fn test_ctrl_c_aborts() {
        let mut line = LineBuffer::new(Echo::Plain);
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(line.apply(key), KeyOutcome::Abort);
        assert!(line.into_text().is_empty());
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut line = LineBuffer::new(Echo::Plain);
        let key = KeyEvent::new_with_kind(KeyCode::Char('a'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(line.apply(key), KeyOutcome::Ignore);
        assert!(line.into_text().is_empty());
    }
}
