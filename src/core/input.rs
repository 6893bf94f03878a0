//! Line input state machine
//!
//! Owns the typed line and the single outstanding line request.
//!
//! ```text
//! Idle ──begin()──> Waiting ──Enter / Space on empty line──> Idle
//! ```
//!
//! The typed buffer is its own model. It is never re-derived from rendered
//! output, since notifications may land between keystrokes.

use tokio::sync::oneshot;

use crate::error::{EngineError, Result};

/// A keystroke as seen by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    /// Modifiers, navigation, function keys
    Other,
}

/// What a keystroke did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    /// A character was added to the line
    Echoed(char),
    /// A character was removed from the line
    Erased(char),
    /// The request resolved with this line
    Submitted(String),
    /// The request resolved through the "any key" shortcut
    AnyKey,
}

enum InputState {
    Idle,
    /// Holds the completion slot of the outstanding request
    Waiting(oneshot::Sender<String>),
}

pub struct InputMachine {
    state: InputState,
    buffer: String,
}

impl Default for InputMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl InputMachine {
    pub fn new() -> Self {
        Self {
            state: InputState::Idle,
            buffer: String::new(),
        }
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.state, InputState::Waiting(_))
    }

    /// Characters typed so far for the pending request
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Open a line request.
    ///
    /// Only one request may be outstanding; a second one is a caller bug.
    pub fn begin(&mut self) -> Result<oneshot::Receiver<String>> {
        if self.is_waiting() {
            tracing::warn!("Rejected line request: another request is still waiting");
            return Err(EngineError::InputPending);
        }
        let (tx, rx) = oneshot::channel();
        self.state = InputState::Waiting(tx);
        self.buffer.clear();
        Ok(rx)
    }

    /// Feed one keystroke.
    pub fn press(&mut self, key: Key) -> KeyOutcome {
        if !self.is_waiting() {
            return KeyOutcome::Ignored;
        }

        match key {
            Key::Char(' ') if self.buffer.is_empty() => match self.resolve(String::new()) {
                Ok(()) => KeyOutcome::AnyKey,
                Err(_) => KeyOutcome::Ignored,
            },
            Key::Char(ch) if !ch.is_control() => {
                self.buffer.push(ch);
                KeyOutcome::Echoed(ch)
            }
            Key::Backspace => self.buffer.pop().map_or(KeyOutcome::Ignored, KeyOutcome::Erased),
            Key::Enter => {
                let line = std::mem::take(&mut self.buffer);
                match self.resolve(line.clone()) {
                    Ok(()) => KeyOutcome::Submitted(line),
                    Err(_) => KeyOutcome::Ignored,
                }
            }
            Key::Char(_) | Key::Other => KeyOutcome::Ignored,
        }
    }

    /// Resolve the outstanding request with `line`.
    ///
    /// The completion slot is taken on the first call, so a second call fails
    /// with [`EngineError::AlreadyResolved`] instead of completing twice.
    pub fn resolve(&mut self, line: String) -> Result<()> {
        match std::mem::replace(&mut self.state, InputState::Idle) {
            InputState::Waiting(tx) => {
                self.buffer.clear();
                if tx.send(line).is_err() {
                    tracing::debug!("Line request was abandoned before it resolved");
                }
                Ok(())
            }
            InputState::Idle => {
                tracing::warn!("Attempted to resolve a line request that already resolved");
                Err(EngineError::AlreadyResolved)
            }
        }
    }
}
