//! Inbound command vocabulary and validation.
//!
//! The transport layer hands us arbitrary payload strings; [`validate`]
//! is the only way to obtain a [`Command`]. Anything outside the four
//! accepted tokens is a rejection — an expected, loggable outcome for the
//! caller, not a fault.

use std::fmt;

/// A validated door command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Step,
    Stop,
}

impl Command {
    /// Canonical wire token for this command.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
            Self::Step => "STEP",
            Self::Stop => "STOP",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a raw payload and map it into the command set.
///
/// Surrounding whitespace is trimmed and the token upper-cased; the result
/// must then be exactly one of `OPEN`, `CLOSE`, `STEP`, `STOP`.
pub fn validate(raw: &str) -> Option<Command> {
    match raw.trim().to_uppercase().as_str() {
        "OPEN" => Some(Command::Open),
        "CLOSE" => Some(Command::Close),
        "STEP" => Some(Command::Step),
        "STOP" => Some(Command::Stop),
        _ => None,
    }
}
