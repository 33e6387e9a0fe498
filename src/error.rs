//! Unified error types for the garagepi core.
//!
//! Only genuinely fatal conditions surface here: a door whose lines cannot
//! be claimed, or a configuration that fails validation. Degraded-but-live
//! conditions (sensor read failures, rejected commands, precondition
//! misses) are deliberately *not* errors — they map to `DoorState::Unknown`,
//! a `None` from the validator, or a logged no-op.

use thiserror::Error;

use crate::app::ports::GpioError;

/// Every fatal operation in the crate funnels into this type.
#[derive(Debug, Error)]
pub enum Error {
    /// A hardware line could not be claimed at startup. Fatal for the
    /// failing door only; the controller rolls back any lines it already
    /// claimed before propagating this.
    #[error("door {door}: failed to bind {role} line {line}: {source}")]
    HardwareBind {
        door: String,
        role: &'static str,
        line: u32,
        source: GpioError,
    },

    /// Configuration is invalid (duplicate line assignment, empty id,
    /// unparseable document).
    #[error("invalid door config: {0}")]
    Config(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;
