//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DoorController (domain)
//! ```
//!
//! A concrete digital I/O adapter (GPIO character device, HAT driver, test
//! mock) implements [`GpioPort`]. The [`DoorController`](crate::door::DoorController)
//! consumes it via generics, so the domain core never touches a specific
//! hardware binding.

use std::time::Duration;

use crossbeam_channel::Sender;
use embedded_hal::digital::PinState;
use thiserror::Error;

// ───────────────────────────────────────────────────────────────
// Line handles and biasing
// ───────────────────────────────────────────────────────────────

/// Opaque handle to a claimed line, issued by a [`GpioPort`] implementation.
///
/// The wrapped value is the line offset the handle was claimed for, so
/// adapters that address lines by offset can round-trip it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineHandle(u32);

impl LineHandle {
    pub const fn new(line: u32) -> Self {
        Self(line)
    }

    /// Line offset this handle was claimed for.
    pub const fn line(self) -> u32 {
        self.0
    }
}

/// Input biasing applied when a line is claimed for reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PullPolicy {
    /// Internal pull-up — idle level is high. Both door inputs use this.
    #[default]
    PullUp,
    PullDown,
    Floating,
}

/// Notification posted by the capability when a watched line sees an edge.
///
/// Edges within the `debounce_hint` window given to
/// [`GpioPort::watch_edges`] are collapsed by the capability; one
/// notification arrives per surviving edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeNotification {
    pub handle: LineHandle,
}

// ───────────────────────────────────────────────────────────────
// Digital I/O port (driven adapter: domain ↔ hardware lines)
// ───────────────────────────────────────────────────────────────

/// Abstract digital line access consumed by the door controller.
///
/// Implementations own the process's claim on each line. `release_all`
/// must be safe to call more than once; the controller guarantees it is
/// invoked on every exit path, including a failed partial bind.
pub trait GpioPort {
    /// Claim `line` as an output, driven to `initial` immediately.
    fn configure_output(&mut self, line: u32, initial: PinState) -> Result<LineHandle, GpioError>;

    /// Claim `line` as an input with the given biasing.
    fn configure_input(&mut self, line: u32, pull: PullPolicy) -> Result<LineHandle, GpioError>;

    /// Drive a claimed output line to `level`.
    fn write(&mut self, handle: LineHandle, level: PinState) -> Result<(), GpioError>;

    /// Read the current level of a claimed line.
    fn read(&mut self, handle: LineHandle) -> Result<PinState, GpioError>;

    /// Watch both edges of a claimed input line, posting an
    /// [`EdgeNotification`] onto `notify` per debounced edge. The
    /// `debounce_hint` tells the capability how aggressively to collapse
    /// switch chatter at the source.
    fn watch_edges(
        &mut self,
        handle: LineHandle,
        debounce_hint: Duration,
        notify: Sender<EdgeNotification>,
    ) -> Result<(), GpioError>;

    /// Release every line claimed through this port. Idempotent.
    fn release_all(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`GpioPort`] operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// The line is already claimed by this or another process.
    #[error("line {0} is already claimed")]
    LineBusy(u32),

    /// The handle does not correspond to a line claimed through this port.
    #[error("line {0} is not claimed by this port")]
    NotClaimed(u32),

    /// Edge monitoring is unavailable for this line.
    #[error("edge watch is not supported on line {0}")]
    WatchUnsupported(u32),

    /// The underlying hardware access failed.
    #[error("I/O failure on line {0}")]
    Io(u32),
}
