//! Door controller — maps physical line levels to logical door semantics.
//!
//! One [`DoorController`] owns one door's configuration, its claimed
//! hardware lines, and the debounce workers for the sensor and button
//! inputs. It holds no cached door state: [`DoorController::state`] reads
//! the sensor line on every call.
//!
//! ```text
//!  edge ──▶ capability debounce ──▶ channel ──▶ worker: settle, re-read
//!                                                  │
//!                                                  ▼
//!                                          EventBroadcaster
//! ```
//!
//! The underlying opener motor is a single-button toggle: `open`, `close`
//! and `step` all pulse the same step relay and differ only in their state
//! precondition. `stop` drives a separate relay and is unconditional so it
//! stays reachable during any motion state.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, select};
use embedded_hal::digital::PinState;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::events::DoorEvent;
use crate::app::ports::{EdgeNotification, GpioPort, LineHandle, PullPolicy};
use crate::config::DoorConfig;
use crate::error::{Error, Result};
use crate::events::EventBroadcaster;

/// How long a relay pulse holds the active level — mimics a human
/// holding the opener button.
pub const PULSE_WIDTH: Duration = Duration::from_millis(200);

/// Settle delay after a sensor edge before the authoritative re-read.
/// Absorbs mechanical-switch bounce the capability's hint missed.
pub const SENSOR_SETTLE: Duration = Duration::from_millis(200);

/// Settle delay after a button edge.
pub const BUTTON_SETTLE: Duration = Duration::from_millis(100);

/// Debounce hints handed to the capability when registering edge watches.
const SENSOR_DEBOUNCE_HINT: Duration = Duration::from_millis(300);
const BUTTON_DEBOUNCE_HINT: Duration = Duration::from_millis(100);

/// Pending edge notifications per watched line before the capability
/// starts dropping them.
const EDGE_QUEUE_CAP: usize = 32;

// ───────────────────────────────────────────────────────────────
// Door state
// ───────────────────────────────────────────────────────────────

/// Logical door state, derived from a fresh sensor read at every query.
///
/// `Unknown` means the read itself failed; a door mid-travel still reports
/// whichever side of the sensor it is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
    Unknown,
}

impl DoorState {
    /// Wire vocabulary used on state topics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───────────────────────────────────────────────────────────────
// Shared core
// ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct DoorLines {
    stop: LineHandle,
    open: LineHandle,
    close: LineHandle,
    step: LineHandle,
    sensor: LineHandle,
    button: LineHandle,
}

/// State shared between the controller handle and its debounce workers.
struct DoorShared<P> {
    config: DoorConfig,
    gpio: Mutex<P>,
    lines: DoorLines,
    /// Serializes relay pulses for this door; two concurrent commands must
    /// never overlap their activations.
    pulse_gate: Mutex<()>,
    events: EventBroadcaster,
    released: AtomicBool,
}

impl<P: GpioPort> DoorShared<P> {
    fn gpio(&self) -> MutexGuard<'_, P> {
        self.gpio.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the sensor line and derive the logical state. Raw low reads as
    /// closed regardless of polarity mode — the mode only describes which
    /// wiring produces which raw level. Read failures degrade to `Unknown`;
    /// the controller stays responsive with a dead sensor.
    fn read_sensor(&self) -> DoorState {
        match self.gpio().read(self.lines.sensor) {
            Ok(level) => {
                debug!("state value {level:?} for door {}", self.config.id);
                match level {
                    PinState::Low => DoorState::Closed,
                    PinState::High => DoorState::Open,
                }
            }
            Err(e) => {
                error!(
                    "error reading state line {} for door {}: {e}",
                    self.lines.sensor.line(),
                    self.config.id
                );
                DoorState::Unknown
            }
        }
    }

    /// Hold `relay` at the active level for [`PULSE_WIDTH`], then restore
    /// the rest level. Blocks the calling thread for the pulse duration.
    fn pulse(&self, role: &'static str, relay: LineHandle) {
        let _gate = self.pulse_gate.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = self.gpio().write(relay, self.config.relay_active_level()) {
            error!("failed to activate {role} relay for door {}: {e}", self.config.id);
            return;
        }
        thread::sleep(PULSE_WIDTH);
        if let Err(e) = self.gpio().write(relay, self.config.relay_rest_level()) {
            error!("failed to restore {role} relay for door {}: {e}", self.config.id);
        }
    }

    /// Rest every relay and release all claimed lines. Runs at most once
    /// per door; later calls are no-ops.
    fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let rest = self.config.relay_rest_level();
        let mut gpio = self.gpio();
        for (role, line) in [
            ("stop", self.lines.stop),
            ("open", self.lines.open),
            ("close", self.lines.close),
            ("step", self.lines.step),
        ] {
            if let Err(e) = gpio.write(line, rest) {
                debug!(
                    "could not rest {role} relay for door {} during release: {e}",
                    self.config.id
                );
            }
        }
        gpio.release_all();
        info!("released hardware lines for door {}", self.config.id);
    }
}

// ───────────────────────────────────────────────────────────────
// Debounce workers
// ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum WatchedLine {
    Sensor,
    Button,
}

/// Per-line worker: consumes debounced edge notifications, waits the settle
/// delay, then emits the corresponding event. Exits when the shutdown
/// channel closes or the capability drops its edge sender.
fn debounce_worker<P: GpioPort>(
    shared: &DoorShared<P>,
    which: WatchedLine,
    edges: &Receiver<EdgeNotification>,
    shutdown: &Receiver<()>,
) {
    loop {
        select! {
            recv(edges) -> msg => {
                if msg.is_err() {
                    break;
                }
                match which {
                    WatchedLine::Sensor => {
                        thread::sleep(SENSOR_SETTLE);
                        let state = shared.read_sensor();
                        debug!("sensor edge settled for door {}: {state}", shared.config.id);
                        shared.events.fire(&DoorEvent::StateChanged(state));
                    }
                    WatchedLine::Button => {
                        thread::sleep(BUTTON_SETTLE);
                        debug!("button edge settled for door {}", shared.config.id);
                        shared.events.fire(&DoorEvent::ButtonPressed);
                    }
                }
            }
            recv(shutdown) -> _msg => break,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// DoorController
// ───────────────────────────────────────────────────────────────

/// Controller for one physical door.
///
/// Constructed once per configured door at startup; lines are claimed for
/// the controller's lifetime and released exactly once on shutdown or drop.
pub struct DoorController<P: GpioPort + Send + 'static> {
    shared: Arc<DoorShared<P>>,
    workers: Vec<JoinHandle<()>>,
    shutdown_tx: Option<Sender<()>>,
}

impl<P: GpioPort + Send + 'static> fmt::Debug for DoorController<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoorController")
            .field("door_id", &self.shared.config.id)
            .finish_non_exhaustive()
    }
}

impl<P: GpioPort + Send + 'static> DoorController<P> {
    /// Validate the config, claim all six lines, register edge watches and
    /// spawn the debounce workers.
    ///
    /// On any bind failure every line already claimed for this door is
    /// released before the error propagates — no partial leaks.
    pub fn new(config: DoorConfig, mut gpio: P) -> Result<Self> {
        config.validate()?;

        let bound = Self::bind_lines(&config, &mut gpio);
        let (lines, sensor_rx, button_rx) = match bound {
            Ok(b) => b,
            Err(e) => {
                gpio.release_all();
                return Err(e);
            }
        };
        info!("bound hardware lines for door {}", config.id);

        let shared = Arc::new(DoorShared {
            config,
            gpio: Mutex::new(gpio),
            lines,
            pulse_gate: Mutex::new(()),
            events: EventBroadcaster::new(),
            released: AtomicBool::new(false),
        });

        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let workers = vec![
            spawn_worker(&shared, WatchedLine::Sensor, sensor_rx, shutdown_rx.clone()),
            spawn_worker(&shared, WatchedLine::Button, button_rx, shutdown_rx),
        ];

        Ok(Self {
            shared,
            workers,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Claim outputs at the rest level, inputs with pull-up biasing, and
    /// register both edge watches. Ownership of the claims stays with
    /// `gpio`; the caller rolls back on error.
    #[allow(clippy::type_complexity)]
    fn bind_lines(
        config: &DoorConfig,
        gpio: &mut P,
    ) -> Result<(DoorLines, Receiver<EdgeNotification>, Receiver<EdgeNotification>)> {
        let rest = config.relay_rest_level();
        let bind_err = |role: &'static str, line: u32| {
            let door = config.id.clone();
            move |source| Error::HardwareBind { door, role, line, source }
        };

        let stop = gpio
            .configure_output(config.relay_stop, rest)
            .map_err(bind_err("stop relay", config.relay_stop))?;
        let open = gpio
            .configure_output(config.relay_open, rest)
            .map_err(bind_err("open relay", config.relay_open))?;
        let close = gpio
            .configure_output(config.relay_close, rest)
            .map_err(bind_err("close relay", config.relay_close))?;
        let step = gpio
            .configure_output(config.relay_step, rest)
            .map_err(bind_err("step relay", config.relay_step))?;
        let sensor = gpio
            .configure_input(config.sensor, PullPolicy::PullUp)
            .map_err(bind_err("state sensor", config.sensor))?;
        let button = gpio
            .configure_input(config.button, PullPolicy::PullUp)
            .map_err(bind_err("button", config.button))?;

        let (sensor_tx, sensor_rx) = bounded(EDGE_QUEUE_CAP);
        let (button_tx, button_rx) = bounded(EDGE_QUEUE_CAP);
        gpio.watch_edges(sensor, SENSOR_DEBOUNCE_HINT, sensor_tx)
            .map_err(bind_err("state sensor watch", config.sensor))?;
        gpio.watch_edges(button, BUTTON_DEBOUNCE_HINT, button_tx)
            .map_err(bind_err("button watch", config.button))?;

        let lines = DoorLines { stop, open, close, step, sensor, button };
        Ok((lines, sensor_rx, button_rx))
    }

    // ── Queries ───────────────────────────────────────────────

    /// Stable identifier of this door.
    pub fn id(&self) -> &str {
        &self.shared.config.id
    }

    pub fn config(&self) -> &DoorConfig {
        &self.shared.config
    }

    /// Subscription point for this door's events.
    pub fn events(&self) -> &EventBroadcaster {
        &self.shared.events
    }

    /// Current logical state, read from the sensor line right now.
    /// Idempotent; no side effects beyond a log line.
    pub fn state(&self) -> DoorState {
        self.shared.read_sensor()
    }

    /// Raw level of the button line (`true` = high). No debounce is applied
    /// at read time; debounce only gates event emission.
    pub fn button_state(&self) -> bool {
        match self.shared.gpio().read(self.shared.lines.button) {
            Ok(level) => level == PinState::High,
            Err(e) => {
                warn!(
                    "error reading button line {} for door {}: {e}",
                    self.shared.lines.button.line(),
                    self.id()
                );
                false
            }
        }
    }

    // ── Commands ──────────────────────────────────────────────
    //
    // Open, close and step all drive the step relay; only the precondition
    // differs per logical intent. Wrong-precondition calls are silent
    // no-ops here; the dispatcher is the layer that logs the reason.

    /// Pulse the step relay if the door is currently closed.
    pub fn open(&self) {
        if self.state() == DoorState::Closed {
            self.shared.pulse("step", self.shared.lines.step);
        }
    }

    /// Pulse the step relay if the door is currently open.
    pub fn close(&self) {
        if self.state() == DoorState::Open {
            self.shared.pulse("step", self.shared.lines.step);
        }
    }

    /// Pulse the step relay if the door is currently closed.
    pub fn step(&self) {
        if self.state() == DoorState::Closed {
            self.shared.pulse("step", self.shared.lines.step);
        }
    }

    /// Pulse the stop relay unconditionally — must stay reachable during
    /// any motion state, including `Unknown`.
    pub fn stop(&self) {
        self.shared.pulse("stop", self.shared.lines.stop);
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Stop the debounce workers and release every claimed line.
    /// Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            drop(tx);
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        self.shared.release();
    }
}

impl<P: GpioPort + Send + 'static> Drop for DoorController<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_worker<P: GpioPort + Send + 'static>(
    shared: &Arc<DoorShared<P>>,
    which: WatchedLine,
    edges: Receiver<EdgeNotification>,
    shutdown: Receiver<()>,
) -> JoinHandle<()> {
    let shared = Arc::clone(shared);
    thread::spawn(move || debounce_worker(&shared, which, &edges, &shutdown))
}
