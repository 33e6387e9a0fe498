//! GaragePi door-control core.
//!
//! Maps a physical garage door — a relay board, a position sensor, and a
//! wall button — onto a logical state with precondition-guarded commands
//! and a typed event stream.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Transport layer (embedder)               │
//! │   subscribes to events · validates + dispatches commands │
//! │                                                          │
//! │  ───────────────── Port Trait Boundary ───────────────   │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │   DoorController (per door)                        │  │
//! │  │   pulse · debounce · derived state                 │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                         │ GpioPort                       │
//! │                    hardware lines                        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The crate holds no process-wide state: each [`door::DoorController`]
//! exclusively owns its claimed lines for its lifetime and releases them
//! exactly once on shutdown. Hardware access is injected through
//! [`app::ports::GpioPort`], so the whole core runs against a mock in
//! host-side tests.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod door;
pub mod events;

mod error;

pub use error::{Error, Result};
