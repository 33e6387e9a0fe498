//! Outbound door events.
//!
//! The [`DoorController`](crate::door::DoorController) emits these through
//! its [`EventBroadcaster`](crate::events::EventBroadcaster). Subscribers
//! on the other side decide what to do with them — publish a state topic,
//! log the button press, etc. Events are ephemeral; nothing is persisted.

use crate::door::DoorState;

/// Events emitted by a door controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorEvent {
    /// The sensor line settled after an edge; carries the freshly re-read
    /// state. Emitted per debounced edge, even when the state matches the
    /// previously reported value.
    StateChanged(DoorState),

    /// The wall button line settled after an edge. No payload.
    ButtonPressed,
}

impl DoorEvent {
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::StateChanged(_) => EventKind::StateChanged,
            Self::ButtonPressed => EventKind::ButtonPressed,
        }
    }
}

/// Subscription discriminant for [`DoorEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    StateChanged,
    ButtonPressed,
}
