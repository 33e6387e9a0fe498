//! Typed publish/subscribe primitive for door events.
//!
//! ```text
//! ┌──────────────┐  fire   ┌──────────────────┐  in order  ┌───────────┐
//! │ debounce     │───────▶ │ EventBroadcaster │──────────▶ │ handlers  │
//! │ worker       │         │ (per door)       │            │ (closures)│
//! └──────────────┘         └──────────────────┘            └───────────┘
//! ```
//!
//! Handlers run synchronously on the firing context, in registration
//! order. A handler that returns an error is logged here and never blocks
//! delivery to later handlers nor crashes the emitting worker.

use std::sync::{Arc, Mutex, PoisonError};

use log::error;

use crate::app::events::{DoorEvent, EventKind};

type Handler = Arc<dyn Fn(&DoorEvent) -> anyhow::Result<()> + Send + Sync>;

/// Fan-out point for one door's events.
#[derive(Default)]
pub struct EventBroadcaster {
    handlers: Mutex<Vec<(EventKind, Handler)>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind. Handlers fire in the order
    /// they were registered.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&DoorEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.lock().push((kind, Arc::new(handler)));
    }

    /// Invoke every handler registered for this event's kind.
    ///
    /// Handlers run outside the registration lock, so a handler may itself
    /// subscribe on this broadcaster; such additions become visible on the
    /// next `fire`.
    pub fn fire(&self, event: &DoorEvent) {
        let matching: Vec<Handler> = self
            .lock()
            .iter()
            .filter(|(kind, _)| *kind == event.kind())
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in matching {
            if let Err(e) = handler(event) {
                error!("event handler failed for {event:?}: {e:#}");
            }
        }
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.lock().iter().filter(|(k, _)| *k == kind).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(EventKind, Handler)>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
