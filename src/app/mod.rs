//! Application layer: the command vocabulary, dispatch logic, event types,
//! and the port traits that bound the domain core.

pub mod commands;
pub mod dispatch;
pub mod events;
pub mod ports;
