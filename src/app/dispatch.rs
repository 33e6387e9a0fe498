//! Command dispatcher — precondition-checked execution with logged outcomes.
//!
//! The controller methods already no-op silently when the precondition does
//! not hold. The dispatcher re-checks the state anyway so it can log the
//! specific reason a command was ignored ("door is open, must be closed");
//! the redundancy is intentional.

use log::{info, warn};

use crate::app::commands::Command;
use crate::app::ports::GpioPort;
use crate::door::{DoorController, DoorState};

/// Apply a validated command to a door.
///
/// `Stop` always executes. The other commands execute only when the door
/// is in their required state; otherwise a warning is logged and no
/// hardware action is taken. Nothing here returns an error — rejections
/// are observable via logs only.
pub fn execute<P: GpioPort + Send + 'static>(door: &DoorController<P>, command: Command) {
    let state = door.state();
    info!(
        "Executing command {command} for door {} (current state: {state})",
        door.id()
    );

    match command {
        Command::Stop => {
            door.stop();
            info!("STOP command executed for door {}", door.id());
        }
        Command::Step => {
            if state == DoorState::Closed {
                door.step();
                info!("STEP command executed for door {}", door.id());
            } else {
                warn!(
                    "STEP command ignored - door {} is {state}, must be closed",
                    door.id()
                );
            }
        }
        Command::Open => {
            if state == DoorState::Closed {
                door.open();
                info!("OPEN command executed for door {}", door.id());
            } else {
                warn!(
                    "OPEN command ignored - door {} is {state}, must be closed",
                    door.id()
                );
            }
        }
        Command::Close => {
            if state == DoorState::Open {
                door.close();
                info!("CLOSE command executed for door {}", door.id());
            } else {
                warn!(
                    "CLOSE command ignored - door {} is {state}, must be open",
                    door.id()
                );
            }
        }
    }
}
