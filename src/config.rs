//! Per-door configuration.
//!
//! One [`DoorConfig`] describes a single physical door: its identifier,
//! the six line bindings, and the two wiring flags. Field names follow the
//! YAML vocabulary of existing deployments (`relay_stop`, `state`,
//! `invert_relay`, ...), so a door block deserializes unchanged. Immutable
//! after construction; the controller takes it by value.

use embedded_hal::digital::PinState;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the position sensor's physical idle state maps to door state.
///
/// This documents the wiring; it does not branch the read mapping. A raw
/// low level always reads as closed — the mode only determines which
/// physical door position produces that raw level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarityMode {
    #[default]
    NormallyOpen,
    NormallyClosed,
}

/// Configuration for one garage door.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorConfig {
    /// Stable key identifying this door in logs and topics.
    pub id: String,

    // --- Relay output lines ---
    pub relay_stop: u32,
    pub relay_open: u32,
    pub relay_close: u32,
    pub relay_step: u32,

    // --- Input lines ---
    /// Door position sensor line (YAML key `state`).
    #[serde(rename = "state")]
    pub sensor: u32,
    /// Manual wall-button line.
    pub button: u32,

    // --- Wiring flags ---
    #[serde(default)]
    pub state_mode: PolarityMode,
    /// Whether the relay board is active-low.
    #[serde(default)]
    pub invert_relay: bool,
}

impl DoorConfig {
    /// Parse a single door block from YAML and validate it.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot map onto real hardware: empty ids and
    /// line numbers shared between bindings.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Config("door id must not be empty".into()));
        }
        let lines = [
            ("relay_stop", self.relay_stop),
            ("relay_open", self.relay_open),
            ("relay_close", self.relay_close),
            ("relay_step", self.relay_step),
            ("state", self.sensor),
            ("button", self.button),
        ];
        for (i, &(name_a, line_a)) in lines.iter().enumerate() {
            for &(name_b, line_b) in &lines[i + 1..] {
                if line_a == line_b {
                    return Err(Error::Config(format!(
                        "door {}: {name_a} and {name_b} are both assigned line {line_a}",
                        self.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Rest (inactive) level for every relay line.
    pub fn relay_rest_level(&self) -> PinState {
        if self.invert_relay {
            PinState::High
        } else {
            PinState::Low
        }
    }

    /// Active level used while a relay pulse is held.
    pub fn relay_active_level(&self) -> PinState {
        if self.invert_relay {
            PinState::Low
        } else {
            PinState::High
        }
    }
}
