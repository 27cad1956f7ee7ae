//! Error types raised by the simulation engine.
use thiserror::Error;

use crate::aircraft::AircraftId;
use crate::config::ConfigError;
use crate::port::PortId;

/// Errors raised when the engine is driven outside its contract.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("expected {expected} actions (one per aircraft), got {got}")]
    ActionCount { expected: usize, got: usize },
    #[error("unknown port {0}")]
    UnknownPort(PortId),
    #[error("unknown port code {0:?}")]
    UnknownPortCode(String),
    #[error("unknown aircraft {0}")]
    UnknownAircraft(AircraftId),
    #[error("unknown aircraft model {model:?} for aircraft {aircraft}")]
    UnknownModel { aircraft: AircraftId, model: String },
    #[error("action index {index} out of range (expected < {choices})")]
    ActionIndex { index: usize, choices: usize },
    #[error("episode finished at tick {tick}; call reset before stepping again")]
    EpisodeFinished { tick: u32 },
    #[error("simulation needs at least {min} ports, got {got}")]
    TooFewPorts { min: usize, got: usize },
    #[error("simulation needs at least one aircraft")]
    EmptyFleet,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while parsing reference data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("malformed reference data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("port {code:?} has invalid coordinate ({latitude}, {longitude})")]
    Coordinate {
        code: String,
        latitude: f64,
        longitude: f64,
    },
    #[error("duplicate port code {0:?}")]
    DuplicatePort(String),
    #[error("aircraft model {model:?} has invalid {field} {value}")]
    Model {
        model: String,
        field: &'static str,
        value: f64,
    },
}
