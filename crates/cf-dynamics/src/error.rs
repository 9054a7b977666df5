//! Error types for the dynamics core.

use cf_core::{CfError, StationId};
use cf_network::NetworkError;
use thiserror::Error;

/// Errors raised while assembling or evaluating the coupled dynamics.
///
/// Per-evaluation numeric degeneracies are never errors; they are clamped
/// inside the derivative. Only shape and configuration problems surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DynamicsError {
    #[error("State length mismatch: expected {expected}, got {got}")]
    StateLength { expected: usize, got: usize },

    #[error("State contains non-finite values")]
    NonFiniteState,

    #[error("Demand for origin '{origin}' names unknown destination '{destination}'")]
    UnknownDestination { origin: String, destination: String },

    #[error("Invalid demand for origin '{origin}': {reason}")]
    InvalidDemand {
        origin: String,
        #[source]
        reason: CfError,
    },

    #[error("Invalid parameters for station {station}: {reason}")]
    InvalidStation {
        station: StationId,
        #[source]
        reason: CfError,
    },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Core(#[from] CfError),
}

pub type DynamicsResult<T> = Result<T, DynamicsError>;
