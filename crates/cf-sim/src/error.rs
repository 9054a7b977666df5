//! Error types for simulation operations.

use thiserror::Error;

/// Errors that abort a simulation before or outside integration.
///
/// Integration failures (step size underflow, step budget) are not errors;
/// they are reported through `Solution::success`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Model error: {message}")]
    Model { message: String },

    #[error("State dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<cf_core::CfError> for SimError {
    fn from(e: cf_core::CfError) -> Self {
        SimError::Model {
            message: e.to_string(),
        }
    }
}
