//! Core error type and the shared function and domain types used by every solver.

pub mod types;

pub use types::*;

use thiserror::Error;

/// Solver and validation errors surfaced by the API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PdeError {
    /// Input validation error.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Inconsistent solver configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Non-convergence in an iterative algorithm.
    #[error("convergence failure: {0}")]
    ConvergenceFailure(String),
    /// Numerical issue (singular system, zero pivot, non-finite state).
    #[error("numerical error: {0}")]
    NumericalError(String),
}

impl PdeError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn numerical(msg: impl Into<String>) -> Self {
        Self::NumericalError(msg.into())
    }
}
