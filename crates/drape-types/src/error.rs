//! Error types for the Drape solver.
//!
//! All crates return `DrapeResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the Drape solver.
#[derive(Debug, Error)]
pub enum DrapeError {
    /// Two structures that must agree in size do not.
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// An operation was called before the system was assembled.
    #[error("Not initialized: {0}")]
    Uninitialized(String),

    /// Topology is malformed or not finalized.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The conjugate-gradient recurrence hit a non-positive or non-finite denominator.
    #[error("Solver breakdown at iteration {iteration}: {reason}")]
    SolverBreakdown { iteration: usize, reason: String },

    /// Direct factorization of the system matrix failed.
    #[error("Factorization failed: {0}")]
    Factorization(String),
}

impl DrapeError {
    /// Shorthand for a [`DrapeError::DimensionMismatch`].
    pub fn dimension(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

/// Returns `DimensionMismatch` unless `actual == expected`.
pub fn ensure_len(context: &str, expected: usize, actual: usize) -> DrapeResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DrapeError::dimension(context, expected, actual))
    }
}

/// Convenience alias for `Result<T, DrapeError>`.
pub type DrapeResult<T> = Result<T, DrapeError>;
