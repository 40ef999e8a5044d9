//! Error types for batched solves.

use thiserror::Error;

/// Errors that can occur before a batched solve is dispatched.
///
/// Once a dispatch starts it runs to completion; there is no partial failure.
#[derive(Debug, Error)]
pub enum BatchedSolveError {
    /// Per-team scratch does not fit the local-memory budget.
    #[error("Team scratch of {required} bytes exceeds the local-memory budget of {budget} bytes")]
    ResourceExceeded { required: usize, budget: usize },

    /// Error from the batch data model.
    #[error("Batch error: {0}")]
    Core(#[from] tridiag_core::Error),
}

/// Result type for batched solve operations.
pub type Result<T> = std::result::Result<T, BatchedSolveError>;
