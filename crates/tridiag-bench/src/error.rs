//! Error types for the benchmark harness.

use thiserror::Error;
use tridiag_batched::BatchedSolveError;

/// Errors that can stop a benchmark run.
///
/// A failed equivalence check is not among them: it is reported through
/// [`tridiag_core::ValidationResult::passed`].
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Rejected benchmark parameters.
    #[error("Invalid benchmark configuration: {0}")]
    InvalidConfig(String),

    /// A strategy refused to run.
    #[error("Solve failed: {0}")]
    Solve(#[from] BatchedSolveError),

    /// Error from the batch data model.
    #[error("Batch error: {0}")]
    Core(#[from] tridiag_core::Error),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
