//! Error types for batch construction and comparison.

use thiserror::Error;

use crate::layout::Shape;

/// Errors raised by the batch data model and the equivalence validator.
///
/// A zero pivot is deliberately absent: the kernels absorb it by substituting
/// defined zeros, so it never surfaces as an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A batch or system was built from inconsistent or empty arrays.
    #[error("Invalid dimensions: {0}")]
    InvalidDimension(String),

    /// Two solutions of different shape were compared.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: Shape, actual: Shape },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
