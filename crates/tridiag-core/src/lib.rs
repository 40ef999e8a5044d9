//! Core data model and numerical policy for batched tridiagonal solves.
//!
//! - [`batch`] - systems, batches and their read-only / solution views
//! - [`layout`] - shapes and memory layouts
//! - [`thomas`] - elimination kernels and the sequential reference solver
//! - [`validate`] - elementwise equivalence checks
//! - [`generator`] - deterministic problem generators
//! - [`oracle`] - dense LU cross-check

pub mod batch;
pub mod error;
pub mod generator;
pub mod layout;
pub mod oracle;
pub mod thomas;
pub mod validate;

pub use batch::{Batch, CoefficientView, Entry, Solution, SolutionView, System};
pub use error::{Error, Result};
pub use generator::{DEFAULT_LEVELS, HeatDiffusionGenerator, ProblemGenerator, ReplicatedGenerator};
pub use layout::{Layout, Shape};
pub use oracle::{DenseOracle, OracleSolution};
pub use thomas::{RowIo, solve_batch, solve_system, sweep};
pub use validate::{DEFAULT_TOLERANCE, ValidationResult, compare, compare_default};
