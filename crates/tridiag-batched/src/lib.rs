//! Parallel batched Thomas solvers.
//!
//! Two strategies over the same [`Dispatcher`]:
//! - [`BatchedRangeSolver`] - one dispatch per recurrence stage, parallel over rows
//! - [`BatchedTeamSolver`] - one dispatch per solve, one team per row
//!
//! Both produce results bitwise equal to [`tridiag_core::solve_batch`].

pub mod dispatch;
pub mod error;
pub mod range;
pub mod scratch;
pub mod solver;
pub mod team;

pub use dispatch::{DEFAULT_TEAM_SCRATCH_BUDGET, DisjointRows, DispatchConfig, Dispatcher, RowMut};
pub use error::{BatchedSolveError, Result};
pub use range::BatchedRangeSolver;
pub use scratch::{RangeScratch, ScratchArena, TeamScratch, team_scratch_bytes};
pub use solver::{BatchSolver, SequentialSolver, StrategyKind};
pub use team::BatchedTeamSolver;
