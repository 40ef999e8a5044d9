//! Benchmark and equivalence harness for batched tridiagonal solves.
//!
//! Times the range (multi-dispatch) and team (single-dispatch) strategies on
//! one generated batch, reports the range/team speedup and optionally checks
//! each strategy against the sequential reference.
//!
//! # Example
//!
//! ```
//! use tridiag_bench::{BenchmarkConfig, StrategySelection, run_benchmark};
//! use tridiag_core::HeatDiffusionGenerator;
//!
//! let config = BenchmarkConfig::new(256, 2, StrategySelection::Both)
//!     .with_levels(16)
//!     .with_validation(1e-10);
//! let outcome = run_benchmark(&config, &HeatDiffusionGenerator::default()).unwrap();
//! assert!(outcome.report.passed());
//! ```

pub mod config;
pub mod error;
pub mod harness;
pub mod report;

pub use config::{BenchmarkConfig, DEFAULT_WARMUP, StrategySelection};
pub use error::{HarnessError, Result};
pub use harness::{BenchmarkOutcome, build_solver, run_benchmark};
pub use report::{BenchmarkReport, ExecutionReport, speedup};
