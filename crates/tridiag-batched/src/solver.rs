//! Strategy trait and selection.

use std::fmt;

use serde::{Deserialize, Serialize};
use tridiag_core::{Batch, Shape};

use crate::dispatch::DispatchConfig;
use crate::error::Result;
use crate::range::BatchedRangeSolver;
use crate::team::BatchedTeamSolver;

/// A strategy that solves every row of a batch in place.
///
/// Implementations must leave `batch.rhs()` bitwise equal to what
/// [`tridiag_core::solve_batch`] produces for the same input.
pub trait BatchSolver: Send {
    /// Overwrite the batch's right-hand side with the solution.
    fn solve(&mut self, batch: &mut Batch) -> Result<()>;

    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Dispatches one call to [`solve`](Self::solve) issues for `shape`.
    fn dispatches_per_solve(&self, shape: Shape) -> usize;

    /// Block until all work issued by this solver has completed.
    fn fence(&self) {}
}

/// Available solve strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Single-threaded reference, row after row.
    Sequential,
    /// One dispatch per recurrence stage (`2 * levels` per solve).
    Range,
    /// One dispatch for the whole batch, one team per row.
    Team,
}

impl StrategyKind {
    /// Parse a strategy name (case-insensitive).
    ///
    /// Accepts `"sequential"`/`"reference"`, `"range"`/`"naive"` and
    /// `"team"`/`"optimized"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "sequential" | "reference" | "serial" => Some(Self::Sequential),
            "range" | "naive" | "multi-dispatch" => Some(Self::Range),
            "team" | "optimized" | "single-dispatch" => Some(Self::Team),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Range => "range",
            Self::Team => "team",
        }
    }

    /// Build a solver for this strategy.
    pub fn create(self, config: DispatchConfig) -> Box<dyn BatchSolver> {
        match self {
            Self::Sequential => Box::new(SequentialSolver::new()),
            Self::Range => Box::new(BatchedRangeSolver::new(config)),
            Self::Team => Box::new(BatchedTeamSolver::new(config)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// [`tridiag_core::solve_batch`] behind the [`BatchSolver`] interface.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialSolver {
    zero_pivots: usize,
}

impl SequentialSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero pivots absorbed by the most recent solve.
    pub fn zero_pivots(&self) -> usize {
        self.zero_pivots
    }
}

impl BatchSolver for SequentialSolver {
    fn solve(&mut self, batch: &mut Batch) -> Result<()> {
        self.zero_pivots = tridiag_core::solve_batch(batch);
        Ok(())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Sequential
    }

    fn dispatches_per_solve(&self, _shape: Shape) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tridiag_core::{HeatDiffusionGenerator, Layout, ProblemGenerator, System};

    #[test]
    fn test_strategy_from_name() {
        assert_eq!(StrategyKind::from_name("range"), Some(StrategyKind::Range));
        assert_eq!(StrategyKind::from_name("NAIVE"), Some(StrategyKind::Range));
        assert_eq!(StrategyKind::from_name("team"), Some(StrategyKind::Team));
        assert_eq!(StrategyKind::from_name("optimized"), Some(StrategyKind::Team));
        assert_eq!(
            StrategyKind::from_name("Sequential"),
            Some(StrategyKind::Sequential)
        );
        assert_eq!(StrategyKind::from_name("cusparse"), None);
    }

    #[test]
    fn test_strategy_name_round_trips() {
        for kind in [StrategyKind::Sequential, StrategyKind::Range, StrategyKind::Team] {
            assert_eq!(StrategyKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.to_string(), kind.name());
        }
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&StrategyKind::Team).unwrap();
        assert_eq!(json, "\"team\"");
        let back: StrategyKind = serde_json::from_str("\"range\"").unwrap();
        assert_eq!(back, StrategyKind::Range);
    }

    #[test]
    fn test_created_solvers_agree() {
        let batch = HeatDiffusionGenerator::default()
            .generate(23, 19, Layout::LevelFastest)
            .unwrap();
        let mut outputs = Vec::new();
        for kind in [StrategyKind::Sequential, StrategyKind::Range, StrategyKind::Team] {
            let mut solver = kind.create(DispatchConfig::default());
            assert_eq!(solver.kind(), kind);
            let mut solved = batch.clone();
            solver.solve(&mut solved).unwrap();
            solver.fence();
            outputs.push(solved);
        }
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0], outputs[2]);
    }

    #[test]
    fn test_dispatches_per_solve() {
        let shape = Shape::new(100, 50);
        let config = DispatchConfig::default();
        assert_eq!(StrategyKind::Sequential.create(config.clone()).dispatches_per_solve(shape), 0);
        assert_eq!(StrategyKind::Range.create(config.clone()).dispatches_per_solve(shape), 100);
        assert_eq!(StrategyKind::Team.create(config).dispatches_per_solve(shape), 1);
    }

    #[test]
    fn test_sequential_reports_zero_pivots() {
        let sys = System::new(
            vec![0.0, 1.0, 1.0],
            vec![0.0, 1.0, 1.0],
            vec![1.0, 1.0, 0.0],
            vec![1.0, 1.0, 1.0],
        )
        .unwrap();
        let mut batch = Batch::replicate(&sys, 3, Layout::RowFastest).unwrap();
        let mut solver = SequentialSolver::new();
        solver.solve(&mut batch).unwrap();
        assert!(solver.zero_pivots() >= 3);
        assert!(batch.rhs().iter().all(|v| v.is_finite()));
    }
}
