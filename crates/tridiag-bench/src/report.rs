//! Benchmark reports.

use std::fmt::Write;
use std::time::Duration;

use serde::Serialize;
use tridiag_batched::StrategyKind;
use tridiag_core::ValidationResult;

use crate::config::BenchmarkConfig;

/// Timing of one strategy over the timed repetitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub strategy: StrategyKind,
    /// Number of systems (N).
    pub rows: usize,
    /// Levels per system (K).
    pub levels: usize,
    pub repetitions: usize,
    /// Wall-clock time between the fences around the timed region.
    pub elapsed: Duration,
    /// `elapsed / repetitions`.
    pub time_per_iteration: Duration,
    /// Parallel dispatches issued by one solve.
    pub dispatches: usize,
    /// Comparison against the sequential reference, when requested.
    pub validation: Option<ValidationResult>,
}

impl ExecutionReport {
    /// Time per iteration in seconds.
    pub fn seconds_per_iteration(&self) -> f64 {
        self.time_per_iteration.as_secs_f64()
    }
}

/// Result of one harness run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub config: BenchmarkConfig,
    /// Generator that produced the batch.
    pub generator: String,
    /// Worker count of the pool the strategies ran on.
    pub threads: usize,
    /// One entry per benchmarked strategy, range first.
    pub executions: Vec<ExecutionReport>,
    /// `time_per_iteration(range) / time_per_iteration(team)` when both ran.
    pub speedup: Option<f64>,
}

impl BenchmarkReport {
    pub fn execution(&self, kind: StrategyKind) -> Option<&ExecutionReport> {
        self.executions.iter().find(|e| e.strategy == kind)
    }

    /// `true` unless some requested validation failed.
    pub fn passed(&self) -> bool {
        self.executions
            .iter()
            .filter_map(|e| e.validation.as_ref())
            .all(|v| v.passed)
    }

    /// Human-readable summary.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Batched tridiagonal benchmark: N = {}, K = {}, R = {}, warmup = {}, layout = {}, threads = {}",
            self.config.rows,
            self.config.levels,
            self.config.repetitions,
            self.config.warmup,
            self.config.layout,
            self.threads
        );

        for e in &self.executions {
            let _ = writeln!(
                out,
                "  {:<6} {:>12.6} s total  {:>12.6e} s/iter  {:>5} dispatches/solve",
                e.strategy.name(),
                e.elapsed.as_secs_f64(),
                e.seconds_per_iteration(),
                e.dispatches
            );
            if let Some(v) = &e.validation {
                let _ = writeln!(out, "         {}", v.to_text());
            }
        }

        if let Some(speedup) = self.speedup {
            let _ = writeln!(out, "  Speedup (range / team): {:.2}x", speedup);
        }
        out
    }
}

/// `range / team`, or `None` if the team time is zero.
pub fn speedup(range: &ExecutionReport, team: &ExecutionReport) -> Option<f64> {
    let team_secs = team.seconds_per_iteration();
    if team_secs > 0.0 {
        Some(range.seconds_per_iteration() / team_secs)
    } else {
        None
    }
}
