//! Warm-up, timed repetitions and speedup for the batched strategies.

use std::time::Instant;

use tridiag_batched::{BatchSolver, BatchedTeamSolver, StrategyKind};
use tridiag_core::{Batch, ProblemGenerator, Shape, compare};

use crate::config::BenchmarkConfig;
use crate::error::Result;
use crate::report::{BenchmarkReport, ExecutionReport, speedup};

/// Report plus the solved batch of every benchmarked strategy.
#[derive(Debug, Clone)]
pub struct BenchmarkOutcome {
    pub report: BenchmarkReport,
    /// `(strategy, batch)` in the order of `report.executions`; `y` holds the
    /// solution.
    pub solved: Vec<(StrategyKind, Batch)>,
}

impl BenchmarkOutcome {
    pub fn batch(&self, kind: StrategyKind) -> Option<&Batch> {
        self.solved
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, batch)| batch)
    }
}

/// Build the solver a benchmark run uses for `kind`.
pub fn build_solver(kind: StrategyKind, config: &BenchmarkConfig) -> Box<dyn BatchSolver> {
    match kind {
        StrategyKind::Team => Box::new(
            BatchedTeamSolver::new(config.dispatch.clone())
                .with_read_only_hint(config.read_only_hint),
        ),
        other => other.create(config.dispatch.clone()),
    }
}

/// Run the configured benchmark on a batch from `generator`.
///
/// The batch is generated once; every strategy starts from a clone of it and
/// every repetition restores the pristine right-hand side before solving, so
/// all runs solve bit-identical inputs. The timed region is bounded by a
/// fence on each side.
pub fn run_benchmark(
    config: &BenchmarkConfig,
    generator: &dyn ProblemGenerator,
) -> Result<BenchmarkOutcome> {
    config.validate()?;
    if config.strategy.kinds().contains(&StrategyKind::Team) {
        BatchedTeamSolver::new(config.dispatch.clone())
            .check_resources(Shape::new(config.rows, config.levels))?;
    }

    let batch = generator.generate(config.rows, config.levels, config.layout)?;
    let pristine = batch.rhs().to_vec();

    let reference = match config.validate {
        Some(_) => {
            let mut reference = batch.clone();
            tridiag_core::solve_batch(&mut reference);
            Some(reference)
        }
        None => None,
    };

    let mut executions = Vec::new();
    let mut solved = Vec::new();
    for &kind in config.strategy.kinds() {
        let mut solver = build_solver(kind, config);
        let mut work = batch.clone();
        let mut execution = time_strategy(solver.as_mut(), &mut work, &pristine, config)?;

        if let (Some(tolerance), Some(reference)) = (config.validate, &reference) {
            execution.validation = Some(compare(reference.solution(), work.solution(), tolerance)?);
        }

        log::info!(
            "{}: N={} K={} R={} -> {:.6e} s/iter ({} dispatches/solve)",
            kind,
            config.rows,
            config.levels,
            config.repetitions,
            execution.seconds_per_iteration(),
            execution.dispatches
        );

        executions.push(execution);
        solved.push((kind, work));
    }

    let speedup = match (
        executions.iter().find(|e| e.strategy == StrategyKind::Range),
        executions.iter().find(|e| e.strategy == StrategyKind::Team),
    ) {
        (Some(range), Some(team)) => speedup(range, team),
        _ => None,
    };
    if let Some(s) = speedup {
        log::info!("Speedup (range / team): {:.2}x", s);
    }

    Ok(BenchmarkOutcome {
        report: BenchmarkReport {
            config: config.clone(),
            generator: generator.name().to_string(),
            threads: config.dispatch.num_threads(),
            executions,
            speedup,
        },
        solved,
    })
}

/// Warm up, then time `config.repetitions` solves of `work` between two fences.
fn time_strategy(
    solver: &mut dyn BatchSolver,
    work: &mut Batch,
    pristine: &[f64],
    config: &BenchmarkConfig,
) -> Result<ExecutionReport> {
    for _ in 0..config.warmup {
        work.set_rhs(pristine)?;
        solver.solve(work)?;
    }

    solver.fence();
    let start = Instant::now();
    for _ in 0..config.repetitions {
        work.set_rhs(pristine)?;
        solver.solve(work)?;
    }
    solver.fence();
    let elapsed = start.elapsed();

    Ok(ExecutionReport {
        strategy: solver.kind(),
        rows: config.rows,
        levels: config.levels,
        repetitions: config.repetitions,
        elapsed,
        time_per_iteration: elapsed.div_f64(config.repetitions as f64),
        dispatches: solver.dispatches_per_solve(work.shape()),
        validation: None,
    })
}
