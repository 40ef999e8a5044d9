//! Single-dispatch strategy: one team per row, recurrence inside the team.
//!
//! The whole batch is solved by one dispatch. The outer level assigns row `i`
//! to team `i`; the inner level runs the forward and backward sweeps of that
//! row sequentially against the team's private `2 * levels` scratch, so no
//! barrier is needed between recurrence steps. Scratch must fit
//! [`DispatchConfig::team_scratch_budget`]; the check happens before any work
//! is dispatched.

use tridiag_core::thomas::{self, forward_first, forward_step};
use tridiag_core::{Batch, CoefficientView, RowIo, Shape};

use crate::dispatch::{DisjointRows, DispatchConfig, Dispatcher, RowMut};
use crate::error::{BatchedSolveError, Result};
use crate::scratch::team_scratch_bytes;
use crate::solver::{BatchSolver, StrategyKind};

/// Batched Thomas solver with one team per row.
#[derive(Debug)]
pub struct BatchedTeamSolver {
    dispatcher: Dispatcher,
    read_only_hint: bool,
}

impl BatchedTeamSolver {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(config),
            read_only_hint: true,
        }
    }

    /// Mark `a`, `b`, `c` as read-only for the duration of the solve.
    ///
    /// With the hint, a team reads level `k + 1`'s band before eliminating
    /// level `k`. Results are identical either way.
    pub fn with_read_only_hint(mut self, enabled: bool) -> Self {
        self.read_only_hint = enabled;
        self
    }

    pub fn read_only_hint(&self) -> bool {
        self.read_only_hint
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Fail fast if one team's scratch would exceed the local-memory budget.
    pub fn check_resources(&self, shape: Shape) -> Result<()> {
        let required = team_scratch_bytes(shape.levels);
        let budget = self.dispatcher.config().team_scratch_budget;
        if required > budget {
            return Err(BatchedSolveError::ResourceExceeded { required, budget });
        }
        Ok(())
    }
}

impl BatchSolver for BatchedTeamSolver {
    fn solve(&mut self, batch: &mut Batch) -> Result<()> {
        let shape = batch.shape();
        self.check_resources(shape)?;

        let layout = batch.layout();
        let (coefficients, y) = batch.split_mut();
        let coefficients = coefficients.with_read_only_hint(self.read_only_hint);
        let rows = DisjointRows::new(y, shape, layout)?;

        self.dispatcher
            .dispatch_teams("thomas_single_dispatch", rows, |i, row, scratch| {
                let mut team_row = TeamRow::new(coefficients, row, i);
                if coefficients.read_only_hint() {
                    forward_prefetched(&team_row, scratch.c_prime, scratch.y_prime);
                } else {
                    thomas::forward_eliminate(&team_row, scratch.c_prime, scratch.y_prime);
                }
                thomas::back_substitute(&mut team_row, scratch.c_prime, scratch.y_prime);
            });
        Ok(())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Team
    }

    fn dispatches_per_solve(&self, _shape: Shape) -> usize {
        1
    }

    fn fence(&self) {
        self.dispatcher.fence();
    }
}

/// Row `i` as seen by its team: band through the shared read-only view,
/// `y` through the team's exclusive handle.
struct TeamRow<'c, 'r> {
    coefficients: CoefficientView<'c>,
    row: RowMut<'r>,
    offset: usize,
    stride: usize,
}

impl<'c, 'r> TeamRow<'c, 'r> {
    fn new(coefficients: CoefficientView<'c>, row: RowMut<'r>, index: usize) -> Self {
        let shape = coefficients.shape();
        let layout = coefficients.layout();
        Self {
            coefficients,
            row,
            offset: layout.row_offset(shape, index),
            stride: layout.level_stride(shape),
        }
    }
}

impl RowIo for TeamRow<'_, '_> {
    fn levels(&self) -> usize {
        self.row.levels()
    }

    #[inline(always)]
    fn band(&self, level: usize) -> (f64, f64, f64) {
        self.coefficients.band_at(self.offset + level * self.stride)
    }

    #[inline(always)]
    fn load(&self, level: usize) -> f64 {
        self.row.get(level)
    }

    #[inline(always)]
    fn store(&mut self, level: usize, value: f64) {
        self.row.set(level, value);
    }
}

// Same arithmetic as `thomas::forward_eliminate`, with the next level's band
// loaded one step ahead.
fn forward_prefetched(row: &TeamRow<'_, '_>, c_prime: &mut [f64], y_prime: &mut [f64]) {
    let levels = row.levels();
    let mut band = row.band(0);
    let mut ahead = if levels > 1 { row.band(1) } else { band };

    let first = forward_first(band.1, band.2, row.load(0));
    c_prime[0] = first.c_prime;
    y_prime[0] = first.y_prime;

    for k in 1..levels {
        band = ahead;
        if k + 1 < levels {
            ahead = row.band(k + 1);
        }
        let (a, b, c) = band;
        let step = forward_step(a, b, c, row.load(k), c_prime[k - 1], y_prime[k - 1]);
        c_prime[k] = step.c_prime;
        y_prime[k] = step.y_prime;
    }
}
