//! Multi-dispatch strategy: one parallel dispatch per recurrence stage.
//!
//! Stage `k` of the forward sweep reads every row's stage `k - 1` output, so
//! each stage is its own dispatch over the row index and the dispatch return
//! is the barrier between stages. A full solve issues `2 * levels` dispatches:
//!
//! ```text
//! forward_sweep_first   k = 0
//! forward_sweep         k = 1 .. levels-1
//! backward_sweep_last   k = levels-1
//! backward_sweep        k = levels-2 .. 0
//! ```
//!
//! `c'` and `y'` live in a batch-shaped [`RangeScratch`] owned by the solver
//! and reused across solves of the same shape.

use rayon::prelude::*;
use tridiag_core::thomas::{backward_step, forward_first, forward_step};
use tridiag_core::{Batch, CoefficientView, Layout, Shape};

use crate::dispatch::{DispatchConfig, Dispatcher};
use crate::error::Result;
use crate::scratch::RangeScratch;
use crate::solver::{BatchSolver, StrategyKind};

/// Batched Thomas solver parallel over rows, sequential over stages.
#[derive(Debug)]
pub struct BatchedRangeSolver {
    dispatcher: Dispatcher,
    scratch: Option<RangeScratch>,
}

impl BatchedRangeSolver {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(config),
            scratch: None,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Scratch currently held, if any solve has run.
    pub fn scratch(&self) -> Option<&RangeScratch> {
        self.scratch.as_ref()
    }
}

impl BatchSolver for BatchedRangeSolver {
    fn solve(&mut self, batch: &mut Batch) -> Result<()> {
        let shape = batch.shape();
        let layout = batch.layout();
        let scratch = RangeScratch::ensure(&mut self.scratch, shape);
        let (coefficients, y) = batch.split_mut();
        let stages = Stages {
            dispatcher: &self.dispatcher,
            coefficients,
            shape,
        };

        match layout {
            Layout::RowFastest => {
                stages.forward_row_fastest(y, scratch);
                stages.backward_row_fastest(y, scratch);
            }
            Layout::LevelFastest => {
                stages.forward_level_fastest(y, scratch);
                stages.backward_level_fastest(y, scratch);
            }
        }
        Ok(())
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Range
    }

    fn dispatches_per_solve(&self, shape: Shape) -> usize {
        2 * shape.levels
    }

    fn fence(&self) {
        self.dispatcher.fence();
    }
}

struct Stages<'d, 'c> {
    dispatcher: &'d Dispatcher,
    coefficients: CoefficientView<'c>,
    shape: Shape,
}

impl Stages<'_, '_> {
    // Level k of every row is the contiguous slab [k * rows, (k + 1) * rows).
    fn forward_row_fastest(&self, y: &[f64], scratch: &mut RangeScratch) {
        let n = self.shape.rows;
        let coefficients = self.coefficients;

        let (cp0, yp0) = (&mut scratch.c_prime[..n], &mut scratch.y_prime[..n]);
        self.dispatcher.dispatch("forward_sweep_first", || {
            cp0.par_iter_mut()
                .zip(yp0.par_iter_mut())
                .enumerate()
                .for_each(|(i, (cp, yp))| {
                    let (_, b, c) = coefficients.band_at(i);
                    let e = forward_first(b, c, y[i]);
                    *cp = e.c_prime;
                    *yp = e.y_prime;
                });
        });

        for k in 1..self.shape.levels {
            let (c_done, c_rest) = scratch.c_prime.split_at_mut(k * n);
            let (y_done, y_rest) = scratch.y_prime.split_at_mut(k * n);
            let (c_prev, y_prev) = (&c_done[(k - 1) * n..], &y_done[(k - 1) * n..]);
            let (c_cur, y_cur) = (&mut c_rest[..n], &mut y_rest[..n]);
            let base = k * n;

            self.dispatcher.dispatch("forward_sweep", || {
                c_cur
                    .par_iter_mut()
                    .zip(y_cur.par_iter_mut())
                    .enumerate()
                    .for_each(|(i, (cp, yp))| {
                        let (a, b, c) = coefficients.band_at(base + i);
                        let e = forward_step(a, b, c, y[base + i], c_prev[i], y_prev[i]);
                        *cp = e.c_prime;
                        *yp = e.y_prime;
                    });
            });
        }
    }

    fn backward_row_fastest(&self, y: &mut [f64], scratch: &RangeScratch) {
        let n = self.shape.rows;
        let last = (self.shape.levels - 1) * n;

        let (y_last, yp_last) = (&mut y[last..], &scratch.y_prime[last..]);
        self.dispatcher.dispatch("backward_sweep_last", || {
            y_last
                .par_iter_mut()
                .zip(yp_last.par_iter())
                .for_each(|(y, &yp)| *y = yp);
        });

        for k in (0..self.shape.levels - 1).rev() {
            let (head, tail) = y.split_at_mut((k + 1) * n);
            let (y_cur, y_next) = (&mut head[k * n..], &tail[..n]);
            let c_prime = &scratch.c_prime[k * n..(k + 1) * n];
            let y_prime = &scratch.y_prime[k * n..(k + 1) * n];

            self.dispatcher.dispatch("backward_sweep", || {
                y_cur.par_iter_mut().enumerate().for_each(|(i, y)| {
                    *y = backward_step(y_prime[i], c_prime[i], y_next[i]);
                });
            });
        }
    }

    // Each row is the contiguous chunk [i * levels, (i + 1) * levels); a
    // stage touches one element per chunk.
    fn forward_level_fastest(&self, y: &[f64], scratch: &mut RangeScratch) {
        let levels = self.shape.levels;
        let coefficients = self.coefficients;
        let (c_prime, y_prime) = (&mut scratch.c_prime, &mut scratch.y_prime);

        self.dispatcher.dispatch("forward_sweep_first", || {
            c_prime
                .par_chunks_mut(levels)
                .zip(y_prime.par_chunks_mut(levels))
                .zip(y.par_chunks(levels))
                .enumerate()
                .for_each(|(i, ((cp, yp), rhs))| {
                    let (_, b, c) = coefficients.band_at(i * levels);
                    let e = forward_first(b, c, rhs[0]);
                    cp[0] = e.c_prime;
                    yp[0] = e.y_prime;
                });
        });

        for k in 1..levels {
            self.dispatcher.dispatch("forward_sweep", || {
                c_prime
                    .par_chunks_mut(levels)
                    .zip(y_prime.par_chunks_mut(levels))
                    .zip(y.par_chunks(levels))
                    .enumerate()
                    .for_each(|(i, ((cp, yp), rhs))| {
                        let (a, b, c) = coefficients.band_at(i * levels + k);
                        let e = forward_step(a, b, c, rhs[k], cp[k - 1], yp[k - 1]);
                        cp[k] = e.c_prime;
                        yp[k] = e.y_prime;
                    });
            });
        }
    }

    fn backward_level_fastest(&self, y: &mut [f64], scratch: &RangeScratch) {
        let levels = self.shape.levels;
        let (c_prime, y_prime) = (&scratch.c_prime, &scratch.y_prime);

        self.dispatcher.dispatch("backward_sweep_last", || {
            y.par_chunks_mut(levels)
                .zip(y_prime.par_chunks(levels))
                .for_each(|(row, yp)| row[levels - 1] = yp[levels - 1]);
        });

        for k in (0..levels - 1).rev() {
            self.dispatcher.dispatch("backward_sweep", || {
                y.par_chunks_mut(levels)
                    .zip(c_prime.par_chunks(levels))
                    .zip(y_prime.par_chunks(levels))
                    .for_each(|((row, cp), yp)| {
                        row[k] = backward_step(yp[k], cp[k], row[k + 1]);
                    });
            });
        }
    }
}
