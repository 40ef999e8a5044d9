//! Thomas algorithm kernels and the sequential reference solver.
//!
//! The three step functions here are the only place the elimination
//! arithmetic is written down. Every strategy calls them, in the same
//! operation order, so results agree bit for bit regardless of how the work
//! is dispatched.
//!
//! A zero pivot (`b[0]` or `b[k] - a[k] * c'[k-1]`) yields `c' = 0, y' = 0`
//! instead of an error. This keeps strategies comparable on the diagonally
//! dominant benchmark matrices; it is not a general remedy for singular or
//! ill-conditioned systems.

use crate::batch::{Batch, CoefficientView, System};

/// Output of one forward-elimination step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eliminated {
    /// Modified superdiagonal `c'[k]`.
    pub c_prime: f64,
    /// Modified right-hand side `y'[k]`.
    pub y_prime: f64,
    /// The pivot was exactly zero and both outputs were set to zero.
    pub zero_pivot: bool,
}

impl Eliminated {
    const ZERO_PIVOT: Eliminated = Eliminated {
        c_prime: 0.0,
        y_prime: 0.0,
        zero_pivot: true,
    };
}

/// Forward elimination at level 0.
#[inline(always)]
pub fn forward_first(b: f64, c: f64, y: f64) -> Eliminated {
    if b == 0.0 {
        return Eliminated::ZERO_PIVOT;
    }
    Eliminated {
        c_prime: c / b,
        y_prime: y / b,
        zero_pivot: false,
    }
}

/// Forward elimination at level `k > 0`, given level `k - 1`'s outputs.
#[inline(always)]
pub fn forward_step(a: f64, b: f64, c: f64, y: f64, c_prev: f64, y_prev: f64) -> Eliminated {
    let denom = b - a * c_prev;
    if denom == 0.0 {
        return Eliminated::ZERO_PIVOT;
    }
    Eliminated {
        c_prime: c / denom,
        y_prime: (y - a * y_prev) / denom,
        zero_pivot: false,
    }
}

/// Back substitution at level `k < levels - 1`.
#[inline(always)]
pub fn backward_step(y_prime: f64, c_prime: f64, y_next: f64) -> f64 {
    y_prime - c_prime * y_next
}

/// Access to one system's band and right-hand side during a sweep.
///
/// Implemented for owned systems, for rows of a batch, and for the team
/// solver's disjoint row handles.
pub trait RowIo {
    /// Number of levels in the row.
    fn levels(&self) -> usize;

    /// `(a, b, c)` at `level`.
    fn band(&self, level: usize) -> (f64, f64, f64);

    /// Current value of `y` at `level`.
    fn load(&self, level: usize) -> f64;

    /// Overwrite `y` at `level`.
    fn store(&mut self, level: usize, value: f64);
}

/// Solve one row in place using `c_prime` and `y_prime` as private scratch.
///
/// Both scratch slices must hold at least `row.levels()` elements. Returns
/// the number of zero pivots absorbed.
pub fn sweep<R>(row: &mut R, c_prime: &mut [f64], y_prime: &mut [f64]) -> usize
where
    R: RowIo + ?Sized,
{
    let zero_pivots = forward_eliminate(row, c_prime, y_prime);
    back_substitute(row, c_prime, y_prime);
    zero_pivots
}

/// Forward sweep: fill `c_prime` and `y_prime` for every level of `row`.
pub fn forward_eliminate<R>(row: &R, c_prime: &mut [f64], y_prime: &mut [f64]) -> usize
where
    R: RowIo + ?Sized,
{
    let levels = row.levels();
    let (_, b0, c0) = row.band(0);
    let first = forward_first(b0, c0, row.load(0));
    c_prime[0] = first.c_prime;
    y_prime[0] = first.y_prime;
    let mut zero_pivots = first.zero_pivot as usize;

    for k in 1..levels {
        let (a, b, c) = row.band(k);
        let step = forward_step(a, b, c, row.load(k), c_prime[k - 1], y_prime[k - 1]);
        c_prime[k] = step.c_prime;
        y_prime[k] = step.y_prime;
        zero_pivots += step.zero_pivot as usize;
    }
    zero_pivots
}

/// Backward sweep: overwrite `y` of `row` with the solution.
pub fn back_substitute<R>(row: &mut R, c_prime: &[f64], y_prime: &[f64])
where
    R: RowIo + ?Sized,
{
    let levels = row.levels();
    row.store(levels - 1, y_prime[levels - 1]);
    for k in (0..levels - 1).rev() {
        let next = row.load(k + 1);
        row.store(k, backward_step(y_prime[k], c_prime[k], next));
    }
}

impl RowIo for System {
    fn levels(&self) -> usize {
        self.b.len()
    }

    #[inline]
    fn band(&self, level: usize) -> (f64, f64, f64) {
        (self.a[level], self.b[level], self.c[level])
    }

    #[inline]
    fn load(&self, level: usize) -> f64 {
        self.y[level]
    }

    #[inline]
    fn store(&mut self, level: usize, value: f64) {
        self.y[level] = value;
    }
}

/// One row of a batch, borrowed for a sequential sweep.
pub struct BatchRow<'a, 'b> {
    coefficients: CoefficientView<'a>,
    y: &'b mut [f64],
    offset: usize,
    stride: usize,
}

impl<'a, 'b> BatchRow<'a, 'b> {
    /// Borrow row `row` of a batch whose right-hand side is `y`.
    pub fn new(coefficients: CoefficientView<'a>, y: &'b mut [f64], row: usize) -> Self {
        let layout = coefficients.layout();
        let shape = coefficients.shape();
        Self {
            coefficients,
            y,
            offset: layout.row_offset(shape, row),
            stride: layout.level_stride(shape),
        }
    }
}

impl RowIo for BatchRow<'_, '_> {
    fn levels(&self) -> usize {
        self.coefficients.shape().levels
    }

    #[inline]
    fn band(&self, level: usize) -> (f64, f64, f64) {
        self.coefficients.band_at(self.offset + level * self.stride)
    }

    #[inline]
    fn load(&self, level: usize) -> f64 {
        self.y[self.offset + level * self.stride]
    }

    #[inline]
    fn store(&mut self, level: usize, value: f64) {
        self.y[self.offset + level * self.stride] = value;
    }
}

/// Solve a single system in place. Returns the number of zero pivots absorbed.
pub fn solve_system(system: &mut System) -> usize {
    let levels = system.levels();
    let mut c_prime = vec![0.0; levels];
    let mut y_prime = vec![0.0; levels];
    sweep(system, &mut c_prime, &mut y_prime)
}

/// Solve every row of a batch in place, one row after another.
///
/// This is the single-threaded reference the parallel strategies are checked
/// against. Returns the total number of zero pivots absorbed.
pub fn solve_batch(batch: &mut Batch) -> usize {
    let rows = batch.rows();
    let levels = batch.levels();
    let (coefficients, y) = batch.split_mut();

    let mut c_prime = vec![0.0; levels];
    let mut y_prime = vec![0.0; levels];
    let mut zero_pivots = 0;
    for i in 0..rows {
        let mut row = BatchRow::new(coefficients, y, i);
        zero_pivots += sweep(&mut row, &mut c_prime, &mut y_prime);
    }

    if zero_pivots > 0 {
        log::debug!(
            "Sequential solve absorbed {} zero pivots (rows={}, levels={})",
            zero_pivots,
            rows,
            levels
        );
    }
    zero_pivots
}
