//! Transient elimination storage.
//!
//! The range strategy keeps one batch-shaped buffer per solver instance and
//! reuses it across solves. The team strategy leases `2 * levels` values per
//! team from a worker-local arena; the lease ends when the team finishes.

use tridiag_core::Shape;

/// Global `c'` / `y'` storage for the range strategy.
///
/// Element `(i, k)` of either buffer is written only by row `i`'s stage `k`.
#[derive(Debug, Clone)]
pub struct RangeScratch {
    shape: Shape,
    pub(crate) c_prime: Vec<f64>,
    pub(crate) y_prime: Vec<f64>,
}

impl RangeScratch {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            c_prime: vec![0.0; shape.len()],
            y_prime: vec![0.0; shape.len()],
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Reuse `slot` if it already matches `shape`, otherwise (re)allocate it.
    pub fn ensure(slot: &mut Option<RangeScratch>, shape: Shape) -> &mut RangeScratch {
        if slot.as_ref().map(RangeScratch::shape) != Some(shape) {
            log::debug!("Allocating range scratch for batch {}", shape);
            *slot = Some(RangeScratch::new(shape));
        }
        slot.get_or_insert_with(|| RangeScratch::new(shape))
    }
}

/// Bytes of team-local scratch needed to sweep rows of `levels` unknowns.
pub const fn team_scratch_bytes(levels: usize) -> usize {
    2 * levels * std::mem::size_of::<f64>()
}

/// Worker-local backing store for team scratch.
#[derive(Debug)]
pub struct ScratchArena {
    levels: usize,
    storage: Vec<f64>,
}

impl ScratchArena {
    /// Arena able to back one team lease of `2 * levels` values at a time.
    pub fn new(levels: usize) -> Self {
        Self {
            levels,
            storage: vec![0.0; 2 * levels],
        }
    }

    /// Hand out zeroed scratch for one team. The borrow ends the lease.
    pub fn lease(&mut self) -> TeamScratch<'_> {
        self.storage.fill(0.0);
        let (c_prime, y_prime) = self.storage.split_at_mut(self.levels);
        TeamScratch { c_prime, y_prime }
    }
}

/// Private `c'` / `y'` of one team.
#[derive(Debug)]
pub struct TeamScratch<'a> {
    pub c_prime: &'a mut [f64],
    pub y_prime: &'a mut [f64],
}
