//! Problem generators.
//!
//! Generators are deterministic: the same `(rows, levels, layout)` always
//! produces a bit-identical batch, so strategies benchmarked one after another
//! see the same input.

use std::f64::consts::PI;

use crate::batch::{Batch, Entry, System};
use crate::error::Result;
use crate::layout::Layout;

/// Vertical level count used when none is configured.
pub const DEFAULT_LEVELS: usize = 50;

/// Produces a batch of independent tridiagonal systems.
pub trait ProblemGenerator: Send + Sync {
    /// Short name for reports.
    fn name(&self) -> &str;

    /// Build a `rows x levels` batch stored in `layout`.
    fn generate(&self, rows: usize, levels: usize, layout: Layout) -> Result<Batch>;
}

/// Implicit vertical heat diffusion: a diagonally dominant band per column.
///
/// `a = c = off_diagonal` inside the band, `b = diagonal + ripple * sin(pi (i+1) / rows)`,
/// `y = sin(pi (i+1) / rows) * cos(pi (k+1) / levels)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatDiffusionGenerator {
    pub off_diagonal: f64,
    pub diagonal: f64,
    pub ripple: f64,
}

impl Default for HeatDiffusionGenerator {
    fn default() -> Self {
        Self {
            off_diagonal: -0.5,
            diagonal: 2.0,
            ripple: 0.1,
        }
    }
}

impl ProblemGenerator for HeatDiffusionGenerator {
    fn name(&self) -> &str {
        "heat-diffusion"
    }

    fn generate(&self, rows: usize, levels: usize, layout: Layout) -> Result<Batch> {
        Batch::from_fn(rows, levels, layout, |i, k| {
            let column = (PI * (i + 1) as f64 / rows as f64).sin();
            Entry {
                a: if k > 0 { self.off_diagonal } else { 0.0 },
                b: self.diagonal + self.ripple * column,
                c: if k + 1 < levels { self.off_diagonal } else { 0.0 },
                y: column * (PI * (k + 1) as f64 / levels as f64).cos(),
            }
        })
    }
}

/// Every row is a copy of one template system.
///
/// `levels` passed to [`generate`](ProblemGenerator::generate) must match the
/// template.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicatedGenerator {
    template: System,
}

impl ReplicatedGenerator {
    pub fn new(template: System) -> Self {
        Self { template }
    }
}

impl ProblemGenerator for ReplicatedGenerator {
    fn name(&self) -> &str {
        "replicated"
    }

    fn generate(&self, rows: usize, levels: usize, layout: Layout) -> Result<Batch> {
        if levels != self.template.levels() {
            return Err(crate::error::Error::InvalidDimension(format!(
                "Expected {} levels for replicated template, got {}",
                self.template.levels(),
                levels
            )));
        }
        Batch::replicate(&self.template, rows, layout)
    }
}
