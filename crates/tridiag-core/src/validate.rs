//! Elementwise equivalence checks between two solutions.

use serde::{Deserialize, Serialize};

use crate::batch::SolutionView;
use crate::error::{Error, Result};
use crate::layout::Shape;

/// Default acceptance threshold for `max |x1 - x2|`.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Outcome of comparing two equal-shaped solutions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Largest absolute elementwise difference observed (NaN if any pair was NaN).
    pub max_abs_diff: f64,
    /// Threshold the difference was judged against.
    pub tolerance: f64,
    /// `max_abs_diff <= tolerance`.
    pub passed: bool,
    /// Shape of both inputs.
    pub shape: Shape,
    /// `(row, level)` where the largest difference occurred.
    pub worst: Option<(usize, usize)>,
}

impl ValidationResult {
    /// One-line human-readable summary.
    pub fn to_text(&self) -> String {
        let status = if self.passed { "PASS" } else { "FAIL" };
        match self.worst {
            Some((i, k)) => format!(
                "{}: max |diff| = {:.3e} (tol {:.1e}) at [{}, {}] over {}",
                status, self.max_abs_diff, self.tolerance, i, k, self.shape
            ),
            None => format!(
                "{}: max |diff| = {:.3e} (tol {:.1e}) over {}",
                status, self.max_abs_diff, self.tolerance, self.shape
            ),
        }
    }
}

/// Compare `actual` against `expected`.
///
/// The two views may use different layouts; elements are matched by
/// `(row, level)`. A shape mismatch is an error and no elements are compared.
/// A failed comparison is not an error: it returns `passed = false` with the
/// observed difference.
pub fn compare(
    expected: SolutionView<'_>,
    actual: SolutionView<'_>,
    tolerance: f64,
) -> Result<ValidationResult> {
    if expected.shape() != actual.shape() {
        return Err(Error::ShapeMismatch {
            expected: expected.shape(),
            actual: actual.shape(),
        });
    }

    let shape = expected.shape();
    let (max_abs_diff, worst) = if expected.layout() == actual.layout() {
        max_abs_diff_flat(expected, actual)
    } else {
        max_abs_diff_indexed(expected, actual)
    };

    let passed = max_abs_diff <= tolerance;
    if !passed {
        log::warn!(
            "Equivalence check failed: max |diff| = {:e} > {:e} over {}",
            max_abs_diff,
            tolerance,
            shape
        );
    }

    Ok(ValidationResult {
        max_abs_diff,
        tolerance,
        passed,
        shape,
        worst,
    })
}

/// [`compare`] with [`DEFAULT_TOLERANCE`].
pub fn compare_default(
    expected: SolutionView<'_>,
    actual: SolutionView<'_>,
) -> Result<ValidationResult> {
    compare(expected, actual, DEFAULT_TOLERANCE)
}

struct Tracker {
    max: f64,
    at: Option<usize>,
}

impl Tracker {
    fn new() -> Self {
        Self { max: 0.0, at: None }
    }

    // NaN sticks once seen so it can never be reported as a pass.
    #[inline]
    fn observe(&mut self, diff: f64, at: usize) {
        if self.max.is_nan() {
            return;
        }
        if diff.is_nan() || diff > self.max {
            self.max = diff;
            self.at = Some(at);
        }
    }
}

fn max_abs_diff_flat(
    expected: SolutionView<'_>,
    actual: SolutionView<'_>,
) -> (f64, Option<(usize, usize)>) {
    let shape = expected.shape();
    let mut tracker = Tracker::new();
    for (idx, (x1, x2)) in expected
        .as_slice()
        .iter()
        .zip(actual.as_slice())
        .enumerate()
    {
        tracker.observe((x1 - x2).abs(), idx);
    }
    let worst = tracker.at.map(|idx| match expected.layout() {
        crate::layout::Layout::RowFastest => (idx % shape.rows, idx / shape.rows),
        crate::layout::Layout::LevelFastest => (idx / shape.levels, idx % shape.levels),
    });
    (tracker.max, worst)
}

fn max_abs_diff_indexed(
    expected: SolutionView<'_>,
    actual: SolutionView<'_>,
) -> (f64, Option<(usize, usize)>) {
    let shape = expected.shape();
    let mut tracker = Tracker::new();
    for i in 0..shape.rows {
        for k in 0..shape.levels {
            tracker.observe((expected.get(i, k) - actual.get(i, k)).abs(), i * shape.levels + k);
        }
    }
    let worst = tracker
        .at
        .map(|idx| (idx / shape.levels, idx % shape.levels));
    (tracker.max, worst)
}
