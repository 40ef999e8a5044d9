//! Dense LU oracle for cross-checking the Thomas kernels.
//!
//! Each row is expanded into a dense matrix and solved with partial-pivoting
//! LU, an implementation that shares no arithmetic with the kernels. Its
//! results agree with the kernels only to rounding, so compare with a
//! tolerance.

use nalgebra::{DMatrix, DVector};

use crate::batch::{Batch, Solution, System};
use crate::error::Result;

/// Result of solving a whole batch with the dense oracle.
#[derive(Debug, Clone)]
pub struct OracleSolution {
    /// Solutions in the batch's layout; singular rows are zero.
    pub solution: Solution,
    /// Rows whose dense matrix was singular.
    pub singular_rows: Vec<usize>,
}

/// Dense partial-pivoting LU solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseOracle;

impl DenseOracle {
    /// Solve one system, or `None` if its matrix is singular.
    pub fn solve_system(system: &System) -> Option<Vec<f64>> {
        let n = system.levels();
        let matrix = DMatrix::from_fn(n, n, |r, col| {
            if r == col {
                system.b[r]
            } else if col + 1 == r {
                system.a[r]
            } else if col == r + 1 {
                system.c[r]
            } else {
                0.0
            }
        });
        let rhs = DVector::from_column_slice(&system.y);
        matrix.lu().solve(&rhs).map(|x| x.iter().copied().collect())
    }

    /// Solve every row of `batch` without modifying it.
    pub fn solve_batch(batch: &Batch) -> Result<OracleSolution> {
        let mut rows = Vec::with_capacity(batch.rows());
        let mut singular_rows = Vec::new();
        for i in 0..batch.rows() {
            match Self::solve_system(&batch.system(i)) {
                Some(x) => rows.push(x),
                None => {
                    rows.push(vec![0.0; batch.levels()]);
                    singular_rows.push(i);
                }
            }
        }
        if !singular_rows.is_empty() {
            log::warn!(
                "{} of {} rows were singular for the dense oracle",
                singular_rows.len(),
                batch.rows()
            );
        }
        Ok(OracleSolution {
            solution: Solution::from_rows(&rows, batch.layout())?,
            singular_rows,
        })
    }
}
