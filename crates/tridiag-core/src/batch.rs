//! Tridiagonal systems and batches of them.
//!
//! A [`Batch`] holds four `rows x levels` arrays (`a`, `b`, `c`, `y`) in one
//! [`Layout`]. Solvers read the band through a [`CoefficientView`] and
//! overwrite `y` in place with the solution.

use crate::error::{Error, Result};
use crate::layout::{Layout, Shape};

/// One tridiagonal system of `levels` unknowns.
///
/// `a[0]` and `c[levels - 1]` lie outside the band. The kernels never let
/// them influence the solution.
#[derive(Debug, Clone, PartialEq)]
pub struct System {
    /// Subdiagonal.
    pub a: Vec<f64>,
    /// Main diagonal.
    pub b: Vec<f64>,
    /// Superdiagonal.
    pub c: Vec<f64>,
    /// Right-hand side on input, solution after a solve.
    pub y: Vec<f64>,
}

impl System {
    /// Create a system, checking that all four arrays share one non-zero length.
    pub fn new(a: Vec<f64>, b: Vec<f64>, c: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        let levels = b.len();
        if levels == 0 {
            return Err(Error::InvalidDimension(
                "system must have at least one level".to_string(),
            ));
        }
        for (name, len) in [("a", a.len()), ("c", c.len()), ("y", y.len())] {
            if len != levels {
                return Err(Error::InvalidDimension(format!(
                    "Expected {} elements in {}, got {}",
                    levels, name, len
                )));
            }
        }
        Ok(Self { a, b, c, y })
    }

    /// Number of unknowns.
    pub fn levels(&self) -> usize {
        self.b.len()
    }

    /// Solve in place with the sequential reference.
    ///
    /// Returns the number of zero pivots that were replaced by defined zeros.
    pub fn solve(&mut self) -> usize {
        crate::thomas::solve_system(self)
    }

    /// Compute `A * x` for this system's band.
    pub fn apply(&self, x: &[f64]) -> Vec<f64> {
        let n = self.levels();
        (0..n)
            .map(|k| {
                let mut acc = self.b[k] * x[k];
                if k > 0 {
                    acc += self.a[k] * x[k - 1];
                }
                if k + 1 < n {
                    acc += self.c[k] * x[k + 1];
                }
                acc
            })
            .collect()
    }
}

/// One `(row, level)` entry of all four arrays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Entry {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub y: f64,
}

/// `rows` independent tridiagonal systems sharing one level count.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    shape: Shape,
    layout: Layout,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    y: Vec<f64>,
}

impl Batch {
    /// A batch with every coefficient zero.
    pub fn zeros(rows: usize, levels: usize, layout: Layout) -> Result<Self> {
        let shape = checked_shape(rows, levels)?;
        let len = shape.len();
        Ok(Self {
            shape,
            layout,
            a: vec![0.0; len],
            b: vec![0.0; len],
            c: vec![0.0; len],
            y: vec![0.0; len],
        })
    }

    /// Build a batch from flat arrays already stored in `layout` order.
    pub fn from_arrays(
        rows: usize,
        levels: usize,
        layout: Layout,
        a: Vec<f64>,
        b: Vec<f64>,
        c: Vec<f64>,
        y: Vec<f64>,
    ) -> Result<Self> {
        let shape = checked_shape(rows, levels)?;
        for (name, len) in [("a", a.len()), ("b", b.len()), ("c", c.len()), ("y", y.len())] {
            if len != shape.len() {
                return Err(Error::InvalidDimension(format!(
                    "Expected {} elements in {}, got {}",
                    shape.len(),
                    name,
                    len
                )));
            }
        }
        Ok(Self {
            shape,
            layout,
            a,
            b,
            c,
            y,
        })
    }

    /// Build a batch by evaluating `f(row, level)` for every entry.
    pub fn from_fn<F>(rows: usize, levels: usize, layout: Layout, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> Entry,
    {
        let mut batch = Self::zeros(rows, levels, layout)?;
        for i in 0..rows {
            for k in 0..levels {
                let idx = layout.index(batch.shape, i, k);
                let entry = f(i, k);
                batch.a[idx] = entry.a;
                batch.b[idx] = entry.b;
                batch.c[idx] = entry.c;
                batch.y[idx] = entry.y;
            }
        }
        Ok(batch)
    }

    /// `rows` identical copies of one system.
    pub fn replicate(system: &System, rows: usize, layout: Layout) -> Result<Self> {
        Self::from_fn(rows, system.levels(), layout, |_, k| Entry {
            a: system.a[k],
            b: system.b[k],
            c: system.c[k],
            y: system.y[k],
        })
    }

    /// One row per system; all systems must share a level count.
    pub fn from_systems(systems: &[System], layout: Layout) -> Result<Self> {
        let levels = systems.first().map(System::levels).unwrap_or(0);
        if let Some(bad) = systems.iter().find(|s| s.levels() != levels) {
            return Err(Error::InvalidDimension(format!(
                "Expected {} levels in every system, got {}",
                levels,
                bad.levels()
            )));
        }
        Self::from_fn(systems.len(), levels, layout, |i, k| {
            let s = &systems[i];
            Entry {
                a: s.a[k],
                b: s.b[k],
                c: s.c[k],
                y: s.y[k],
            }
        })
    }

    /// Dimensions of the batch.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of independent systems (N).
    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    /// Unknowns per system (K).
    pub fn levels(&self) -> usize {
        self.shape.levels
    }

    /// Storage order of all four arrays.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Read-only view of the band coefficients.
    pub fn coefficients(&self) -> CoefficientView<'_> {
        CoefficientView {
            a: &self.a,
            b: &self.b,
            c: &self.c,
            shape: self.shape,
            layout: self.layout,
            read_only_hint: false,
        }
    }

    /// Borrow the band read-only and the right-hand side mutably at once.
    pub fn split_mut(&mut self) -> (CoefficientView<'_>, &mut [f64]) {
        let view = CoefficientView {
            a: &self.a,
            b: &self.b,
            c: &self.c,
            shape: self.shape,
            layout: self.layout,
            read_only_hint: false,
        };
        (view, &mut self.y)
    }

    /// The right-hand side (or the solution, after a solve).
    pub fn rhs(&self) -> &[f64] {
        &self.y
    }

    /// Overwrite the right-hand side from a flat array in this batch's layout.
    pub fn set_rhs(&mut self, y: &[f64]) -> Result<()> {
        if y.len() != self.y.len() {
            return Err(Error::InvalidDimension(format!(
                "Expected {} RHS elements, got {}",
                self.y.len(),
                y.len()
            )));
        }
        self.y.copy_from_slice(y);
        Ok(())
    }

    /// Entry `(row, level)` of all four arrays.
    pub fn entry(&self, row: usize, level: usize) -> Entry {
        let idx = self.layout.index(self.shape, row, level);
        Entry {
            a: self.a[idx],
            b: self.b[idx],
            c: self.c[idx],
            y: self.y[idx],
        }
    }

    /// Overwrite entry `(row, level)`.
    pub fn set_entry(&mut self, row: usize, level: usize, entry: Entry) {
        let idx = self.layout.index(self.shape, row, level);
        self.a[idx] = entry.a;
        self.b[idx] = entry.b;
        self.c[idx] = entry.c;
        self.y[idx] = entry.y;
    }

    /// Copy row `row` out as a standalone system.
    pub fn system(&self, row: usize) -> System {
        let levels = self.levels();
        let mut system = System {
            a: Vec::with_capacity(levels),
            b: Vec::with_capacity(levels),
            c: Vec::with_capacity(levels),
            y: Vec::with_capacity(levels),
        };
        for k in 0..levels {
            let e = self.entry(row, k);
            system.a.push(e.a);
            system.b.push(e.b);
            system.c.push(e.c);
            system.y.push(e.y);
        }
        system
    }

    /// The same batch stored in another layout.
    pub fn to_layout(&self, layout: Layout) -> Batch {
        if layout == self.layout {
            return self.clone();
        }
        let mut out = Batch {
            shape: self.shape,
            layout,
            a: vec![0.0; self.shape.len()],
            b: vec![0.0; self.shape.len()],
            c: vec![0.0; self.shape.len()],
            y: vec![0.0; self.shape.len()],
        };
        for i in 0..self.rows() {
            for k in 0..self.levels() {
                out.set_entry(i, k, self.entry(i, k));
            }
        }
        out
    }

    /// A new batch whose row `j` is this batch's row `order[j]`.
    ///
    /// `order` must be a permutation of `0..rows`.
    pub fn permute_rows(&self, order: &[usize]) -> Result<Batch> {
        check_permutation(order, self.rows())?;
        let mut out = self.clone();
        for (j, &src) in order.iter().enumerate() {
            for k in 0..self.levels() {
                out.set_entry(j, k, self.entry(src, k));
            }
        }
        Ok(out)
    }

    /// Layout-aware view of `y`.
    pub fn solution(&self) -> SolutionView<'_> {
        SolutionView {
            y: &self.y,
            shape: self.shape,
            layout: self.layout,
        }
    }
}

fn checked_shape(rows: usize, levels: usize) -> Result<Shape> {
    let shape = Shape::new(rows, levels);
    if shape.is_empty() {
        return Err(Error::InvalidDimension(format!(
            "batch {} must have at least one row and one level",
            shape
        )));
    }
    if rows.checked_mul(levels).is_none() {
        return Err(Error::InvalidDimension(format!(
            "batch {} has more elements than fit in usize",
            shape
        )));
    }
    Ok(shape)
}

fn check_permutation(order: &[usize], rows: usize) -> Result<()> {
    if order.len() != rows {
        return Err(Error::InvalidDimension(format!(
            "Expected a permutation of {} rows, got {} indices",
            rows,
            order.len()
        )));
    }
    let mut seen = vec![false; rows];
    for &i in order {
        if i >= rows || seen[i] {
            return Err(Error::InvalidDimension(format!(
                "row index {} is out of range or repeated",
                i
            )));
        }
        seen[i] = true;
    }
    Ok(())
}

/// Read-only view of `a`, `b`, `c`.
///
/// `read_only_hint` marks the inputs as never written during the solve so a
/// solver may pick a cache-friendlier read pattern. It never changes results.
#[derive(Debug, Clone, Copy)]
pub struct CoefficientView<'a> {
    a: &'a [f64],
    b: &'a [f64],
    c: &'a [f64],
    shape: Shape,
    layout: Layout,
    read_only_hint: bool,
}

impl<'a> CoefficientView<'a> {
    /// Attach or clear the read-only access hint.
    pub fn with_read_only_hint(mut self, enabled: bool) -> Self {
        self.read_only_hint = enabled;
        self
    }

    /// Whether the read-only access hint is attached.
    pub fn read_only_hint(&self) -> bool {
        self.read_only_hint
    }

    /// Dimensions of the viewed batch.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Storage order of the viewed arrays.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// `(a, b, c)` at `(row, level)`.
    #[inline(always)]
    pub fn band(&self, row: usize, level: usize) -> (f64, f64, f64) {
        let idx = self.layout.index(self.shape, row, level);
        (self.a[idx], self.b[idx], self.c[idx])
    }

    /// `(a, b, c)` at a flat offset.
    #[inline(always)]
    pub fn band_at(&self, idx: usize) -> (f64, f64, f64) {
        (self.a[idx], self.b[idx], self.c[idx])
    }
}

/// Layout-aware read-only view of a solution array.
#[derive(Debug, Clone, Copy)]
pub struct SolutionView<'a> {
    y: &'a [f64],
    shape: Shape,
    layout: Layout,
}

impl<'a> SolutionView<'a> {
    /// Dimensions of the solution.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Storage order of the solution array.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Value at `(row, level)`.
    #[inline]
    pub fn get(&self, row: usize, level: usize) -> f64 {
        self.y[self.layout.index(self.shape, row, level)]
    }

    /// One row in level order.
    pub fn row(&self, row: usize) -> Vec<f64> {
        (0..self.shape.levels).map(|k| self.get(row, k)).collect()
    }

    /// The raw array in this view's layout.
    pub fn as_slice(&self) -> &'a [f64] {
        self.y
    }

    /// Copy into an owned [`Solution`].
    pub fn to_solution(&self) -> Solution {
        Solution {
            y: self.y.to_vec(),
            shape: self.shape,
            layout: self.layout,
        }
    }
}

/// An owned solution, e.g. from an independent implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    y: Vec<f64>,
    shape: Shape,
    layout: Layout,
}

impl Solution {
    /// Wrap a flat array stored in `layout` order.
    pub fn new(y: Vec<f64>, shape: Shape, layout: Layout) -> Result<Self> {
        if y.len() != shape.len() {
            return Err(Error::InvalidDimension(format!(
                "Expected {} solution elements, got {}",
                shape.len(),
                y.len()
            )));
        }
        Ok(Self { y, shape, layout })
    }

    /// Build from rows given in level order.
    pub fn from_rows(rows: &[Vec<f64>], layout: Layout) -> Result<Self> {
        let levels = rows.first().map(Vec::len).unwrap_or(0);
        let shape = Shape::new(rows.len(), levels);
        let mut y = vec![0.0; shape.len()];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != levels {
                return Err(Error::InvalidDimension(format!(
                    "Expected {} levels in row {}, got {}",
                    levels,
                    i,
                    row.len()
                )));
            }
            for (k, &v) in row.iter().enumerate() {
                y[layout.index(shape, i, k)] = v;
            }
        }
        Ok(Self { y, shape, layout })
    }

    pub fn view(&self) -> SolutionView<'_> {
        SolutionView {
            y: &self.y,
            shape: self.shape,
            layout: self.layout,
        }
    }

    /// A new solution whose row `order[j]` is this solution's row `j`.
    ///
    /// Undoes [`Batch::permute_rows`] with the same `order`.
    pub fn unpermute_rows(&self, order: &[usize]) -> Result<Solution> {
        check_permutation(order, self.shape.rows)?;
        let mut y = vec![0.0; self.y.len()];
        for (j, &dst) in order.iter().enumerate() {
            for k in 0..self.shape.levels {
                y[self.layout.index(self.shape, dst, k)] =
                    self.y[self.layout.index(self.shape, j, k)];
            }
        }
        Ok(Solution {
            y,
            shape: self.shape,
            layout: self.layout,
        })
    }
}
