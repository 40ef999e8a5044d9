//! Data-parallel dispatch over an externally managed worker pool.
//!
//! A *dispatch* is one logical fan-out over an index space. It returns only
//! after every index has been processed, so consecutive dispatches are
//! separated by a full barrier. Two shapes are provided:
//!
//! - [`Dispatcher::dispatch`] runs a caller-built rayon fan-out (the range
//!   strategy issues one per recurrence stage).
//! - [`Dispatcher::dispatch_teams`] runs one team per row in a single fan-out;
//!   each team walks its row sequentially against private scratch.
//!
//! The dispatcher never creates threads. Work runs on the pool given in
//! [`DispatchConfig`], or on rayon's global pool when none is given.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rayon::ThreadPool;
use rayon::prelude::*;
use tridiag_core::{Layout, Shape};

use crate::error::Result;
use crate::scratch::{ScratchArena, TeamScratch};

/// Default per-team local-memory budget: 48 KiB, a common per-block
/// shared-memory size. Fits rows of up to 3072 levels.
pub const DEFAULT_TEAM_SCRATCH_BUDGET: usize = 48 * 1024;

/// Dispatch configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Worker pool to run on. `None` uses rayon's global pool.
    pub pool: Option<Arc<ThreadPool>>,
    /// Bytes of fast local scratch available to one team.
    pub team_scratch_budget: usize,
    /// Fixed latency charged to every dispatch, modelling accelerator launch
    /// cost. `None` charges nothing.
    pub launch_overhead: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pool: None,
            team_scratch_budget: DEFAULT_TEAM_SCRATCH_BUDGET,
            launch_overhead: None,
        }
    }
}

impl DispatchConfig {
    /// Run on a specific pool.
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the per-team scratch budget in bytes.
    pub fn with_team_scratch_budget(mut self, bytes: usize) -> Self {
        self.team_scratch_budget = bytes;
        self
    }

    /// Charge a fixed latency to every dispatch.
    pub fn with_launch_overhead(mut self, overhead: Duration) -> Self {
        self.launch_overhead = Some(overhead);
        self
    }

    /// Largest level count whose team scratch fits the budget.
    pub fn max_team_levels(&self) -> usize {
        self.team_scratch_budget / crate::scratch::team_scratch_bytes(1)
    }

    /// Worker count of the configured pool.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

/// Issues dispatches and counts them.
#[derive(Debug, Default)]
pub struct Dispatcher {
    config: DispatchConfig,
    dispatches: AtomicUsize,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        log::debug!(
            "Created dispatcher ({} workers, team budget {} bytes)",
            config.num_threads(),
            config.team_scratch_budget
        );
        Self {
            config,
            dispatches: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Number of dispatches issued so far.
    pub fn dispatch_count(&self) -> usize {
        self.dispatches.load(Ordering::Relaxed)
    }

    pub fn reset_count(&self) {
        self.dispatches.store(0, Ordering::Relaxed);
    }

    /// Run one fan-out to completion on the configured pool.
    ///
    /// `op` is expected to drive a rayon parallel iterator; it runs inside the
    /// pool so nested parallel work stays there.
    pub fn dispatch<OP, R>(&self, label: &'static str, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        log::trace!("dispatch {}", label);
        if let Some(overhead) = self.config.launch_overhead {
            std::thread::sleep(overhead);
        }
        match &self.config.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// One dispatch with one team per row.
    ///
    /// `team(i, row, scratch)` receives exclusive access to row `i` of `rows`
    /// and a zeroed `2 * levels` scratch lease that is released when it
    /// returns. Workers reuse their arena between teams, so no team ever sees
    /// another team's scratch contents.
    pub fn dispatch_teams<F>(&self, label: &'static str, rows: DisjointRows<'_>, team: F)
    where
        F: Fn(usize, RowMut<'_>, TeamScratch<'_>) + Send + Sync,
    {
        let shape = rows.shape();
        self.dispatch(label, || {
            (0..shape.rows).into_par_iter().for_each_init(
                || ScratchArena::new(shape.levels),
                |arena, i| {
                    // SAFETY: the range yields each row index exactly once, so
                    // no two live `RowMut` handles refer to the same row.
                    let row = unsafe { rows.row(i) };
                    team(i, row, arena.lease());
                },
            );
        });
    }

    /// Completion barrier: returns once every worker of the pool has reached it.
    pub fn fence(&self) {
        match &self.config.pool {
            Some(pool) => {
                pool.broadcast(|_| ());
            }
            None => {
                rayon::broadcast(|_| ());
            }
        }
    }
}

/// A batch-shaped `y` array that hands out one mutable handle per row.
///
/// Rows interleave in memory under [`Layout::RowFastest`], so they cannot be
/// split into disjoint slices. Each handle instead addresses its row's
/// elements through a stride; distinct rows never share an element.
pub struct DisjointRows<'a> {
    ptr: *mut f64,
    len: usize,
    shape: Shape,
    layout: Layout,
    _marker: PhantomData<&'a mut [f64]>,
}

// SAFETY: handles for distinct rows touch disjoint elements; `row` is only
// reachable through `dispatch_teams`, which visits each row once.
unsafe impl Send for DisjointRows<'_> {}
unsafe impl Sync for DisjointRows<'_> {}

impl<'a> DisjointRows<'a> {
    /// Wrap `y`, which must hold `shape.len()` elements in `layout` order.
    pub fn new(y: &'a mut [f64], shape: Shape, layout: Layout) -> Result<Self> {
        if y.len() != shape.len() {
            return Err(tridiag_core::Error::InvalidDimension(format!(
                "Expected {} RHS elements, got {}",
                shape.len(),
                y.len()
            ))
            .into());
        }
        Ok(Self {
            ptr: y.as_mut_ptr(),
            len: y.len(),
            shape,
            layout,
            _marker: PhantomData,
        })
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Mutable handle on row `row`.
    ///
    /// # Safety
    ///
    /// No other handle for the same row may be alive.
    unsafe fn row(&self, row: usize) -> RowMut<'_> {
        assert!(row < self.shape.rows, "row {} out of range", row);
        let offset = self.layout.row_offset(self.shape, row);
        let stride = self.layout.level_stride(self.shape);
        debug_assert!(offset + (self.shape.levels - 1) * stride < self.len);
        RowMut {
            // SAFETY: `offset < len`, so the pointer stays inside the slice.
            ptr: unsafe { self.ptr.add(offset) },
            stride,
            levels: self.shape.levels,
            _marker: PhantomData,
        }
    }
}

/// Exclusive strided access to one row of `y`.
pub struct RowMut<'r> {
    ptr: *mut f64,
    stride: usize,
    levels: usize,
    _marker: PhantomData<&'r mut f64>,
}

impl RowMut<'_> {
    pub fn levels(&self) -> usize {
        self.levels
    }

    #[inline(always)]
    pub fn get(&self, level: usize) -> f64 {
        assert!(level < self.levels);
        // SAFETY: level < levels keeps the offset inside this row.
        unsafe { *self.ptr.add(level * self.stride) }
    }

    #[inline(always)]
    pub fn set(&mut self, level: usize, value: f64) {
        assert!(level < self.levels);
        // SAFETY: as in `get`; this handle is the row's only writer.
        unsafe { *self.ptr.add(level * self.stride) = value }
    }
}
