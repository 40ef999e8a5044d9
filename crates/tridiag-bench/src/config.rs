//! Benchmark configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use tridiag_batched::{DispatchConfig, StrategyKind};
use tridiag_core::{DEFAULT_LEVELS, Layout};

use crate::error::{HarnessError, Result};

/// Warm-up repetitions discarded before timing.
pub const DEFAULT_WARMUP: usize = 3;

/// Which strategies a run benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategySelection {
    Range,
    Team,
    Both,
}

impl StrategySelection {
    /// Parse a selection name (case-insensitive). `naive` and `optimized`
    /// select the range and team strategies.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "both" | "all" => Some(Self::Both),
            other => match StrategyKind::from_name(other)? {
                StrategyKind::Range => Some(Self::Range),
                StrategyKind::Team => Some(Self::Team),
                StrategyKind::Sequential => None,
            },
        }
    }

    /// Strategies to run, range first.
    pub fn kinds(self) -> &'static [StrategyKind] {
        match self {
            Self::Range => &[StrategyKind::Range],
            Self::Team => &[StrategyKind::Team],
            Self::Both => &[StrategyKind::Range, StrategyKind::Team],
        }
    }
}

impl fmt::Display for StrategySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range => write!(f, "range"),
            Self::Team => write!(f, "team"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Parameters of one benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkConfig {
    /// Number of independent systems (N).
    pub rows: usize,
    /// Levels per system (K).
    pub levels: usize,
    /// Timed repetitions (R).
    pub repetitions: usize,
    /// Discarded warm-up repetitions (W).
    pub warmup: usize,
    pub strategy: StrategySelection,
    pub layout: Layout,
    /// Attach the read-only hint to the team solver's coefficient view.
    pub read_only_hint: bool,
    /// Compare each strategy against the sequential reference with this tolerance.
    pub validate: Option<f64>,
    #[serde(skip)]
    pub dispatch: DispatchConfig,
}

impl BenchmarkConfig {
    pub fn new(rows: usize, repetitions: usize, strategy: StrategySelection) -> Self {
        Self {
            rows,
            levels: DEFAULT_LEVELS,
            repetitions,
            warmup: DEFAULT_WARMUP,
            strategy,
            layout: Layout::default(),
            read_only_hint: true,
            validate: None,
            dispatch: DispatchConfig::default(),
        }
    }

    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_read_only_hint(mut self, enabled: bool) -> Self {
        self.read_only_hint = enabled;
        self
    }

    /// Validate every benchmarked strategy against the sequential reference.
    pub fn with_validation(mut self, tolerance: f64) -> Self {
        self.validate = Some(tolerance);
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Reject configurations the harness cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 {
            return Err(HarnessError::InvalidConfig(
                "row count must be positive".into(),
            ));
        }
        if self.levels == 0 {
            return Err(HarnessError::InvalidConfig(
                "level count must be positive".into(),
            ));
        }
        if self.rows.checked_mul(self.levels).is_none() {
            return Err(HarnessError::InvalidConfig(format!(
                "{} rows x {} levels overflows the batch size",
                self.rows, self.levels
            )));
        }
        if self.repetitions == 0 {
            return Err(HarnessError::InvalidConfig(
                "repetition count must be at least 1".into(),
            ));
        }
        if let Some(tol) = self.validate {
            if tol.is_nan() || tol < 0.0 {
                return Err(HarnessError::InvalidConfig(format!(
                    "validation tolerance must be non-negative, got {}",
                    tol
                )));
            }
        }
        Ok(())
    }
}
