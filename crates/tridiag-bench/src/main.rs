//! tridiag-bench CLI.
//!
//! Benchmarks the range and team batched Thomas strategies on the
//! heat-diffusion batch and prints the per-iteration times and speedup.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use tridiag_batched::DispatchConfig;
use tridiag_bench::{BenchmarkConfig, StrategySelection, run_benchmark};
use tridiag_core::{HeatDiffusionGenerator, Layout};

#[derive(Parser)]
#[command(name = "tridiag-bench")]
#[command(about = "Benchmark batched tridiagonal solve strategies")]
#[command(version)]
struct Cli {
    /// Number of independent systems (N)
    n: usize,

    /// Timed repetitions (R)
    reps: usize,

    /// Strategy: range (naive), team (optimized) or both
    #[arg(default_value = "both")]
    strategy: String,

    /// Levels per system (K)
    #[arg(long, default_value_t = tridiag_core::DEFAULT_LEVELS)]
    levels: usize,

    /// Discarded warm-up repetitions
    #[arg(long, default_value_t = tridiag_bench::DEFAULT_WARMUP)]
    warmup: usize,

    /// Memory layout: row-fastest or level-fastest
    #[arg(long, default_value = "row-fastest")]
    layout: String,

    /// Worker threads (default: rayon's global pool)
    #[arg(long)]
    threads: Option<usize>,

    /// Simulated per-dispatch launch latency in microseconds
    #[arg(long)]
    launch_overhead_us: Option<u64>,

    /// Per-team scratch budget in bytes
    #[arg(long)]
    team_scratch_budget: Option<usize>,

    /// Disable the read-only hint on the team solver's coefficients
    #[arg(long)]
    no_read_only_hint: bool,

    /// Check each strategy against the sequential reference
    #[arg(long, num_args = 0..=1, default_missing_value = "1e-10", value_name = "TOL")]
    validate: Option<f64>,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let strategy = StrategySelection::from_name(&cli.strategy)
        .ok_or_else(|| anyhow!("Unknown strategy '{}' (expected range, team or both)", cli.strategy))?;
    let layout = Layout::from_name(&cli.layout).ok_or_else(|| {
        anyhow!(
            "Unknown layout '{}' (expected row-fastest or level-fastest)",
            cli.layout
        )
    })?;

    let mut dispatch = DispatchConfig::default();
    if let Some(threads) = cli.threads {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("Failed to build worker pool")?;
        dispatch = dispatch.with_pool(Arc::new(pool));
    }
    if let Some(us) = cli.launch_overhead_us {
        dispatch = dispatch.with_launch_overhead(Duration::from_micros(us));
    }
    if let Some(bytes) = cli.team_scratch_budget {
        dispatch = dispatch.with_team_scratch_budget(bytes);
    }

    let mut config = BenchmarkConfig::new(cli.n, cli.reps, strategy)
        .with_levels(cli.levels)
        .with_warmup(cli.warmup)
        .with_layout(layout)
        .with_read_only_hint(!cli.no_read_only_hint)
        .with_dispatch(dispatch);
    if let Some(tol) = cli.validate {
        config = config.with_validation(tol);
    }

    let outcome = run_benchmark(&config, &HeatDiffusionGenerator::default())?;
    let report = outcome.report;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print!("{}", report.to_text());
    }

    if report.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
