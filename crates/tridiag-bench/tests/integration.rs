//! Cross-strategy integration tests.
//!
//! Every batched strategy is checked against the sequential reference on the
//! same generated input, and the harness is exercised end to end.

use std::sync::Arc;
use std::time::Duration;

use tridiag_batched::{BatchSolver, DispatchConfig, StrategyKind};
use tridiag_bench::{BenchmarkConfig, StrategySelection, run_benchmark};
use tridiag_core::{
    Batch, DenseOracle, Entry, Error, HeatDiffusionGenerator, Layout, ProblemGenerator,
    ReplicatedGenerator, Solution, System, compare, compare_default,
};

const ALL: [StrategyKind; 3] = [StrategyKind::Sequential, StrategyKind::Range, StrategyKind::Team];
const LAYOUTS: [Layout; 2] = [Layout::RowFastest, Layout::LevelFastest];

fn heat(rows: usize, levels: usize, layout: Layout) -> Batch {
    HeatDiffusionGenerator::default()
        .generate(rows, levels, layout)
        .unwrap()
}

fn solve(kind: StrategyKind, config: DispatchConfig, batch: &Batch) -> Batch {
    let mut solved = batch.clone();
    let mut solver = kind.create(config);
    solver.solve(&mut solved).unwrap();
    solver.fence();
    solved
}

fn scenario_a() -> System {
    System::new(
        vec![0.0, -1.0, -1.0],
        vec![2.0, 2.0, 2.0],
        vec![-1.0, -1.0, 0.0],
        vec![1.0, 1.0, 1.0],
    )
    .unwrap()
}

fn pool(threads: usize) -> Arc<rayon::ThreadPool> {
    Arc::new(
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap(),
    )
}

// ============================================================================
// Equivalence
// ============================================================================

#[test]
fn test_all_strategies_match_reference() {
    for layout in LAYOUTS {
        for (rows, levels) in [(1, 1), (1, 50), (7, 2), (100, 3), (333, 50), (64, 129)] {
            let batch = heat(rows, levels, layout);
            let reference = solve(StrategyKind::Sequential, DispatchConfig::default(), &batch);
            for kind in [StrategyKind::Range, StrategyKind::Team] {
                let actual = solve(kind, DispatchConfig::default(), &batch);
                let result = compare_default(reference.solution(), actual.solution()).unwrap();
                assert!(result.passed, "{kind} {layout} [{rows}, {levels}]: {}", result.to_text());
                assert_eq!(result.max_abs_diff, 0.0);
            }
        }
    }
}

#[test]
fn test_heterogeneous_rows() {
    let systems: Vec<System> = (0..5)
        .map(|i| {
            let s = i as f64;
            System::new(
                vec![0.0, 0.3 * s, -1.0, 0.25],
                vec![4.0 + s, 3.0, 5.0 - 0.5 * s, 2.0],
                vec![1.0, -0.5, 0.1 * s, 0.0],
                vec![s, 1.0, -2.0, 0.5 * s],
            )
            .unwrap()
        })
        .collect();

    for layout in LAYOUTS {
        let batch = Batch::from_systems(&systems, layout).unwrap();
        let reference = solve(StrategyKind::Sequential, DispatchConfig::default(), &batch);
        for (i, system) in systems.iter().enumerate() {
            let mut single = system.clone();
            tridiag_core::solve_system(&mut single);
            assert_eq!(reference.solution().row(i), single.y);
        }
        for kind in [StrategyKind::Range, StrategyKind::Team] {
            assert_eq!(solve(kind, DispatchConfig::default(), &batch), reference);
        }
    }
}

#[test]
fn test_agrees_with_dense_oracle() {
    let batch = heat(40, 25, Layout::LevelFastest);
    let oracle = DenseOracle::solve_batch(&batch).unwrap();
    assert!(oracle.singular_rows.is_empty());

    for kind in ALL {
        let solved = solve(kind, DispatchConfig::default(), &batch);
        let result = compare(oracle.solution.view(), solved.solution(), 1e-12).unwrap();
        assert!(result.passed, "{kind}: {}", result.to_text());
    }
}

#[test]
fn test_solution_satisfies_system() {
    let batch = heat(16, 30, Layout::RowFastest);
    let solved = solve(StrategyKind::Team, DispatchConfig::default(), &batch);
    for i in 0..batch.rows() {
        let system = batch.system(i);
        let residual = system.apply(&solved.solution().row(i));
        for (r, y) in residual.iter().zip(&system.y) {
            assert!((r - y).abs() < 1e-12);
        }
    }
}

// ============================================================================
// Row-order, layout, hint and thread-count invariance
// ============================================================================

#[test]
fn test_row_order_independence() {
    let rows = 31;
    let order: Vec<usize> = (0..rows).map(|j| (7 * j + 3) % rows).collect();

    for layout in LAYOUTS {
        let batch = heat(rows, 12, layout);
        for kind in [StrategyKind::Range, StrategyKind::Team] {
            let direct = solve(kind, DispatchConfig::default(), &batch)
                .solution()
                .to_solution();
            let permuted = batch.permute_rows(&order).unwrap();
            let restored = solve(kind, DispatchConfig::default(), &permuted)
                .solution()
                .to_solution()
                .unpermute_rows(&order)
                .unwrap();
            assert_eq!(restored, direct, "{kind} {layout}");
        }
    }
}

#[test]
fn test_layout_does_not_change_results() {
    let left = heat(50, 20, Layout::RowFastest);
    let right = left.to_layout(Layout::LevelFastest);
    for kind in ALL {
        let x_left = solve(kind, DispatchConfig::default(), &left);
        let x_right = solve(kind, DispatchConfig::default(), &right);
        let result = compare_default(x_left.solution(), x_right.solution()).unwrap();
        assert_eq!(result.max_abs_diff, 0.0, "{kind}");
    }
}

#[test]
fn test_read_only_hint_does_not_change_results() {
    for layout in LAYOUTS {
        let base = BenchmarkConfig::new(77, 1, StrategySelection::Team)
            .with_levels(21)
            .with_warmup(0)
            .with_layout(layout);
        let hinted = run_benchmark(&base.clone().with_read_only_hint(true), &HeatDiffusionGenerator::default())
            .unwrap();
        let plain = run_benchmark(&base.with_read_only_hint(false), &HeatDiffusionGenerator::default())
            .unwrap();
        assert_eq!(
            hinted.batch(StrategyKind::Team).unwrap(),
            plain.batch(StrategyKind::Team).unwrap()
        );
    }
}

#[test]
fn test_thread_count_invariance() {
    let batch = heat(500, 40, Layout::RowFastest);
    for kind in [StrategyKind::Range, StrategyKind::Team] {
        let single = solve(kind, DispatchConfig::default().with_pool(pool(1)), &batch);
        let many = solve(kind, DispatchConfig::default().with_pool(pool(8)), &batch);
        assert_eq!(single, many, "{kind}");
    }
}

// ============================================================================
// Validator
// ============================================================================

#[test]
fn test_validator_idempotence() {
    let solved = solve(StrategyKind::Range, DispatchConfig::default(), &heat(19, 9, Layout::RowFastest));
    let result = compare_default(solved.solution(), solved.solution()).unwrap();
    assert_eq!(result.max_abs_diff, 0.0);
    assert!(result.passed);
}

#[test]
fn test_shape_mismatch_detected() {
    let left = solve(StrategyKind::Team, DispatchConfig::default(), &heat(8, 5, Layout::RowFastest));
    let right = solve(StrategyKind::Team, DispatchConfig::default(), &heat(8, 6, Layout::RowFastest));
    let err = compare_default(left.solution(), right.solution()).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { expected, actual }
        if expected.levels == 5 && actual.levels == 6 && expected.rows == 8));
}

#[test]
fn test_failed_validation_reports_difference() {
    let solved = solve(StrategyKind::Team, DispatchConfig::default(), &heat(4, 4, Layout::RowFastest));
    let mut rows: Vec<Vec<f64>> = (0..4).map(|i| solved.solution().row(i)).collect();
    rows[2][1] += 1e-6;
    let perturbed = Solution::from_rows(&rows, Layout::RowFastest).unwrap();

    let result = compare_default(solved.solution(), perturbed.view()).unwrap();
    assert!(!result.passed);
    assert!((result.max_abs_diff - 1e-6).abs() < 1e-12);
    assert_eq!(result.worst, Some((2, 1)));
}

// ============================================================================
// Singular pivots
// ============================================================================

#[test]
fn test_singular_pivot_parity() {
    for layout in LAYOUTS {
        let mut batch = heat(10, 6, layout);
        let e = batch.entry(3, 0);
        batch.set_entry(3, 0, Entry { b: 0.0, ..e });

        let outputs: Vec<Batch> = ALL
            .iter()
            .map(|&kind| solve(kind, DispatchConfig::default(), &batch))
            .collect();
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0], outputs[2]);

        let row = outputs[0].solution().row(3);
        assert!(row.iter().all(|v| v.is_finite()), "{row:?}");
    }
}

#[test]
fn test_singular_inner_pivot_parity() {
    // b[1] - a[1] * c'[0] = 1 - 1 * 1 = 0
    let sys = System::new(
        vec![0.0, 1.0, 1.0],
        vec![1.0, 1.0, 1.0],
        vec![1.0, 1.0, 0.0],
        vec![2.0, 2.0, 2.0],
    )
    .unwrap();
    let batch = Batch::replicate(&sys, 3, Layout::LevelFastest).unwrap();
    let outputs: Vec<Batch> = ALL
        .iter()
        .map(|&kind| solve(kind, DispatchConfig::default(), &batch))
        .collect();
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[0], outputs[2]);
    assert_eq!(outputs[0].solution().row(0), vec![2.0, 0.0, 2.0]);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_a() {
    for layout in LAYOUTS {
        let batch = Batch::replicate(&scenario_a(), 4, layout).unwrap();
        let reference = solve(StrategyKind::Sequential, DispatchConfig::default(), &batch);
        let expected = [1.5, 2.0, 1.5];
        for i in 0..4 {
            for (x, e) in reference.solution().row(i).iter().zip(expected) {
                assert!((x - e).abs() < 1e-10, "row {i}: {x} vs {e}");
            }
        }
        for kind in [StrategyKind::Range, StrategyKind::Team] {
            let actual = solve(kind, DispatchConfig::default(), &batch);
            let result = compare_default(reference.solution(), actual.solution()).unwrap();
            assert!(result.passed, "{kind}");
        }
    }
}

#[test]
fn test_scenario_a_through_harness() {
    let config = BenchmarkConfig::new(4, 2, StrategySelection::Both)
        .with_levels(3)
        .with_validation(1e-10);
    let outcome = run_benchmark(&config, &ReplicatedGenerator::new(scenario_a())).unwrap();
    assert!(outcome.report.passed());
    assert_eq!(outcome.report.generator, "replicated");
}

#[test]
fn test_scenario_b() {
    let sys = System::new(vec![0.0], vec![5.0], vec![0.0], vec![10.0]).unwrap();
    let batch = Batch::replicate(&sys, 1, Layout::RowFastest).unwrap();
    for kind in ALL {
        let solved = solve(kind, DispatchConfig::default(), &batch);
        assert_eq!(solved.rhs(), &[2.0], "{kind}");
    }
}

#[test]
fn test_scenario_c_dispatch_counts() {
    for levels in [10, 50, 200] {
        let config = BenchmarkConfig::new(1024, 1, StrategySelection::Both)
            .with_levels(levels)
            .with_warmup(0);
        let report = run_benchmark(&config, &HeatDiffusionGenerator::default())
            .unwrap()
            .report;
        assert_eq!(report.execution(StrategyKind::Range).unwrap().dispatches, 2 * levels);
        assert_eq!(report.execution(StrategyKind::Team).unwrap().dispatches, 1);
    }
}

#[test]
fn test_scenario_c_speedup_with_launch_overhead() {
    let dispatch = DispatchConfig::default().with_launch_overhead(Duration::from_micros(500));
    let speedup_at = |levels: usize| {
        let config = BenchmarkConfig::new(1024, 5, StrategySelection::Both)
            .with_levels(levels)
            .with_warmup(1)
            .with_dispatch(dispatch.clone());
        let report = run_benchmark(&config, &HeatDiffusionGenerator::default())
            .unwrap()
            .report;
        println!("{}", report.to_text());
        report.speedup.unwrap()
    };

    let short = speedup_at(10);
    let long = speedup_at(50);
    assert!(short > 1.0, "speedup at K=10: {short}");
    assert!(long > 1.0, "speedup at K=50: {long}");
    assert!(long >= short, "speedup shrank: K=10 {short}, K=50 {long}");
}

// ============================================================================
// Harness
// ============================================================================

#[test]
fn test_harness_validation_passes_for_both() {
    let config = BenchmarkConfig::new(256, 3, StrategySelection::Both)
        .with_levels(50)
        .with_layout(Layout::LevelFastest)
        .with_validation(1e-10);
    let outcome = run_benchmark(&config, &HeatDiffusionGenerator::default()).unwrap();
    for execution in &outcome.report.executions {
        let v = execution.validation.unwrap();
        assert!(v.passed);
        assert_eq!(v.max_abs_diff, 0.0);
    }
    assert_eq!(
        outcome.batch(StrategyKind::Range).unwrap(),
        outcome.batch(StrategyKind::Team).unwrap()
    );
}

#[test]
fn test_harness_json_report() {
    let config = BenchmarkConfig::new(32, 2, StrategySelection::Both)
        .with_levels(8)
        .with_warmup(0);
    let report = run_benchmark(&config, &HeatDiffusionGenerator::default())
        .unwrap()
        .report;
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["config"]["rows"], 32);
    assert_eq!(json["config"]["levels"], 8);
    assert_eq!(json["executions"][0]["strategy"], "range");
    assert_eq!(json["executions"][1]["strategy"], "team");
    assert!(json["speedup"].is_number());
}

#[test]
fn test_harness_on_injected_pool() {
    let config = BenchmarkConfig::new(128, 2, StrategySelection::Both)
        .with_levels(16)
        .with_dispatch(DispatchConfig::default().with_pool(pool(3)))
        .with_validation(0.0);
    let report = run_benchmark(&config, &HeatDiffusionGenerator::default())
        .unwrap()
        .report;
    assert_eq!(report.threads, 3);
    assert!(report.passed());
}
