//! Benchmarks for the batched solve strategies.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tridiag_batched::{DispatchConfig, StrategyKind};
use tridiag_core::{HeatDiffusionGenerator, Layout, ProblemGenerator};

fn bench_strategies(c: &mut Criterion) {
    let generator = HeatDiffusionGenerator::default();

    for levels in [8, 50] {
        let mut group = c.benchmark_group(format!("solve_levels_{}", levels));

        for rows in [1_000, 10_000, 100_000] {
            let batch = generator
                .generate(rows, levels, Layout::RowFastest)
                .expect("valid benchmark shape");

            for kind in [StrategyKind::Sequential, StrategyKind::Range, StrategyKind::Team] {
                group.bench_with_input(BenchmarkId::new(kind.name(), rows), &rows, |bencher, _| {
                    let mut solver = kind.create(DispatchConfig::default());
                    let mut work = batch.clone();
                    bencher.iter(|| {
                        work.set_rhs(batch.rhs()).unwrap();
                        solver.solve(black_box(&mut work)).unwrap();
                    });
                });
            }
        }

        group.finish();
    }
}

fn bench_layouts(c: &mut Criterion) {
    let generator = HeatDiffusionGenerator::default();
    let mut group = c.benchmark_group("team_layout");

    for layout in [Layout::RowFastest, Layout::LevelFastest] {
        let batch = generator
            .generate(50_000, 50, layout)
            .expect("valid benchmark shape");
        group.bench_with_input(
            BenchmarkId::from_parameter(layout.name()),
            &layout,
            |bencher, _| {
                let mut solver = StrategyKind::Team.create(DispatchConfig::default());
                let mut work = batch.clone();
                bencher.iter(|| {
                    work.set_rhs(batch.rhs()).unwrap();
                    solver.solve(black_box(&mut work)).unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_layouts);
criterion_main!(benches);
