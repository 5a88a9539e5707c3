//! Benchmarks for matrix normalization and trend series construction
//!
//! Run with: cargo bench

use cohort_dashboard::matrix::normalize;
use cohort_dashboard::models::{CohortSizes, CohortTable, MetricKind};
use cohort_dashboard::trends::build_series;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Triangular table: cohort `c` has `periods - c` observed periods, the usual
/// shape of a cohort retention table.
fn generate_table(cohorts: usize, periods: usize) -> (CohortTable, CohortSizes) {
    let mut table = CohortTable::new();
    let mut sizes = CohortSizes::new();

    for c in 0..cohorts {
        let key = format!("{}-{:02}-01", 2015 + c / 12, c % 12 + 1);
        let cells = (0..periods.saturating_sub(c).max(1))
            .map(|p| (p.to_string(), 0.9f64.powi(p as i32)))
            .collect();
        table.insert(key.clone(), cells);
        sizes.insert(key, 100 + c as u64);
    }

    (table, sizes)
}

fn benchmark_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for size in [12, 52, 120].iter() {
        let (table, sizes) = generate_table(*size, *size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| normalize(black_box(&table), black_box(&sizes), 20, 12))
        });
    }

    group.finish();
}

fn benchmark_build_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_series");

    for size in [12, 52, 120].iter() {
        let (table, _) = generate_table(*size, *size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| build_series(black_box(&table), "monthly", MetricKind::Retention))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_normalize, benchmark_build_series);
criterion_main!(benches);
