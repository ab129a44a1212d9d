//! Criterion benchmarks for the merge strategies.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gxtdb_merge::{MergeStrategy, merge};
use gxtdb_schema::results::{TestResult, TestResults};

fn suite(size: u32, offset_days: i64, pass_every: u32) -> TestResults {
    let base = chrono::NaiveDate::from_ymd_opt(2021, 6, 29)
        .and_then(|d| d.and_hms_opt(4, 29, 32))
        .unwrap_or_default();
    (0..size)
        .map(|index| {
            let status = if index % pass_every == 0 { "success" } else { "failed" };
            let time = base + chrono::Duration::days(offset_days) + chrono::Duration::seconds(index.into());
            (index, TestResult::new(status, Some(time)))
        })
        .collect()
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    for size in [8u32, 128, 2048] {
        let existing = suite(size, 0, 2);
        let incoming = suite(size, 30, 3);
        for strategy in MergeStrategy::ALL {
            group.bench_with_input(
                BenchmarkId::new(strategy.as_str(), size),
                &(&existing, &incoming),
                |b, (existing, incoming)| {
                    b.iter(|| merge(black_box(existing), black_box(incoming), strategy));
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_strategies);
criterion_main!(benches);
