//! Density filter benchmarks

use std::collections::BTreeSet;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use snptree::filter::WindowFilter;

/// Deterministic pseudo-random positions over a 4.5 Mb chromosome.
fn positions(count: usize) -> BTreeSet<u64> {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state % 4_500_000
        })
        .collect()
}

fn benchmark_window_filter(c: &mut Criterion) {
    let filter = WindowFilter::default();
    let mut group = c.benchmark_group("window_filter");
    for count in [1_000, 10_000, 100_000] {
        let set = positions(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &set, |b, set| {
            b.iter(|| black_box(filter.retain(black_box(set))));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_window_filter);
criterion_main!(benches);
