//! Criterion benchmarks for a full pool: every strategy, one clock.

use criterion::{criterion_group, criterion_main, Criterion};
use shoal_bench::{reference_pool, reference_stream};
use std::hint::black_box;

fn bench_pool_day(c: &mut Criterion) {
    let mut pool = reference_pool();
    let stream = reference_stream(10_000, 7);
    let mut day = stream.chunks(10).cycle();

    // Warm up: a few days so trees and retained sets are non-trivial.
    for _ in 0..50 {
        for obs in day.next().unwrap() {
            pool.observe(obs);
        }
        pool.tick();
    }

    c.bench_function("pool_day_10_obs", |b| {
        b.iter(|| {
            for obs in day.next().unwrap() {
                black_box(pool.observe(obs));
            }
            black_box(pool.tick());
        });
    });
}

criterion_group!(benches, bench_pool_day);
criterion_main!(benches);
