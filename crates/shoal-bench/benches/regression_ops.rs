//! Criterion micro-benchmarks for predict/observe hot paths.

use criterion::{criterion_group, criterion_main, Criterion};
use shoal_bench::{reference_sites, reference_stream};
use shoal_core::Coord;
use shoal_regression::{Regression, WeightedMetric};
use shoal_regressors::{
    BoundedKernelRegression, KdTree, NearestNeighborRegression, ParticleFilterRegression,
};
use smallvec::smallvec;
use std::hint::black_box;

/// Benchmark: 5-NN query against a 10K-point tree.
fn bench_kdtree_nearest_10k(c: &mut Criterion) {
    let metric = WeightedMetric::unit(3);
    let mut tree = KdTree::new(3);
    for obs in reference_stream(10_000, 1) {
        tree.insert(&[obs.coord[1] as f64, obs.coord[0] as f64, obs.time], obs.value);
    }

    c.bench_function("kdtree_nearest_10k", |b| {
        b.iter(|| {
            let n = tree.nearest(black_box(&[25.0, 25.0, 5_000.0]), 5, &metric);
            black_box(&n);
        });
    });
}

/// Benchmark: k-NN regression predict after 10K observations.
fn bench_nn_predict_10k(c: &mut Criterion) {
    let mut r = NearestNeighborRegression::space_time(5, 1.0, 100.0).unwrap();
    for obs in reference_stream(10_000, 2) {
        r.observe(&obs).unwrap();
    }
    let here: Coord = smallvec![10, 40];

    c.bench_function("nn_predict_10k", |b| {
        b.iter(|| black_box(r.predict(black_box(&here), 10_000.0)));
    });
}

/// Benchmark: bounded kernel predict over a full 500-observation set.
fn bench_bounded_kernel_predict_500(c: &mut Criterion) {
    let mut r = BoundedKernelRegression::builder()
        .bandwidth(5.0)
        .capacity(500)
        .build()
        .unwrap();
    for obs in reference_stream(1_000, 3) {
        r.observe(&obs).unwrap();
    }
    let here: Coord = smallvec![25, 25];

    c.bench_function("bounded_kernel_predict_500", |b| {
        b.iter(|| black_box(r.predict(black_box(&here), 1_000.0)));
    });
}

/// Benchmark: one particle-filter evidence update across 2.5K sites.
fn bench_particle_evidence_2500(c: &mut Criterion) {
    let mut r = ParticleFilterRegression::builder()
        .sites(reference_sites())
        .range(-10.0, 20.0)
        .particles(50)
        .distance_noise(0.5)
        .informative_ratio(0.5)
        .seed(4)
        .build()
        .unwrap();
    let stream = reference_stream(1_000, 5);
    let mut i = 0;

    c.bench_function("particle_evidence_2500", |b| {
        b.iter(|| {
            r.observe(&stream[i % stream.len()]).unwrap();
            i += 1;
        });
    });
}

criterion_group!(
    benches,
    bench_kdtree_nearest_10k,
    bench_nn_predict_10k,
    bench_bounded_kernel_predict_500,
    bench_particle_evidence_2500
);
criterion_main!(benches);
