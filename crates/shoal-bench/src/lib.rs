//! Benchmark profiles and utilities for the Shoal framework.
//!
//! Provides pre-built inputs for benchmarking:
//!
//! - [`reference_sites`]: 50x50 grid (2.5K sites)
//! - [`reference_stream`]: deterministic observation stream over that grid
//! - [`reference_pool`]: one learner per strategy, ready to observe

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shoal_core::{Coord, Observation};
use shoal_engine::{
    space_time_features, FeatureConfig, LearnerConfig, LearnerPool, RegressionConfig,
};
use shoal_regression::{DistanceTransform, KernelFunction};
use shoal_space::{EdgeBehavior, SiteMap, Space, Square4};
use smallvec::smallvec;

/// Side length of the reference grid.
pub const REFERENCE_SIDE: u32 = 50;

/// Every cell of a 50x50 absorbing grid.
pub fn reference_sites() -> Arc<SiteMap> {
    let space: Arc<dyn Space> =
        Arc::new(Square4::new(REFERENCE_SIDE, REFERENCE_SIDE, EdgeBehavior::Absorb).unwrap());
    Arc::new(SiteMap::from_space(space).unwrap())
}

/// `n` observations of a smooth field plus uniform noise, one per time
/// step, at cells drawn from `seed`.
pub fn reference_stream(n: usize, seed: u64) -> Vec<Observation> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let side = REFERENCE_SIDE as i32;
    (0..n)
        .map(|i| {
            let row = rng.random_range(0..side);
            let col = rng.random_range(0..side);
            let value = (row as f64 / 8.0).sin() * 5.0 + col as f64 / 10.0 + rng.random::<f64>();
            let coord: Coord = smallvec![row, col];
            Observation::new(coord, i as f64, value)
        })
        .collect()
}

/// One learner per strategy.
pub fn reference_configs() -> Vec<LearnerConfig> {
    let grid = vec![FeatureConfig::GridX, FeatureConfig::GridY];
    let strategies = vec![
        (
            "knn",
            RegressionConfig::NearestNeighbor {
                features: space_time_features(),
                transforms: vec![DistanceTransform::Absolute; 3],
                bandwidths: vec![1.0, 1.0, 50.0],
                neighbors: 5,
            },
        ),
        (
            "bounded_kernel",
            RegressionConfig::BoundedKernel {
                features: space_time_features(),
                kernel: KernelFunction::Logistic,
                bandwidth: 5.0,
                capacity: 200,
                eviction: Default::default(),
                restrict_to_sites: false,
            },
        ),
        (
            "transductive_kernel",
            RegressionConfig::TransductiveKernel {
                features: grid.clone(),
                kernel: KernelFunction::Gaussian,
                bandwidths: vec![3.0, 3.0],
                forgetting: 0.98,
            },
        ),
        (
            "transductive_nn",
            RegressionConfig::TransductiveNearestNeighbor {
                features: grid.clone(),
                transforms: vec![DistanceTransform::Absolute; 2],
                bandwidths: vec![1.0, 1.0],
                placeholder: None,
            },
        ),
        (
            "rls",
            RegressionConfig::RecursiveLeastSquares {
                features: vec![
                    FeatureConfig::GridX,
                    FeatureConfig::GridY,
                    FeatureConfig::Constant { value: 1.0 },
                ],
                forgetting: 0.99,
                noise: 1.0,
                initial_uncertainty: 1e4,
            },
        ),
        (
            "particles",
            RegressionConfig::ParticleFilter {
                particles: 50,
                min: -10.0,
                max: 20.0,
                temporal_drift: 0.1,
                evidence_deviation: 1.0,
                distance_noise: 0.5,
                informative_ratio: 0.5,
                resample_threshold: 0.5,
                drift_period: 1,
            },
        ),
        (
            "good_bad",
            RegressionConfig::GoodBad {
                bandwidth: 5.0,
                bad_avg: 0.0,
                good_avg: 10.0,
                deviation: 2.0,
                drift: 0.01,
            },
        ),
    ];
    strategies
        .into_iter()
        .map(|(name, regression)| LearnerConfig {
            name: name.into(),
            regression,
            seed: 42,
        })
        .collect()
}

/// A started pool over [`reference_sites`] with [`reference_configs`].
pub fn reference_pool() -> LearnerPool {
    let mut pool = LearnerPool::from_configs(&reference_configs(), reference_sites()).unwrap();
    pool.start();
    pool
}
