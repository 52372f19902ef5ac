//! Shoal: spatial online regression for agent-based simulations.
//!
//! One dependency for simulations that embed Shoal learners: every
//! sub-crate is re-exported under a short module name, and [`prelude`]
//! pulls in what a vessel agent needs to observe catches and ask for
//! predictions.
//!
//! # Quick start
//!
//! ```rust
//! use shoal::prelude::*;
//! use std::sync::Arc;
//!
//! // A 10×10 grid where every cell is a fishing site.
//! let space = Square4::new(10, 10, EdgeBehavior::Absorb).unwrap();
//! let sites = Arc::new(SiteMap::from_space(Arc::new(space)).unwrap());
//!
//! let config = LearnerConfig {
//!     name: "skipper".into(),
//!     regression: RegressionConfig::GoodBad {
//!         bandwidth: 2.0,
//!         bad_avg: 0.0,
//!         good_avg: 10.0,
//!         deviation: 1.0,
//!         drift: 0.01,
//!     },
//!     seed: 42,
//! };
//! let mut pool = LearnerPool::from_configs(&[config], sites).unwrap();
//! pool.start();
//!
//! // A good catch at (3, 4), then a simulated day passes.
//! pool.observe(&Observation::at(3, 4, 0.0, 9.5));
//! pool.tick();
//!
//! let guess = pool.predict("skipper", &Coord::from_slice(&[3, 4]), 1.0);
//! assert!(guess.unwrap() > 0.0);
//! pool.stop();
//! ```
//!
//! # Modules
//!
//! Types outside the prelude are reached through these modules:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `shoal-core` | Ids, coordinates, observations, errors, the `Scheduler` trait |
//! | [`space`] | `shoal-space` | Spatial backends and the `SiteMap` |
//! | [`regression`] | `shoal-regression` | The `Regression` trait, features, kernels, metrics, parameters |
//! | [`regressors`] | `shoal-regressors` | The reference strategies and the k-d tree |
//! | [`engine`] | `shoal-engine` | Configuration, `TickScheduler`, `Learner`, `LearnerPool` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, ids, and errors (`shoal-core`).
///
/// Contains [`types::Observation`], [`types::Coord`], the error enums,
/// and the [`types::Scheduler`] boundary.
pub use shoal_core as types;

/// Spatial backends (`shoal-space`).
///
/// Provides the [`space::Space`] trait, [`space::Square4`],
/// [`space::Square8`], and the [`space::SiteMap`] arena.
pub use shoal_space as space;

/// The regression contract and its building blocks (`shoal-regression`).
pub use shoal_regression as regression;

/// Reference strategies (`shoal-regressors`).
///
/// Inductive: [`regressors::NearestNeighborRegression`],
/// [`regressors::BoundedKernelRegression`],
/// [`regressors::RecursiveLeastSquares`]. Transductive:
/// [`regressors::TransductiveKernelRegression`],
/// [`regressors::TransductiveNearestNeighbor`],
/// [`regressors::ParticleFilterRegression`],
/// [`regressors::GoodBadRegression`].
pub use shoal_regressors as regressors;

/// Configuration, scheduling, and lifecycle (`shoal-engine`).
pub use shoal_engine as engine;

/// Types for building, driving, and calibrating learners.
///
/// ```rust
/// use shoal::prelude::*;
/// ```
pub mod prelude {
    // Observations, ids, scheduling
    pub use shoal_core::{CancelHandle, Coord, Observation, Scheduler, SiteId, TickId};

    // Errors
    pub use shoal_core::{ParameterError, RegressionError};
    pub use shoal_engine::ConfigError;

    // Space
    pub use shoal_space::{EdgeBehavior, SiteMap, Space, Square4, Square8};

    // Regression
    pub use shoal_regression::{
        FeatureSet, KernelFunction, ParameterSnapshot, Regression, WeightedMetric,
    };

    // Engine
    pub use shoal_engine::{
        FeatureConfig, Learner, LearnerConfig, LearnerMetrics, LearnerPool, RegressionConfig,
        TickScheduler,
    };
}
