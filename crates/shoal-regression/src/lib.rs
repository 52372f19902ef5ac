//! The regression contract and its shared building blocks.
//!
//! Every online learner in Shoal implements [`Regression`]. The pieces
//! the strategies have in common live here as well: the
//! [`FeatureExtractor`]s that turn a `(coord, time)` pair into a
//! feature vector, the [`KernelFunction`]s that turn a scaled distance
//! into a weight, the [`WeightedMetric`] used for distances between
//! feature vectors, and the [`params`] helpers that validate flat
//! hyperparameter vectors.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod distance;
pub mod features;
pub mod kernel;
pub mod params;
pub mod regression;

pub use distance::{DistanceTransform, WeightedMetric};
pub use features::{
    CellLookup, Constant, FeatureExtractor, FeatureSet, GridX, GridY, ObservationTime,
    PortDistance,
};
pub use kernel::{CompositeKernel, KernelFunction, NEGLIGIBLE_WEIGHT};
pub use params::ParameterSnapshot;
pub use regression::Regression;
