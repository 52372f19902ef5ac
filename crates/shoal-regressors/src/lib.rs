//! Reference online regression strategies for Shoal.
//!
//! Every type here implements [`shoal_regression::Regression`]. They
//! fall into two families:
//!
//! - **Inductive**, answering at any coordinate from stored or summarised
//!   observations: [`NearestNeighborRegression`] (k-d tree, k-NN mean),
//!   [`BoundedKernelRegression`] (capacity-capped Nadaraya-Watson) and
//!   [`RecursiveLeastSquares`].
//! - **Transductive**, keeping one piece of state per site of a
//!   [`shoal_space::SiteMap`] and answering `NaN` elsewhere:
//!   [`TransductiveKernelRegression`], [`TransductiveNearestNeighbor`],
//!   [`ParticleFilterRegression`] and [`GoodBadRegression`].
//!
//! The particle filter and the good/bad classifier register a periodic
//! drift step with the owner's scheduler in `on_start`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bounded_kernel;
pub mod good_bad;
pub mod kdtree;
pub mod nearest_neighbor;
pub mod particle_filter;
pub mod rls;
pub mod transductive_kernel;
pub mod transductive_nn;

pub use bounded_kernel::{BoundedKernelRegression, BoundedKernelRegressionBuilder, EvictionPolicy};
pub use good_bad::GoodBadRegression;
pub use kdtree::{KdTree, Neighbor};
pub use nearest_neighbor::NearestNeighborRegression;
pub use particle_filter::{
    BeliefSummary, ParticleBelief, ParticleFilterRegression, ParticleFilterRegressionBuilder,
};
pub use rls::RecursiveLeastSquares;
pub use transductive_kernel::TransductiveKernelRegression;
pub use transductive_nn::TransductiveNearestNeighbor;
