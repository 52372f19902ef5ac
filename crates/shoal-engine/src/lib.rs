//! Configuration, scheduling and lifecycle for Shoal learners.
//!
//! - [`config`]: serde-derivable [`LearnerConfig`] / [`RegressionConfig`]
//!   with validation and building into boxed strategies.
//! - [`scheduler`]: [`TickScheduler`], the deterministic reference
//!   [`Scheduler`](shoal_core::Scheduler).
//! - [`learner`]: [`Learner`], one regression with its start/stop
//!   lifecycle and callback routing.
//! - [`pool`]: [`LearnerPool`], many learners on one clock.
//! - [`metrics`]: [`LearnerMetrics`] counters.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod learner;
pub mod metrics;
pub mod pool;
pub mod scheduler;

pub use config::{
    space_time_features, BuildContext, ConfigError, FeatureConfig, LearnerConfig,
    RegressionConfig,
};
pub use learner::{Learner, LearnerState};
pub use metrics::LearnerMetrics;
pub use pool::LearnerPool;
pub use scheduler::TickScheduler;
