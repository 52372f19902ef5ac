//! Core types and traits for the Shoal online-learning framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: grid
//! coordinates, site and tick identifiers, the immutable [`Observation`]
//! record, error types, and the [`Scheduler`] boundary through which
//! strategies register periodic callbacks.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod observation;
pub mod schedule;

pub use error::{ParameterError, RegressionError};
pub use id::{CancelHandle, Coord, SiteId, TickId};
pub use observation::{FeatureVector, Observation};
pub use schedule::Scheduler;
