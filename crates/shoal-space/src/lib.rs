//! Spatial domains for Shoal learners.
//!
//! This crate defines the [`Space`] trait (the distance and enumeration
//! contract every spatial domain satisfies) along with two lattice
//! backends and the [`SiteMap`] arena that transductive strategies use to
//! index their per-site state.
//!
//! # Backends
//!
//! - [`Square4`]: 2D grid, Manhattan (L1) distance
//! - [`Square8`]: 2D grid, Chebyshev (L-inf) distance
//!
//! Both take an [`EdgeBehavior`] that decides whether distances wrap.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod edge;
pub mod error;
mod grid2d;
pub mod sites;
pub mod space;
pub mod square4;
pub mod square8;

#[cfg(test)]
pub(crate) mod compliance;

pub use edge::EdgeBehavior;
pub use error::SpaceError;
pub use sites::SiteMap;
pub use space::Space;
pub use square4::Square4;
pub use square8::Square8;
