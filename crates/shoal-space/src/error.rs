//! Failures when building a map or its site arena.

use std::fmt;

/// Why a [`Space`](crate::Space) or [`SiteMap`](crate::SiteMap) could not
/// be built.
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceError {
    /// A grid dimension was zero.
    EmptySpace,
    /// A grid dimension cannot be addressed with `i32` coordinates.
    DimensionTooLarge {
        /// `"rows"` or `"cols"`.
        name: &'static str,
        /// What was asked for.
        value: u32,
        /// Upper limit.
        max: u32,
    },
    /// The eligibility mask excluded every cell of the space.
    NoEligibleSites,
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySpace => f.write_str("grid has a zero dimension"),
            Self::DimensionTooLarge { name, value, max } => {
                write!(f, "{name} = {value} is above the limit of {max}")
            }
            Self::NoEligibleSites => f.write_str("no cell of the space is an eligible site"),
        }
    }
}

impl std::error::Error for SpaceError {}
