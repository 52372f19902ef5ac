//! The immutable observation record delivered to learners.

use crate::id::Coord;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Ordered feature values, one per configured extractor.
///
/// Inline capacity covers the common grid-x / grid-y / time layout
/// without touching the heap.
pub type FeatureVector = SmallVec<[f64; 4]>;

/// A single point observation: the value seen at `coord` at `time`.
///
/// Observations are produced outside this framework (for example by
/// converting a completed trip's catch into a scalar) and are consumed by
/// exactly one learner per `observe` call. They are never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Grid cell where the value was observed.
    pub coord: Coord,
    /// Observation time, in hours since the simulation epoch.
    pub time: f64,
    /// Observed scalar value.
    pub value: f64,
}

impl Observation {
    /// Create a new observation.
    pub fn new(coord: impl Into<Coord>, time: f64, value: f64) -> Self {
        Self {
            coord: coord.into(),
            time,
            value,
        }
    }

    /// Convenience constructor for 2D grids (`[row, col]`).
    ///
    /// ```
    /// use shoal_core::Observation;
    ///
    /// let obs = Observation::at(3, 4, 12.0, 0.5);
    /// assert_eq!(obs.coord.as_slice(), &[3, 4]);
    /// assert_eq!(obs.time, 12.0);
    /// ```
    pub fn at(row: i32, col: i32, time: f64, value: f64) -> Self {
        Self {
            coord: smallvec::smallvec![row, col],
            time,
            value,
        }
    }
}
