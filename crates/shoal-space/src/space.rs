//! The `Space` trait: the map every learner predicts over.

use shoal_core::Coord;
use smallvec::SmallVec;
use std::any::Any;

/// A discretised spatial domain that learners predict over.
///
/// Concrete backends ([`Square4`](crate::Square4),
/// [`Square8`](crate::Square8)) define how cells are enumerated and how
/// far apart two cells are. Feature extractors, site maps and the
/// particle filter's distance-dependent noise all go through this trait.
///
/// # Sharing
///
/// Backends are `Send + Sync`: a space is shared read-only (via
/// `Arc`) by every learner built on top of it.
pub trait Space: Any + Send + Sync + 'static {
    /// Coordinate arity.
    fn ndim(&self) -> usize;

    /// How many cells the map has.
    fn cell_count(&self) -> usize;

    /// Whether `coord` names a cell of this space.
    fn contains(&self, coord: &Coord) -> bool;

    /// Distance between two cells, in cell units.
    fn distance(&self, a: &Coord, b: &Coord) -> f64;

    /// Every cell, in a fixed order.
    ///
    /// Repeated calls return identical vectors; `SiteId`s are handed out
    /// in this order.
    fn canonical_ordering(&self) -> Vec<Coord>;

    /// Index of `coord` within [`canonical_ordering`](Space::canonical_ordering),
    /// `None` off the map.
    ///
    /// The provided body scans the whole ordering; grids compute it.
    fn canonical_rank(&self, coord: &Coord) -> Option<usize> {
        self.canonical_ordering().iter().position(|c| c == coord)
    }

    /// [`canonical_rank`](Space::canonical_rank) for a borrowed slice.
    fn canonical_rank_slice(&self, coord: &[i32]) -> Option<usize> {
        let coord: Coord = SmallVec::from_slice(coord);
        self.canonical_rank(&coord)
    }
}

impl dyn Space {
    /// The concrete backend behind a shared map, if it is a `T`.
    pub fn downcast_ref<T: Space>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}
