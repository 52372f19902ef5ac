//! Arena of eligible prediction sites.
//!
//! Transductive strategies keep one piece of mutable state per site.
//! Instead of keying that state by coordinate, a [`SiteMap`] enumerates
//! the eligible cells of a [`Space`] once, assigns each a stable
//! [`SiteId`], and lets strategies store their state in a plain `Vec`
//! indexed by the same ids. The map itself is immutable after
//! construction and is shared between learners through `Arc`.

use crate::error::SpaceError;
use crate::space::Space;
use indexmap::IndexMap;
use shoal_core::{Coord, SiteId};
use std::fmt;
use std::sync::Arc;

/// A fixed, append-never list of eligible sites over a shared [`Space`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use shoal_space::{EdgeBehavior, SiteMap, Square4};
///
/// let space = Arc::new(Square4::new(3, 3, EdgeBehavior::Absorb).unwrap());
/// // Column 0 is land: only 6 of the 9 cells are sites.
/// let sites = SiteMap::with_mask(space, |c| c[1] != 0).unwrap();
/// assert_eq!(sites.len(), 6);
/// assert!(sites.site(&vec![1, 0].into()).is_none());
/// ```
#[derive(Clone)]
pub struct SiteMap {
    space: Arc<dyn Space>,
    sites: IndexMap<Coord, SiteId>,
}

impl SiteMap {
    /// Every cell of `space` is a site.
    pub fn from_space(space: Arc<dyn Space>) -> Result<Self, SpaceError> {
        Self::with_mask(space, |_| true)
    }

    /// Only cells for which `eligible` returns `true` become sites.
    ///
    /// Sites are numbered in the space's canonical order. Returns
    /// `Err(SpaceError::NoEligibleSites)` if the mask rejects every cell.
    pub fn with_mask(
        space: Arc<dyn Space>,
        eligible: impl Fn(&Coord) -> bool,
    ) -> Result<Self, SpaceError> {
        let mut sites = IndexMap::new();
        for coord in space.canonical_ordering() {
            if eligible(&coord) {
                let id = SiteId(sites.len() as u32);
                sites.insert(coord, id);
            }
        }
        if sites.is_empty() {
            return Err(SpaceError::NoEligibleSites);
        }
        tracing::debug!(
            sites = sites.len(),
            cells = space.cell_count(),
            "site map built"
        );
        Ok(Self { space, sites })
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Always `false`: construction rejects maps without sites.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// The space the sites were drawn from.
    pub fn space(&self) -> &Arc<dyn Space> {
        &self.space
    }

    /// The id of the site at `coord`, or `None` if `coord` is not a site.
    pub fn site(&self, coord: &Coord) -> Option<SiteId> {
        self.sites.get(coord).copied()
    }

    /// Whether `coord` is a site.
    pub fn contains(&self, coord: &Coord) -> bool {
        self.sites.contains_key(coord)
    }

    /// The coordinate of a site.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this map.
    pub fn coord(&self, id: SiteId) -> &Coord {
        self.sites
            .get_index(id.index())
            .map(|(coord, _)| coord)
            .unwrap_or_else(|| panic!("site {id} not in map of {} sites", self.len()))
    }

    /// Iterate over `(SiteId, &Coord)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SiteId, &Coord)> + '_ {
        self.sites.iter().map(|(coord, &id)| (id, coord))
    }

    /// Space distance between the sites' cells.
    pub fn distance(&self, a: SiteId, b: SiteId) -> f64 {
        self.space.distance(self.coord(a), self.coord(b))
    }
}

impl fmt::Debug for SiteMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteMap")
            .field("sites", &self.sites.len())
            .field("cells", &self.space.cell_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeBehavior, Square4};
    use smallvec::smallvec;

    fn grid(rows: u32, cols: u32) -> Arc<dyn Space> {
        Arc::new(Square4::new(rows, cols, EdgeBehavior::Absorb).unwrap())
    }

    #[test]
    fn full_map_numbers_sites_in_canonical_order() {
        let sites = SiteMap::from_space(grid(2, 3)).unwrap();
        assert_eq!(sites.len(), 6);
        let ids: Vec<u32> = sites.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(sites.coord(SiteId(4)).as_slice(), &[1, 1]);
        assert_eq!(sites.site(&smallvec![1, 2]), Some(SiteId(5)));
    }

    #[test]
    fn mask_excludes_cells_and_keeps_ids_dense() {
        let sites = SiteMap::with_mask(grid(3, 3), |c| c[0] != 1).unwrap();
        assert_eq!(sites.len(), 6);
        assert!(!sites.contains(&smallvec![1, 1]));
        // Row 2 follows row 0 directly.
        assert_eq!(sites.site(&smallvec![2, 0]), Some(SiteId(3)));
    }

    #[test]
    fn mask_rejecting_everything_is_an_error() {
        let err = SiteMap::with_mask(grid(2, 2), |_| false).unwrap_err();
        assert_eq!(err, SpaceError::NoEligibleSites);
    }

    #[test]
    fn distance_goes_through_space() {
        let sites = SiteMap::from_space(grid(4, 4)).unwrap();
        let a = sites.site(&smallvec![0, 0]).unwrap();
        let b = sites.site(&smallvec![3, 2]).unwrap();
        assert_eq!(sites.distance(a, b), 5.0);
    }

    #[test]
    fn off_grid_coordinates_are_not_sites() {
        let sites = SiteMap::from_space(grid(2, 2)).unwrap();
        assert_eq!(sites.site(&smallvec![5, 5]), None);
        assert_eq!(sites.site(&smallvec![0]), None);
    }
}
