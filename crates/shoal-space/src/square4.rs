//! Four-neighbour square grid: the default fishing map.

use crate::edge::EdgeBehavior;
use crate::error::SpaceError;
use crate::grid2d;
use crate::space::Space;
use shoal_core::Coord;

/// Square cells addressed `[row, col]`, measured in cardinal steps.
///
/// A boat moving between cells travels along rows and columns, so the
/// distance between `[r1, c1]` and `[r2, c2]` is `|r1 - r2| + |c1 - c2|`.
/// Under [`EdgeBehavior::Wrap`] each axis is measured the short way round
/// a torus.
#[derive(Debug, Clone)]
pub struct Square4 {
    rows: u32,
    cols: u32,
    edge: EdgeBehavior,
}

impl Square4 {
    /// A `rows` by `cols` map.
    ///
    /// # Errors
    ///
    /// `EmptySpace` for a zero dimension, `DimensionTooLarge` when a
    /// dimension cannot be addressed with `i32` coordinates.
    ///
    /// ```
    /// use shoal_space::{EdgeBehavior, Space, Square4};
    /// use smallvec::smallvec;
    ///
    /// let sea = Square4::new(20, 30, EdgeBehavior::Absorb).unwrap();
    /// assert_eq!(sea.cell_count(), 600);
    /// assert_eq!(sea.distance(&smallvec![0, 0], &smallvec![2, 5]), 7.0);
    /// ```
    pub fn new(rows: u32, cols: u32, edge: EdgeBehavior) -> Result<Self, SpaceError> {
        grid2d::check_dims(rows, cols)?;
        Ok(Self { rows, cols, edge })
    }

    /// Row count.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// How the map's borders behave.
    pub fn edge_behavior(&self) -> EdgeBehavior {
        self.edge
    }
}

impl Space for Square4 {
    fn ndim(&self) -> usize {
        2
    }

    fn cell_count(&self) -> usize {
        (self.rows as usize) * (self.cols as usize)
    }

    fn contains(&self, coord: &Coord) -> bool {
        grid2d::in_bounds(coord, self.rows, self.cols)
    }

    fn distance(&self, a: &Coord, b: &Coord) -> f64 {
        grid2d::axis_distance(a[0], b[0], self.rows, self.edge)
            + grid2d::axis_distance(a[1], b[1], self.cols, self.edge)
    }

    fn canonical_ordering(&self) -> Vec<Coord> {
        grid2d::canonical_ordering_2d(self.rows, self.cols)
    }

    fn canonical_rank(&self, coord: &Coord) -> Option<usize> {
        grid2d::canonical_rank_2d(coord, self.rows, self.cols)
    }

    fn canonical_rank_slice(&self, coord: &[i32]) -> Option<usize> {
        grid2d::canonical_rank_2d(coord, self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance;
    use proptest::prelude::*;
    use smallvec::smallvec;
    use std::sync::Arc;

    fn at(row: i32, col: i32) -> Coord {
        smallvec![row, col]
    }

    fn sea(rows: u32, cols: u32, edge: EdgeBehavior) -> Square4 {
        Square4::new(rows, cols, edge).unwrap()
    }

    // ── Distance ────────────────────────────────────────────────

    #[test]
    fn steps_add_across_axes() {
        let s = sea(10, 10, EdgeBehavior::Absorb);
        assert_eq!(s.distance(&at(0, 0), &at(3, 4)), 7.0);
        assert_eq!(s.distance(&at(9, 1), &at(4, 3)), 7.0);
        assert_eq!(s.distance(&at(0, 0), &at(9, 9)), 18.0);
    }

    #[test]
    fn torus_takes_short_way_round() {
        let s = sea(10, 10, EdgeBehavior::Wrap);
        assert_eq!(s.distance(&at(0, 0), &at(9, 9)), 2.0);
        assert_eq!(s.distance(&at(0, 0), &at(5, 0)), 5.0);
        assert_eq!(s.distance(&at(1, 1), &at(3, 4)), 5.0);
    }

    // ── Membership ──────────────────────────────────────────────

    #[test]
    fn contains_only_in_bounds_pairs() {
        let s = sea(3, 4, EdgeBehavior::Absorb);
        assert!(s.contains(&at(2, 3)));
        assert!(!s.contains(&at(3, 0)));
        assert!(!s.contains(&at(0, -1)));
        assert!(!s.contains(&smallvec![1]));
        assert!(!s.contains(&smallvec![1, 1, 1]));
    }

    #[test]
    fn ranks_run_along_rows() {
        let s = sea(3, 4, EdgeBehavior::Absorb);
        let ranks: Vec<_> = [at(0, 0), at(0, 3), at(1, 0), at(2, 3)]
            .iter()
            .map(|c| s.canonical_rank(c))
            .collect();
        assert_eq!(ranks, vec![Some(0), Some(3), Some(4), Some(11)]);
        assert_eq!(s.canonical_rank_slice(&[1, 2]), Some(6));
        assert_eq!(s.canonical_rank(&at(0, 4)), None);
    }

    #[test]
    fn bad_dimensions_are_rejected() {
        assert_eq!(
            Square4::new(0, 5, EdgeBehavior::Absorb).unwrap_err(),
            SpaceError::EmptySpace
        );
        let huge = i32::MAX as u32 + 1;
        assert!(matches!(
            Square4::new(huge, 5, EdgeBehavior::Wrap),
            Err(SpaceError::DimensionTooLarge { name: "rows", .. })
        ));
        assert!(matches!(
            Square4::new(5, huge, EdgeBehavior::Absorb),
            Err(SpaceError::DimensionTooLarge { name: "cols", .. })
        ));
    }

    #[test]
    fn dyn_space_downcasts_to_square4_only() {
        let s: Arc<dyn Space> = Arc::new(sea(2, 2, EdgeBehavior::Absorb));
        assert_eq!(s.downcast_ref::<Square4>().map(Square4::rows), Some(2));
        assert!(s.downcast_ref::<crate::Square8>().is_none());
    }

    // ── Compliance ──────────────────────────────────────────────

    #[test]
    fn compliance_absorb() {
        compliance::run_full_compliance(Arc::new(sea(6, 6, EdgeBehavior::Absorb)));
    }

    #[test]
    fn compliance_wrap() {
        compliance::run_full_compliance(Arc::new(sea(6, 5, EdgeBehavior::Wrap)));
    }

    // ── Properties ──────────────────────────────────────────────

    proptest! {
        #[test]
        fn wrapping_never_lengthens_a_trip(
            rows in 1u32..12,
            cols in 1u32..12,
            a in (0i32..12, 0i32..12),
            b in (0i32..12, 0i32..12),
        ) {
            let a = at(a.0 % rows as i32, a.1 % cols as i32);
            let b = at(b.0 % rows as i32, b.1 % cols as i32);
            let flat = sea(rows, cols, EdgeBehavior::Absorb).distance(&a, &b);
            let torus = sea(rows, cols, EdgeBehavior::Wrap).distance(&a, &b);
            prop_assert!(torus <= flat);
            prop_assert!(torus <= f64::from(rows / 2 + cols / 2));
            prop_assert!(flat <= f64::from(rows + cols - 2));
        }
    }
}
