//! Eight-neighbour square grid, for fleets that steam diagonally.

use crate::edge::EdgeBehavior;
use crate::error::SpaceError;
use crate::grid2d;
use crate::space::Space;
use shoal_core::Coord;

/// Square cells addressed `[row, col]`, where a diagonal step costs the
/// same as a straight one.
///
/// Distance is the larger axis offset (Chebyshev). Borders follow the
/// map's [`EdgeBehavior`] exactly as in [`Square4`](crate::Square4).
#[derive(Debug, Clone)]
pub struct Square8 {
    rows: u32,
    cols: u32,
    edge: EdgeBehavior,
}

impl Square8 {
    /// A `rows` by `cols` map. Fails like [`Square4::new`](crate::Square4::new).
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

impl Space for Square8 {
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
            .max(grid2d::axis_distance(a[1], b[1], self.cols, self.edge))
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
    use crate::Square4;
    use smallvec::smallvec;
    use std::sync::Arc;

    fn at(row: i32, col: i32) -> Coord {
        smallvec![row, col]
    }

    #[test]
    fn diagonal_steps_cost_one() {
        let s = Square8::new(10, 10, EdgeBehavior::Absorb).unwrap();
        assert_eq!(s.distance(&at(0, 0), &at(3, 4)), 4.0);
        assert_eq!(s.distance(&at(2, 2), &at(5, 5)), 3.0);
        assert_eq!(s.distance(&at(7, 1), &at(7, 1)), 0.0);
    }

    #[test]
    fn torus_wraps_each_axis() {
        let s = Square8::new(10, 10, EdgeBehavior::Wrap).unwrap();
        assert_eq!(s.distance(&at(0, 0), &at(9, 8)), 2.0);
    }

    #[test]
    fn never_farther_than_four_neighbour_distance() {
        let eight = Square8::new(6, 9, EdgeBehavior::Absorb).unwrap();
        let four = Square4::new(6, 9, EdgeBehavior::Absorb).unwrap();
        for a in eight.canonical_ordering() {
            for b in eight.canonical_ordering() {
                assert!(eight.distance(&a, &b) <= four.distance(&a, &b));
            }
        }
    }

    #[test]
    fn zero_columns_rejected() {
        assert_eq!(
            Square8::new(4, 0, EdgeBehavior::Wrap).unwrap_err(),
            SpaceError::EmptySpace
        );
    }

    #[test]
    fn compliance_absorb() {
        compliance::run_full_compliance(Arc::new(Square8::new(5, 7, EdgeBehavior::Absorb).unwrap()));
    }

    #[test]
    fn compliance_wrap() {
        compliance::run_full_compliance(Arc::new(Square8::new(6, 6, EdgeBehavior::Wrap).unwrap()));
    }
}
