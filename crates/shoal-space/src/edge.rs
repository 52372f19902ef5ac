//! Spatial edge (boundary) behavior for lattice backends.

/// How a lattice space measures distance across its edges.
///
/// # Examples
///
/// ```
/// use shoal_space::{Square4, EdgeBehavior, Space};
///
/// let corner: shoal_core::Coord = vec![0i32, 0].into();
/// let far: shoal_core::Coord = vec![0i32, 9].into();
///
/// let bounded = Square4::new(10, 10, EdgeBehavior::Absorb).unwrap();
/// assert_eq!(bounded.distance(&corner, &far), 9.0);
///
/// // Wrap: the grid is a torus, so the far column is one step away.
/// let torus = Square4::new(10, 10, EdgeBehavior::Wrap).unwrap();
/// assert_eq!(torus.distance(&corner, &far), 1.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeBehavior {
    /// The grid ends at its border.
    Absorb,
    /// Periodic boundary: opposite edges are adjacent.
    Wrap,
}
