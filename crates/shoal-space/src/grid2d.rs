//! Shared helpers for 2D grid backends (Square4, Square8).

use crate::edge::EdgeBehavior;
use crate::error::SpaceError;
use shoal_core::Coord;
use smallvec::smallvec;

/// Largest accepted grid dimension: coordinates are `i32`.
pub(crate) const MAX_DIM: u32 = i32::MAX as u32;

/// Validate grid dimensions shared by both 2D backends.
pub(crate) fn check_dims(rows: u32, cols: u32) -> Result<(), SpaceError> {
    if rows == 0 || cols == 0 {
        return Err(SpaceError::EmptySpace);
    }
    if rows > MAX_DIM {
        return Err(SpaceError::DimensionTooLarge {
            name: "rows",
            value: rows,
            max: MAX_DIM,
        });
    }
    if cols > MAX_DIM {
        return Err(SpaceError::DimensionTooLarge {
            name: "cols",
            value: cols,
            max: MAX_DIM,
        });
    }
    Ok(())
}

/// Whether `coord` is a 2D coordinate inside `[0, rows) x [0, cols)`.
pub(crate) fn in_bounds(coord: &[i32], rows: u32, cols: u32) -> bool {
    coord.len() == 2
        && coord[0] >= 0
        && coord[0] < rows as i32
        && coord[1] >= 0
        && coord[1] < cols as i32
}

/// Row-major canonical ordering: `[0,0], [0,1], ..., [rows-1, cols-1]`.
pub(crate) fn canonical_ordering_2d(rows: u32, cols: u32) -> Vec<Coord> {
    let mut out = Vec::with_capacity((rows as usize) * (cols as usize));
    for r in 0..rows as i32 {
        for c in 0..cols as i32 {
            out.push(smallvec![r, c]);
        }
    }
    out
}

/// O(1) row-major rank of an in-bounds 2D coordinate.
pub(crate) fn canonical_rank_2d(coord: &[i32], rows: u32, cols: u32) -> Option<usize> {
    if !in_bounds(coord, rows, cols) {
        return None;
    }
    Some(coord[0] as usize * cols as usize + coord[1] as usize)
}

/// 1D distance along a single axis, accounting for wrap.
pub(crate) fn axis_distance(a: i32, b: i32, len: u32, edge: EdgeBehavior) -> f64 {
    let diff = (a - b).unsigned_abs();
    match edge {
        EdgeBehavior::Wrap => {
            let diff = diff % len.max(1);
            diff.min(len - diff) as f64
        }
        EdgeBehavior::Absorb => diff as f64,
    }
}
