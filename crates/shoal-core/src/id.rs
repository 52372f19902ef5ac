//! Strongly-typed identifiers and the [`Coord`] type alias.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Identifies an eligible site within a `SiteMap`.
///
/// Sites are enumerated once when the map is built and assigned
/// sequential IDs. `SiteId(n)` indexes the n-th entry of every per-site
/// state array derived from that map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteId(pub u32);

impl SiteId {
    /// The site index as a `usize`, for indexing per-site arrays.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SiteId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing scheduler tick counter.
///
/// One tick is one scheduling step of the surrounding simulation
/// (a simulated day in the reference setup).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Receipt for a periodic callback registered with a [`Scheduler`].
///
/// Returned by `schedule_every` and handed back to `cancel` to stop
/// future invocations. Handles are never reused within one scheduler.
///
/// [`Scheduler`]: crate::Scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CancelHandle(pub u64);

impl fmt::Display for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A coordinate in the modelled spatial domain.
///
/// Uses `SmallVec<[i32; 4]>` to avoid heap allocation; the grids used
/// by the simulation are 2D (`[row, col]`).
pub type Coord = SmallVec<[i32; 4]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_id_indexes_as_usize() {
        assert_eq!(SiteId(7).index(), 7);
        assert_eq!(SiteId::from(3u32), SiteId(3));
    }

    #[test]
    fn ids_display_their_value() {
        assert_eq!(SiteId(12).to_string(), "12");
        assert_eq!(TickId(40).to_string(), "40");
        assert_eq!(CancelHandle(2).to_string(), "#2");
    }

    #[test]
    fn tick_ids_order_chronologically() {
        assert!(TickId(1) < TickId(2));
        assert_eq!(TickId::from(5u64), TickId(5));
    }
}
