//! Checks every `Space` backend must pass, shared by their test modules.

use crate::sites::SiteMap;
use crate::space::Space;
use indexmap::IndexSet;
use shoal_core::SiteId;
use std::sync::Arc;

/// Distance is a metric over the enumerated cells: zero on the diagonal,
/// symmetric, and obeys the triangle inequality.
pub fn check_metric(space: &dyn Space) {
    let cells = space.canonical_ordering();
    for a in &cells {
        assert_eq!(space.distance(a, a), 0.0, "d({a:?}, {a:?}) != 0");
        for b in &cells {
            let ab = space.distance(a, b);
            assert_eq!(ab, space.distance(b, a), "d({a:?}, {b:?}) is not symmetric");
            for c in &cells {
                let ac = space.distance(a, c);
                let bc = space.distance(b, c);
                assert!(
                    ac <= ab + bc + f64::EPSILON,
                    "d({a:?},{c:?})={ac} exceeds d({a:?},{b:?})={ab} + d({b:?},{c:?})={bc}"
                );
            }
        }
    }
}

/// The canonical ordering is stable, lists each contained cell once,
/// and agrees with `canonical_rank`.
pub fn check_ordering(space: &dyn Space) {
    let ordering = space.canonical_ordering();
    assert_eq!(ordering, space.canonical_ordering(), "ordering changed between calls");
    assert_eq!(ordering.len(), space.cell_count());
    let distinct: IndexSet<_> = ordering.iter().collect();
    assert_eq!(distinct.len(), ordering.len(), "ordering repeats a cell");
    for (rank, coord) in ordering.iter().enumerate() {
        assert!(space.contains(coord), "{coord:?} enumerated but not contained");
        assert_eq!(space.canonical_rank(coord), Some(rank));
    }
}

/// A full site map numbers sites by canonical rank.
pub fn check_site_numbering(space: Arc<dyn Space>) {
    let sites = SiteMap::from_space(Arc::clone(&space)).expect("backend has cells");
    assert_eq!(sites.len(), space.cell_count());
    for (id, coord) in sites.iter() {
        assert_eq!(Some(id.index()), space.canonical_rank(coord));
        assert_eq!(sites.site(coord), Some(id));
    }
    assert_eq!(sites.iter().last().map(|(id, _)| id), Some(SiteId(sites.len() as u32 - 1)));
}

/// Every check above.
pub fn run_full_compliance(space: Arc<dyn Space>) {
    check_metric(space.as_ref());
    check_ordering(space.as_ref());
    check_site_numbering(space);
}
