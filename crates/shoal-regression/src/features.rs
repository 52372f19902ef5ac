//! Feature extractors: `(coord, time) -> f64`.
//!
//! A [`FeatureSet`] is an ordered list of extractors; its output is the
//! [`FeatureVector`] that kernels and metrics operate on. Extractors are
//! immutable and shared behind `Arc`, so one set can serve every learner
//! in a fleet.

use indexmap::IndexMap;
use shoal_core::{Coord, FeatureVector};
use shoal_space::Space;
use std::fmt;
use std::sync::Arc;

/// A pure function from a location and time to one scalar feature.
///
/// Returns `NaN` when the feature is undefined at `coord`.
pub trait FeatureExtractor: Send + Sync {
    /// Feature label, used in parameter names.
    fn name(&self) -> &str;

    /// Evaluate the feature.
    fn extract(&self, coord: &Coord, time: f64) -> f64;
}

/// The grid column (`coord[1]`).
#[derive(Clone, Copy, Debug, Default)]
pub struct GridX;

impl FeatureExtractor for GridX {
    fn name(&self) -> &str {
        "grid_x"
    }

    fn extract(&self, coord: &Coord, _time: f64) -> f64 {
        coord.get(1).map_or(f64::NAN, |&c| c as f64)
    }
}

/// The grid row (`coord[0]`).
#[derive(Clone, Copy, Debug, Default)]
pub struct GridY;

impl FeatureExtractor for GridY {
    fn name(&self) -> &str {
        "grid_y"
    }

    fn extract(&self, coord: &Coord, _time: f64) -> f64 {
        coord.first().map_or(f64::NAN, |&c| c as f64)
    }
}

/// The observation or query time itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObservationTime;

impl FeatureExtractor for ObservationTime {
    fn name(&self) -> &str {
        "time"
    }

    fn extract(&self, _coord: &Coord, time: f64) -> f64 {
        time
    }
}

/// A fixed value, typically the intercept column of a linear model.
#[derive(Clone, Copy, Debug)]
pub struct Constant(pub f64);

impl Default for Constant {
    fn default() -> Self {
        Self(1.0)
    }
}

impl FeatureExtractor for Constant {
    fn name(&self) -> &str {
        "constant"
    }

    fn extract(&self, _coord: &Coord, _time: f64) -> f64 {
        self.0
    }
}

/// Space distance from a fixed home port.
pub struct PortDistance {
    space: Arc<dyn Space>,
    port: Coord,
}

impl PortDistance {
    /// Distances are measured in `space` from `port`.
    pub fn new(space: Arc<dyn Space>, port: Coord) -> Self {
        Self { space, port }
    }

    /// The port coordinate.
    pub fn port(&self) -> &Coord {
        &self.port
    }
}

impl fmt::Debug for PortDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortDistance")
            .field("port", &self.port)
            .finish()
    }
}

impl FeatureExtractor for PortDistance {
    fn name(&self) -> &str {
        "port_distance"
    }

    fn extract(&self, coord: &Coord, _time: f64) -> f64 {
        if !self.space.contains(coord) {
            return f64::NAN;
        }
        self.space.distance(&self.port, coord)
    }
}

/// A per-cell lookup table, e.g. a habitat index.
///
/// Cells missing from the table evaluate to `NaN`.
#[derive(Clone, Debug)]
pub struct CellLookup {
    name: String,
    table: IndexMap<Coord, f64>,
}

impl CellLookup {
    /// Build from `(coord, value)` pairs. Later duplicates win.
    pub fn new(name: impl Into<String>, entries: impl IntoIterator<Item = (Coord, f64)>) -> Self {
        Self {
            name: name.into(),
            table: entries.into_iter().collect(),
        }
    }

    /// Number of cells in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table has no cells.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl FeatureExtractor for CellLookup {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, coord: &Coord, _time: f64) -> f64 {
        self.table.get(coord).copied().unwrap_or(f64::NAN)
    }
}

/// An ordered, shareable list of extractors.
///
/// Cloning is cheap: extractors are reference counted.
#[derive(Clone, Default)]
pub struct FeatureSet {
    extractors: Vec<Arc<dyn FeatureExtractor>>,
}

impl FeatureSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// `[grid_x, grid_y]`.
    pub fn grid() -> Self {
        Self::new().with(GridX).with(GridY)
    }

    /// `[grid_x, grid_y, time]`.
    pub fn space_time() -> Self {
        Self::grid().with(ObservationTime)
    }

    /// Append an extractor.
    pub fn with(mut self, extractor: impl FeatureExtractor + 'static) -> Self {
        self.extractors.push(Arc::new(extractor));
        self
    }

    /// Append an already-shared extractor.
    pub fn push(&mut self, extractor: Arc<dyn FeatureExtractor>) {
        self.extractors.push(extractor);
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Whether there are no features.
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Feature labels in order.
    pub fn names(&self) -> Vec<String> {
        self.extractors.iter().map(|e| e.name().to_string()).collect()
    }

    /// Evaluate every extractor.
    pub fn extract(&self, coord: &Coord, time: f64) -> FeatureVector {
        self.extractors
            .iter()
            .map(|e| e.extract(coord, time))
            .collect()
    }
}

impl fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_space::{EdgeBehavior, Square4};
    use smallvec::smallvec;

    #[test]
    fn grid_features_read_row_and_column() {
        let c: Coord = smallvec![2, 7];
        assert_eq!(GridX.extract(&c, 0.0), 7.0);
        assert_eq!(GridY.extract(&c, 0.0), 2.0);
        assert_eq!(ObservationTime.extract(&c, 36.5), 36.5);
    }

    #[test]
    fn grid_x_of_one_dimensional_coord_is_nan() {
        assert!(GridX.extract(&smallvec![3], 0.0).is_nan());
    }

    #[test]
    fn port_distance_is_nan_off_grid() {
        let space = Arc::new(Square4::new(5, 5, EdgeBehavior::Absorb).unwrap());
        let port = PortDistance::new(space, smallvec![0, 0]);
        assert_eq!(port.extract(&smallvec![2, 3], 0.0), 5.0);
        assert!(port.extract(&smallvec![9, 9], 0.0).is_nan());
    }

    #[test]
    fn cell_lookup_misses_are_nan() {
        let habitat = CellLookup::new("habitat", [(smallvec![1, 1], 0.8)]);
        assert_eq!(habitat.extract(&smallvec![1, 1], 0.0), 0.8);
        assert!(habitat.extract(&smallvec![0, 1], 0.0).is_nan());
        assert_eq!(habitat.name(), "habitat");
    }

    #[test]
    fn feature_set_extracts_in_order() {
        let set = FeatureSet::space_time().with(Constant(1.0));
        assert_eq!(set.len(), 4);
        assert_eq!(set.names(), vec!["grid_x", "grid_y", "time", "constant"]);
        let v = set.extract(&smallvec![4, 1], 12.0);
        assert_eq!(v.as_slice(), &[1.0, 4.0, 12.0, 1.0]);
    }

    #[test]
    fn feature_set_clones_share_extractors() {
        let a = FeatureSet::grid();
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.extractors[0], &b.extractors[0]));
    }
}
