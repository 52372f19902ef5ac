//! k-nearest-neighbor regression over a growing k-d tree.
//!
//! Predictions are the plain mean of the `k` closest stored observations
//! under a [`WeightedMetric`]. The tree keeps raw feature vectors only,
//! so `set_parameters` swaps the metric and the tree is left alone.

use crate::kdtree::KdTree;
use shoal_core::{Coord, Observation, ParameterError, RegressionError};
use shoal_regression::params::{check_length, neighbor_count};
use shoal_regression::{DistanceTransform, FeatureSet, Regression, WeightedMetric};
use std::borrow::Cow;

/// Inductive k-NN regression.
///
/// # Examples
///
/// ```
/// use shoal_core::Observation;
/// use shoal_regression::Regression;
/// use shoal_regressors::NearestNeighborRegression;
///
/// let mut nn = NearestNeighborRegression::space_time(1, 1.0, 24.0).unwrap();
/// assert_eq!(nn.predict(&vec![0, 0].into(), 0.0), 0.0);
///
/// nn.observe(&Observation::at(2, 2, 0.0, 7.5)).unwrap();
/// assert_eq!(nn.predict(&vec![9, 9].into(), 100.0), 7.5);
/// ```
#[derive(Clone, Debug)]
pub struct NearestNeighborRegression {
    features: FeatureSet,
    metric: WeightedMetric,
    neighbors: usize,
    tree: KdTree,
}

impl NearestNeighborRegression {
    /// Build over `features` with one transform and bandwidth per
    /// feature and `neighbors` (at least one) averaged per prediction.
    ///
    /// # Errors
    ///
    /// `ArityMismatch` if `features` and `metric` disagree on length,
    /// `InvalidConfig` if `neighbors` is zero.
    pub fn new(
        features: FeatureSet,
        metric: WeightedMetric,
        neighbors: usize,
    ) -> Result<Self, RegressionError> {
        if features.len() != metric.dim() {
            return Err(RegressionError::ArityMismatch {
                expected: features.len(),
                got: metric.dim(),
            });
        }
        if neighbors == 0 {
            return Err(RegressionError::InvalidConfig {
                reason: "neighbor count must be at least 1".into(),
            });
        }
        tracing::debug!(
            features = ?features,
            bandwidths = ?metric.bandwidths(),
            neighbors,
            "nearest-neighbor regression built"
        );
        Ok(Self {
            tree: KdTree::new(features.len()),
            features,
            metric,
            neighbors,
        })
    }

    /// `[grid_x, grid_y, time]` with absolute-difference distances,
    /// `space_bandwidth` on both grid axes.
    pub fn space_time(
        neighbors: usize,
        space_bandwidth: f64,
        time_bandwidth: f64,
    ) -> Result<Self, RegressionError> {
        let metric = WeightedMetric::uniform(
            DistanceTransform::Absolute,
            vec![space_bandwidth, space_bandwidth, time_bandwidth],
        )?;
        Self::new(FeatureSet::space_time(), metric, neighbors)
    }

    /// Number of neighbors averaged.
    pub fn neighbors(&self) -> usize {
        self.neighbors
    }

    /// The current metric.
    pub fn metric(&self) -> &WeightedMetric {
        &self.metric
    }

    /// Number of stored observations.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Prediction from a raw feature vector.
    ///
    /// `0` when empty, `NaN` on a wrong-length vector.
    pub fn predict_features(&self, features: &[f64]) -> f64 {
        if self.tree.is_empty() {
            return 0.0;
        }
        if features.len() != self.metric.dim() {
            return f64::NAN;
        }
        let found = self.tree.nearest(features, self.neighbors, &self.metric);
        found.iter().map(|n| n.value).sum::<f64>() / found.len() as f64
    }

    /// Store a raw feature vector with its value.
    pub fn observe_features(&mut self, features: &[f64], value: f64) -> Result<(), RegressionError> {
        if features.len() != self.metric.dim() {
            return Err(RegressionError::ArityMismatch {
                expected: self.metric.dim(),
                got: features.len(),
            });
        }
        self.tree.insert(features, value);
        tracing::trace!(stored = self.tree.len(), value, "observation indexed");
        Ok(())
    }
}

impl Regression for NearestNeighborRegression {
    fn name(&self) -> &str {
        "nearest_neighbor"
    }

    fn predict(&self, coord: &Coord, time: f64) -> f64 {
        self.predict_features(&self.features.extract(coord, time))
    }

    fn observe(&mut self, observation: &Observation) -> Result<(), RegressionError> {
        let x = self.features.extract(&observation.coord, observation.time);
        self.observe_features(&x, observation.value)
    }

    /// Bandwidths in feature order, then the neighbor count.
    fn parameters(&self) -> Vec<f64> {
        let mut p = self.metric.bandwidths().to_vec();
        p.push(self.neighbors as f64);
        p
    }

    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        let dim = self.metric.dim();
        check_length(dim + 1, values.len())?;
        let metric = self.metric.with_bandwidths(&values[..dim], 0)?;
        self.metric = metric;
        self.neighbors = neighbor_count(values[dim]);
        tracing::debug!(bandwidths = ?self.metric.bandwidths(), neighbors = self.neighbors, "metric rebuilt");
        Ok(())
    }

    fn parameter_names(&self) -> Vec<Cow<'static, str>> {
        let mut names: Vec<Cow<'static, str>> = self
            .features
            .names()
            .into_iter()
            .map(|n| Cow::Owned(format!("bandwidth[{n}]")))
            .collect();
        names.push(Cow::Borrowed("neighbors"));
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn nn(k: usize) -> NearestNeighborRegression {
        NearestNeighborRegression::space_time(k, 1.0, 1000.0).unwrap()
    }

    #[test]
    fn empty_predicts_zero() {
        assert_eq!(nn(3).predict(&smallvec![1, 1], 0.0), 0.0);
    }

    #[test]
    fn averages_k_nearest() {
        let mut r = nn(2);
        r.observe(&Observation::at(0, 0, 0.0, 1.0)).unwrap();
        r.observe(&Observation::at(0, 1, 0.0, 3.0)).unwrap();
        r.observe(&Observation::at(9, 9, 0.0, 100.0)).unwrap();
        assert_eq!(r.predict(&smallvec![0, 0], 0.0), 2.0);
    }

    #[test]
    fn k_is_truncated_and_floored_at_one() {
        let mut r = nn(1);
        r.set_parameters(&[1.0, 1.0, 1000.0, 2.9]).unwrap();
        assert_eq!(r.neighbors(), 2);
        r.set_parameters(&[1.0, 1.0, 1000.0, 0.3]).unwrap();
        assert_eq!(r.neighbors(), 1);
        assert_eq!(r.parameters(), vec![1.0, 1.0, 1000.0, 1.0]);
    }

    #[test]
    fn astronomical_k_averages_everything_stored() {
        let mut r = nn(1);
        for (col, v) in [(0, 1.0), (1, 2.0), (2, 6.0)] {
            r.observe(&Observation::at(0, col, 0.0, v)).unwrap();
        }
        r.set_parameters(&[1.0, 1.0, 1000.0, 1e30]).unwrap();
        assert_eq!(r.neighbors(), usize::MAX);
        assert_eq!(r.predict(&smallvec![0, 0], 0.0), 3.0);
    }

    #[test]
    fn bad_bandwidth_leaves_state_unchanged() {
        let mut r = nn(1);
        let before = r.parameters();
        let err = r.set_parameters(&[1.0, -2.0, 1.0, 4.0]).unwrap_err();
        assert!(matches!(err, ParameterError::OutOfDomain { index: 1, .. }));
        assert_eq!(r.parameters(), before);
    }

    #[test]
    fn set_parameters_keeps_stored_observations() {
        let mut r = nn(1);
        r.observe(&Observation::at(0, 3, 0.0, 1.0)).unwrap();
        r.observe(&Observation::at(2, 0, 0.0, 2.0)).unwrap();
        // Query (0, 0): x-distance 3 vs y-distance 2.
        assert_eq!(r.predict(&smallvec![0, 0], 0.0), 2.0);
        // Stretch the x bandwidth; the first point becomes closer.
        r.set_parameters(&[10.0, 1.0, 1000.0, 1.0]).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.predict(&smallvec![0, 0], 0.0), 1.0);
    }

    #[test]
    fn raw_feature_entry_points_check_arity() {
        let mut r = nn(1);
        assert!(matches!(
            r.observe_features(&[1.0], 2.0),
            Err(RegressionError::ArityMismatch { expected: 3, got: 1 })
        ));
        r.observe_features(&[1.0, 1.0, 0.0], 2.0).unwrap();
        assert!(r.predict_features(&[1.0]).is_nan());
        assert_eq!(r.predict_features(&[1.0, 1.0, 0.0]), 2.0);
    }

    #[test]
    fn zero_neighbors_rejected() {
        let err = NearestNeighborRegression::new(FeatureSet::grid(), WeightedMetric::unit(2), 0)
            .unwrap_err();
        assert!(matches!(err, RegressionError::InvalidConfig { .. }));
    }

    #[test]
    fn parameter_names_label_each_bandwidth() {
        let names = nn(1).parameter_names();
        assert_eq!(
            names,
            vec!["bandwidth[grid_x]", "bandwidth[grid_y]", "bandwidth[time]", "neighbors"]
        );
    }
}
