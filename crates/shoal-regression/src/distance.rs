//! Per-dimension distance transforms and the weighted metric built
//! from them.
//!
//! The metric is kept separate from any index structure. Changing a
//! bandwidth replaces the metric; the points stored in a k-d tree stay
//! where they are.

use crate::params::require_positive;
use serde::{Deserialize, Serialize};
use shoal_core::{ParameterError, RegressionError};

/// How one dimension's raw difference becomes a distance contribution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceTransform {
    /// `|Δ| / h`.
    #[default]
    Absolute,
    /// `Δ² / h`.
    Squared,
}

impl DistanceTransform {
    /// Contribution of a difference `delta` under bandwidth `h`.
    #[inline]
    pub fn apply(self, delta: f64, bandwidth: f64) -> f64 {
        match self {
            Self::Absolute => delta.abs() / bandwidth,
            Self::Squared => delta * delta / bandwidth,
        }
    }
}

/// `d(a, b) = Σ_i T_i(a_i - b_i, h_i)`.
///
/// # Examples
///
/// ```
/// use shoal_regression::{DistanceTransform, WeightedMetric};
///
/// let m = WeightedMetric::uniform(DistanceTransform::Absolute, vec![1.0, 2.0]).unwrap();
/// assert_eq!(m.distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
///
/// // Inside the box on x, 2 units outside on y.
/// assert_eq!(m.distance_to_rect(&[1.0, 8.0], &[0.0, 0.0], &[2.0, 4.0]), 2.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedMetric {
    transforms: Vec<DistanceTransform>,
    bandwidths: Vec<f64>,
}

impl WeightedMetric {
    /// One transform and one bandwidth per dimension.
    ///
    /// # Errors
    ///
    /// `ArityMismatch` if the lengths differ, `Parameter(OutOfDomain)`
    /// if a bandwidth is not finite and positive.
    pub fn new(
        transforms: Vec<DistanceTransform>,
        bandwidths: Vec<f64>,
    ) -> Result<Self, RegressionError> {
        if transforms.len() != bandwidths.len() {
            return Err(RegressionError::ArityMismatch {
                expected: transforms.len(),
                got: bandwidths.len(),
            });
        }
        for (i, &h) in bandwidths.iter().enumerate() {
            require_positive(i, h)?;
        }
        Ok(Self {
            transforms,
            bandwidths,
        })
    }

    /// The same transform on every dimension.
    pub fn uniform(
        transform: DistanceTransform,
        bandwidths: Vec<f64>,
    ) -> Result<Self, RegressionError> {
        Self::new(vec![transform; bandwidths.len()], bandwidths)
    }

    /// Plain L1 distance over `dim` dimensions.
    pub fn unit(dim: usize) -> Self {
        Self {
            transforms: vec![DistanceTransform::Absolute; dim],
            bandwidths: vec![1.0; dim],
        }
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.bandwidths.len()
    }

    /// Per-dimension bandwidths.
    pub fn bandwidths(&self) -> &[f64] {
        &self.bandwidths
    }

    /// Per-dimension transforms.
    pub fn transforms(&self) -> &[DistanceTransform] {
        &self.transforms
    }

    /// A metric with the same transforms and new bandwidths.
    ///
    /// Validates every bandwidth; `offset` is added to the index reported
    /// in errors so callers can point into their full parameter vector.
    pub fn with_bandwidths(
        &self,
        bandwidths: &[f64],
        offset: usize,
    ) -> Result<Self, ParameterError> {
        if bandwidths.len() != self.bandwidths.len() {
            return Err(ParameterError::LengthMismatch {
                expected: self.bandwidths.len(),
                got: bandwidths.len(),
            });
        }
        for (i, &h) in bandwidths.iter().enumerate() {
            require_positive(offset + i, h)?;
        }
        Ok(Self {
            transforms: self.transforms.clone(),
            bandwidths: bandwidths.to_vec(),
        })
    }

    /// Distance between two feature vectors of length `dim()`.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), self.dim());
        debug_assert_eq!(b.len(), self.dim());
        a.iter()
            .zip(b)
            .zip(self.transforms.iter().zip(&self.bandwidths))
            .map(|((x, y), (t, &h))| t.apply(x - y, h))
            .sum()
    }

    /// Lower bound on the distance from `query` to any point inside the
    /// axis-aligned box `[min, max]`.
    ///
    /// A dimension contributes nothing while the query lies within the
    /// box on that axis, and otherwise the transformed gap to the nearer
    /// edge.
    pub fn distance_to_rect(&self, query: &[f64], min: &[f64], max: &[f64]) -> f64 {
        let mut total = 0.0;
        for i in 0..self.dim() {
            let q = query[i];
            let gap = if q < min[i] {
                min[i] - q
            } else if q > max[i] {
                q - max[i]
            } else {
                continue;
            };
            total += self.transforms[i].apply(gap, self.bandwidths[i]);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn squared_transform_divides_by_bandwidth() {
        assert_eq!(DistanceTransform::Squared.apply(-3.0, 2.0), 4.5);
        assert_eq!(DistanceTransform::Absolute.apply(-3.0, 2.0), 1.5);
    }

    #[test]
    fn mixed_transforms() {
        let m = WeightedMetric::new(
            vec![DistanceTransform::Absolute, DistanceTransform::Squared],
            vec![2.0, 4.0],
        )
        .unwrap();
        assert_eq!(m.distance(&[0.0, 0.0], &[4.0, 4.0]), 2.0 + 4.0);
    }

    #[test]
    fn non_positive_bandwidth_rejected() {
        let err = WeightedMetric::uniform(DistanceTransform::Absolute, vec![1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            RegressionError::Parameter(ParameterError::OutOfDomain { index: 1, .. })
        ));
        assert!(WeightedMetric::uniform(DistanceTransform::Absolute, vec![f64::NAN]).is_err());
    }

    #[test]
    fn arity_mismatch_rejected() {
        let err = WeightedMetric::new(vec![DistanceTransform::Absolute], vec![1.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            RegressionError::ArityMismatch {
                expected: 1,
                got: 2
            }
        );
    }

    #[test]
    fn with_bandwidths_reports_offset_index() {
        let m = WeightedMetric::unit(2);
        let err = m.with_bandwidths(&[1.0, -1.0], 3).unwrap_err();
        assert!(matches!(err, ParameterError::OutOfDomain { index: 4, .. }));
        let m2 = m.with_bandwidths(&[2.0, 2.0], 0).unwrap();
        assert_eq!(m2.distance(&[0.0, 0.0], &[2.0, 2.0]), 2.0);
    }

    #[test]
    fn rect_distance_is_zero_inside() {
        let m = WeightedMetric::unit(2);
        assert_eq!(m.distance_to_rect(&[1.0, 1.0], &[0.0, 0.0], &[2.0, 2.0]), 0.0);
    }

    proptest! {
        #[test]
        fn rect_bound_never_exceeds_distance_to_points_inside(
            q in prop::array::uniform2(-20.0f64..20.0),
            lo in prop::array::uniform2(-10.0f64..0.0),
            span in prop::array::uniform2(0.0f64..10.0),
            t in prop::array::uniform2(0.0f64..1.0),
            squared in any::<bool>(),
        ) {
            let transform = if squared { DistanceTransform::Squared } else { DistanceTransform::Absolute };
            let m = WeightedMetric::uniform(transform, vec![1.5, 0.5]).unwrap();
            let hi = [lo[0] + span[0], lo[1] + span[1]];
            let inside = [lo[0] + t[0] * span[0], lo[1] + t[1] * span[1]];
            let bound = m.distance_to_rect(&q, &lo, &hi);
            let actual = m.distance(&q, &inside);
            prop_assert!(bound <= actual + 1e-9, "bound {bound} > actual {actual}");
        }
    }
}
