//! Kernel-weighted average over a bounded set of recent observations.
//!
//! The retained set is a binary heap whose top is the next observation
//! to evict. Which observation that is depends on the configured
//! [`EvictionPolicy`]; ties always go to the earlier insertion.

use serde::{Deserialize, Serialize};
use shoal_core::{Coord, FeatureVector, Observation, ParameterError, RegressionError};
use shoal_regression::params::{check_length, require_positive};
use shoal_regression::{
    FeatureSet, KernelFunction, Regression, WeightedMetric, NEGLIGIBLE_WEIGHT,
};
use shoal_space::SiteMap;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;

/// Which observation leaves the set when it overflows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionPolicy {
    /// Evict the earliest-inserted observation.
    #[default]
    OldestFirst,
    /// Evict the observation with the smallest value; among equal
    /// values, the earliest-inserted.
    LowestValueFirst,
}

#[derive(Clone, Debug)]
struct Retained {
    features: FeatureVector,
    value: f64,
    /// Primary eviction key: lower is evicted first.
    rank: f64,
    /// Insertion sequence number.
    seq: u64,
}

impl PartialEq for Retained {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Retained {}

impl PartialOrd for Retained {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Retained {
    /// Greater means "evict sooner", so the max-heap top is the victim.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .rank
            .total_cmp(&self.rank)
            .then(other.seq.cmp(&self.seq))
    }
}

/// Fixed-capacity kernel regression.
///
/// Predictions are `Σ k(d/h)·v / Σ k(d/h)` over the retained
/// observations, where `d` is the L1 distance between feature vectors
/// and `h` the single bandwidth.
pub struct BoundedKernelRegression {
    features: FeatureSet,
    metric: WeightedMetric,
    kernel: KernelFunction,
    bandwidth: f64,
    capacity: usize,
    policy: EvictionPolicy,
    domain: Option<Arc<SiteMap>>,
    retained: BinaryHeap<Retained>,
    next_seq: u64,
}

/// Builder for [`BoundedKernelRegression`].
///
/// Required: `capacity` and `bandwidth`.
pub struct BoundedKernelRegressionBuilder {
    features: FeatureSet,
    kernel: KernelFunction,
    bandwidth: Option<f64>,
    capacity: Option<usize>,
    policy: EvictionPolicy,
    domain: Option<Arc<SiteMap>>,
}

impl BoundedKernelRegression {
    /// Start building. Features default to `[grid_x, grid_y, time]`.
    pub fn builder() -> BoundedKernelRegressionBuilder {
        BoundedKernelRegressionBuilder {
            features: FeatureSet::space_time(),
            kernel: KernelFunction::default(),
            bandwidth: None,
            capacity: None,
            policy: EvictionPolicy::default(),
            domain: None,
        }
    }

    /// Number of retained observations.
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    /// Whether nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Maximum number of retained observations.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The eviction policy.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Values of the retained observations, in no particular order.
    pub fn retained_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.retained.iter().map(|r| r.value)
    }
}

impl BoundedKernelRegressionBuilder {
    /// Feature extractors (default `[grid_x, grid_y, time]`).
    pub fn features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Kernel shape (default logistic).
    pub fn kernel(mut self, kernel: KernelFunction) -> Self {
        self.kernel = kernel;
        self
    }

    /// Bandwidth `h > 0`.
    pub fn bandwidth(mut self, bandwidth: f64) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    /// Capacity `K >= 1`.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Eviction policy (default oldest-first).
    pub fn eviction(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Restrict predictions to the sites of `domain`; other coordinates
    /// predict `NaN`.
    pub fn domain(mut self, domain: Arc<SiteMap>) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if a required field is missing, the capacity is
    /// zero or there are no features; `Parameter` if the bandwidth is
    /// not finite and positive.
    pub fn build(self) -> Result<BoundedKernelRegression, RegressionError> {
        let capacity = self.capacity.ok_or_else(|| RegressionError::InvalidConfig {
            reason: "capacity is required".into(),
        })?;
        if capacity == 0 {
            return Err(RegressionError::InvalidConfig {
                reason: "capacity must be at least 1".into(),
            });
        }
        let bandwidth = self.bandwidth.ok_or_else(|| RegressionError::InvalidConfig {
            reason: "bandwidth is required".into(),
        })?;
        require_positive(0, bandwidth)?;
        if self.features.is_empty() {
            return Err(RegressionError::InvalidConfig {
                reason: "at least one feature is required".into(),
            });
        }
        tracing::debug!(
            capacity,
            bandwidth,
            kernel = ?self.kernel,
            policy = ?self.policy,
            "bounded kernel regression built"
        );
        Ok(BoundedKernelRegression {
            metric: WeightedMetric::unit(self.features.len()),
            features: self.features,
            kernel: self.kernel,
            bandwidth,
            capacity,
            policy: self.policy,
            domain: self.domain,
            retained: BinaryHeap::new(),
            next_seq: 0,
        })
    }
}

impl Regression for BoundedKernelRegression {
    fn name(&self) -> &str {
        "bounded_kernel"
    }

    fn predict(&self, coord: &Coord, time: f64) -> f64 {
        if let Some(domain) = &self.domain {
            if !domain.contains(coord) {
                return f64::NAN;
            }
        }
        match self.retained.len() {
            0 => return 0.0,
            1 => return self.retained.peek().map_or(f64::NAN, |r| r.value),
            _ => {}
        }
        let query = self.features.extract(coord, time);
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for r in &self.retained {
            let w = self
                .kernel
                .weight(self.metric.distance(&r.features, &query) / self.bandwidth);
            numerator += w * r.value;
            denominator += w;
        }
        if denominator < NEGLIGIBLE_WEIGHT {
            return f64::NAN;
        }
        numerator / denominator
    }

    fn observe(&mut self, observation: &Observation) -> Result<(), RegressionError> {
        let rank = match self.policy {
            EvictionPolicy::OldestFirst => 0.0,
            EvictionPolicy::LowestValueFirst => observation.value,
        };
        self.retained.push(Retained {
            features: self.features.extract(&observation.coord, observation.time),
            value: observation.value,
            rank,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        if self.retained.len() > self.capacity {
            if let Some(evicted) = self.retained.pop() {
                tracing::trace!(seq = evicted.seq, value = evicted.value, "evicted");
            }
        }
        Ok(())
    }

    fn parameters(&self) -> Vec<f64> {
        vec![self.bandwidth]
    }

    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        check_length(1, values.len())?;
        self.bandwidth = require_positive(0, values[0])?;
        tracing::debug!(bandwidth = self.bandwidth, "bandwidth updated");
        Ok(())
    }

    fn parameter_names(&self) -> Vec<Cow<'static, str>> {
        vec![Cow::Borrowed("bandwidth")]
    }
}

impl fmt::Debug for BoundedKernelRegression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedKernelRegression")
            .field("features", &self.features)
            .field("kernel", &self.kernel)
            .field("bandwidth", &self.bandwidth)
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("retained", &self.retained.len())
            .finish()
    }
}
