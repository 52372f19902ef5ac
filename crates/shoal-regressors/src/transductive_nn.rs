//! Per-site cache of the closest observation seen so far.

use shoal_core::{Coord, FeatureVector, Observation, ParameterError, RegressionError};
use shoal_regression::params::check_length;
use shoal_regression::{FeatureSet, Regression, WeightedMetric};
use shoal_space::SiteMap;
use std::borrow::Cow;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
struct Closest {
    /// Site features at the observation's time.
    site: FeatureVector,
    /// Observation features.
    observed: FeatureVector,
    value: f64,
    distance: f64,
}

/// Transductive 1-NN: every site remembers the single closest
/// observation under the metric and predicts its value.
///
/// A new observation replaces a site's cache only when it is strictly
/// closer, and never when it is not closer than the placeholder
/// distance given at construction.
#[derive(Clone, Debug)]
pub struct TransductiveNearestNeighbor {
    sites: Arc<SiteMap>,
    features: FeatureSet,
    metric: WeightedMetric,
    placeholder: f64,
    cache: Vec<Option<Closest>>,
}

impl TransductiveNearestNeighbor {
    /// Build with an infinite placeholder distance.
    pub fn new(
        sites: Arc<SiteMap>,
        features: FeatureSet,
        metric: WeightedMetric,
    ) -> Result<Self, RegressionError> {
        Self::with_placeholder(sites, features, metric, f64::INFINITY)
    }

    /// Build with an explicit placeholder: observations at or beyond
    /// this distance never reach a site's cache.
    pub fn with_placeholder(
        sites: Arc<SiteMap>,
        features: FeatureSet,
        metric: WeightedMetric,
        placeholder: f64,
    ) -> Result<Self, RegressionError> {
        if features.len() != metric.dim() {
            return Err(RegressionError::ArityMismatch {
                expected: features.len(),
                got: metric.dim(),
            });
        }
        if placeholder.is_nan() || placeholder <= 0.0 {
            return Err(RegressionError::InvalidConfig {
                reason: format!("placeholder distance must be > 0, got {placeholder}"),
            });
        }
        tracing::debug!(sites = sites.len(), placeholder, "transductive nearest neighbor built");
        Ok(Self {
            cache: vec![None; sites.len()],
            sites,
            features,
            metric,
            placeholder,
        })
    }

    /// Distance to the cached observation at `coord`, `NaN` if there is
    /// none or `coord` is not a site.
    pub fn cached_distance(&self, coord: &Coord) -> f64 {
        self.sites
            .site(coord)
            .and_then(|id| self.cache[id.index()].as_ref())
            .map_or(f64::NAN, |c| c.distance)
    }
}

impl Regression for TransductiveNearestNeighbor {
    fn name(&self) -> &str {
        "transductive_nearest_neighbor"
    }

    fn predict(&self, coord: &Coord, _time: f64) -> f64 {
        self.sites
            .site(coord)
            .and_then(|id| self.cache[id.index()].as_ref())
            .map_or(f64::NAN, |c| c.value)
    }

    fn observe(&mut self, observation: &Observation) -> Result<(), RegressionError> {
        let observed = self.features.extract(&observation.coord, observation.time);
        let mut replaced = 0usize;
        for (id, coord) in self.sites.iter() {
            let site = self.features.extract(coord, observation.time);
            let distance = self.metric.distance(&site, &observed);
            let slot = &mut self.cache[id.index()];
            let best = slot.as_ref().map_or(self.placeholder, |c| c.distance);
            if distance < best {
                *slot = Some(Closest {
                    site,
                    observed: observed.clone(),
                    value: observation.value,
                    distance,
                });
                replaced += 1;
            }
        }
        tracing::trace!(replaced, value = observation.value, "nearest cache update");
        Ok(())
    }

    /// Bandwidths in feature order.
    fn parameters(&self) -> Vec<f64> {
        self.metric.bandwidths().to_vec()
    }

    /// Swaps the metric and recomputes every cached distance under it.
    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        check_length(self.metric.dim(), values.len())?;
        self.metric = self.metric.with_bandwidths(values, 0)?;
        for closest in self.cache.iter_mut().flatten() {
            closest.distance = self.metric.distance(&closest.site, &closest.observed);
        }
        tracing::debug!(bandwidths = ?values, "cached distances recomputed");
        Ok(())
    }

    fn parameter_names(&self) -> Vec<Cow<'static, str>> {
        self.features
            .names()
            .into_iter()
            .map(|n| Cow::Owned(format!("bandwidth[{n}]")))
            .collect()
    }
}
