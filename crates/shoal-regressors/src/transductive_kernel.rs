//! Per-site recursive kernel estimate with exponential forgetting.
//!
//! Each site keeps a running `(prediction, denominator)` pair. An
//! observation updates every site in O(1) with weight
//! `w = Π_i k(|f_i(site) - f_i(obs)| / h_i)`:
//!
//! ```text
//! den  <- den * λ + w
//! pred <- pred + (v - pred) * w / den      (when den > 0)
//! ```
//!
//! No observation is stored, so memory is fixed at one pair per site.

use shoal_core::{Coord, Observation, ParameterError, RegressionError};
use shoal_regression::params::{check_length, require_forgetting, require_positive};
use shoal_regression::{CompositeKernel, FeatureSet, KernelFunction, Regression};
use shoal_space::SiteMap;
use std::borrow::Cow;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct SiteEstimate {
    /// `None` until the first update with positive weight.
    prediction: Option<f64>,
    denominator: f64,
}

/// Transductive kernel regression over a fixed [`SiteMap`].
#[derive(Clone, Debug)]
pub struct TransductiveKernelRegression {
    sites: Arc<SiteMap>,
    features: FeatureSet,
    kernel: CompositeKernel,
    forgetting: f64,
    estimates: Vec<SiteEstimate>,
}

impl TransductiveKernelRegression {
    /// One bandwidth per feature; `forgetting` in `(0, 1]`.
    ///
    /// # Errors
    ///
    /// `ArityMismatch` if bandwidths and features differ in length,
    /// `Parameter` if a bandwidth or the forgetting factor is out of
    /// domain.
    pub fn new(
        sites: Arc<SiteMap>,
        features: FeatureSet,
        kernel: KernelFunction,
        bandwidths: Vec<f64>,
        forgetting: f64,
    ) -> Result<Self, RegressionError> {
        if bandwidths.len() != features.len() {
            return Err(RegressionError::ArityMismatch {
                expected: features.len(),
                got: bandwidths.len(),
            });
        }
        for (i, &h) in bandwidths.iter().enumerate() {
            require_positive(i, h)?;
        }
        require_forgetting(bandwidths.len(), forgetting)?;
        tracing::debug!(
            sites = sites.len(),
            bandwidths = ?bandwidths,
            forgetting,
            "transductive kernel regression built"
        );
        Ok(Self {
            estimates: vec![SiteEstimate::default(); sites.len()],
            sites,
            features,
            kernel: CompositeKernel::new(kernel, bandwidths),
            forgetting,
        })
    }

    /// Accumulated kernel weight at `coord`, or `NaN` off the site map.
    pub fn denominator(&self, coord: &Coord) -> f64 {
        self.sites
            .site(coord)
            .map_or(f64::NAN, |id| self.estimates[id.index()].denominator)
    }

    /// The forgetting factor.
    pub fn forgetting(&self) -> f64 {
        self.forgetting
    }
}

impl Regression for TransductiveKernelRegression {
    fn name(&self) -> &str {
        "transductive_kernel"
    }

    /// The stored estimate; `time` is ignored.
    fn predict(&self, coord: &Coord, _time: f64) -> f64 {
        self.sites
            .site(coord)
            .and_then(|id| self.estimates[id.index()].prediction)
            .unwrap_or(f64::NAN)
    }

    fn observe(&mut self, observation: &Observation) -> Result<(), RegressionError> {
        let observed = self.features.extract(&observation.coord, observation.time);
        let value = observation.value;
        let mut touched = 0usize;
        for (id, coord) in self.sites.iter() {
            let here = self.features.extract(coord, observation.time);
            let w = self.kernel.weight(&here, &observed);
            let est = &mut self.estimates[id.index()];
            est.denominator = est.denominator * self.forgetting + w;
            if est.denominator > 0.0 && w > 0.0 {
                // A fresh site has prior 0 and den == w, so the update is exactly `value`.
                est.prediction = Some(match est.prediction {
                    None => value,
                    Some(prior) => prior + (value - prior) * w / est.denominator,
                });
                touched += 1;
            }
        }
        tracing::trace!(touched, value, "transductive kernel update");
        Ok(())
    }

    /// Bandwidths in feature order, then the forgetting factor.
    fn parameters(&self) -> Vec<f64> {
        let mut p = self.kernel.bandwidths().to_vec();
        p.push(self.forgetting);
        p
    }

    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        let dim = self.kernel.bandwidths().len();
        check_length(dim + 1, values.len())?;
        for (i, &h) in values[..dim].iter().enumerate() {
            require_positive(i, h)?;
        }
        let forgetting = require_forgetting(dim, values[dim])?;
        self.kernel.set_bandwidths(&values[..dim]);
        self.forgetting = forgetting;
        tracing::debug!(values = ?values, "transductive kernel parameters updated");
        Ok(())
    }

    fn parameter_names(&self) -> Vec<Cow<'static, str>> {
        let mut names: Vec<Cow<'static, str>> = self
            .features
            .names()
            .into_iter()
            .map(|n| Cow::Owned(format!("bandwidth[{n}]")))
            .collect();
        names.push(Cow::Borrowed("forgetting"));
        names
    }
}
