//! Per-site particle beliefs with periodic drift and Gaussian evidence.
//!
//! Every site holds a [`ParticleBelief`]: a weighted sample of plausible
//! values in `[min, max]`. Two things change it:
//!
//! - **Drift**, registered with the scheduler in `on_start` and run every
//!   `drift_period` ticks: each particle moves by `temporal_drift · N(0,1)`
//!   and is clamped back into range.
//! - **Evidence**, on every observation: each site's weights are
//!   multiplied by a Gaussian likelihood of the observed value whose
//!   deviation grows with the distance between the observing site and
//!   the target site, `σ = evidence_deviation · (1 + distance_noise · d)`.
//!   Sites where `σ` exceeds `informative_ratio · (max − min)` are left
//!   alone.
//!
//! All randomness comes from one seeded `ChaCha8Rng`, so identical
//! configurations replay identically.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shoal_core::{CancelHandle, Coord, Observation, ParameterError, RegressionError, Scheduler, TickId};
use shoal_regression::params::{check_length, require_non_negative, require_positive};
use shoal_regression::Regression;
use shoal_space::SiteMap;
use std::borrow::Cow;
use std::sync::Arc;

/// Standard normal sample via Box-Muller.
fn standard_normal(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-300); // avoid ln(0)
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn normal_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    let z = (x - mean) / sd;
    (-0.5 * z * z).exp() / (sd * (2.0 * std::f64::consts::PI).sqrt())
}

/// A weighted sample representing a belief over one scalar.
///
/// Weights are non-negative. Summaries of a belief whose total weight
/// is not positive are `NaN`.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleBelief {
    particles: Vec<f64>,
    weights: Vec<f64>,
}

/// Mean and spread of a belief.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeliefSummary {
    /// Weighted mean.
    pub mean: f64,
    /// Weighted standard deviation.
    pub std_dev: f64,
}

impl ParticleBelief {
    /// `n` particles uniform in `[min, max]`, equal weights.
    pub fn uniform(n: usize, min: f64, max: f64, rng: &mut ChaCha8Rng) -> Self {
        let particles = (0..n)
            .map(|_| min + (max - min) * rng.random::<f64>())
            .collect();
        Self {
            particles,
            weights: vec![1.0 / n as f64; n],
        }
    }

    /// Explicit particles and weights.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the lengths differ, the set is empty, or a
    /// weight is negative or not finite.
    pub fn from_weighted(particles: Vec<f64>, weights: Vec<f64>) -> Result<Self, RegressionError> {
        if particles.is_empty() || particles.len() != weights.len() {
            return Err(RegressionError::InvalidConfig {
                reason: format!(
                    "{} particles with {} weights",
                    particles.len(),
                    weights.len()
                ),
            });
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RegressionError::InvalidConfig {
                reason: "particle weights must be finite and >= 0".into(),
            });
        }
        Ok(Self { particles, weights })
    }

    /// Equally weighted particles.
    pub fn from_particles(particles: Vec<f64>) -> Result<Self, RegressionError> {
        let n = particles.len().max(1);
        let weights = vec![1.0 / n as f64; particles.len()];
        Self::from_weighted(particles, weights)
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the belief has no particles.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particle values.
    pub fn particles(&self) -> &[f64] {
        &self.particles
    }

    /// Particle weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Sum of weights.
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Weighted mean, `NaN` if the total weight is not positive.
    pub fn mean(&self) -> f64 {
        let total = self.total_weight();
        if !(total > 0.0) {
            return f64::NAN;
        }
        self.particles
            .iter()
            .zip(&self.weights)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            / total
    }

    /// Weighted mean and standard deviation.
    pub fn summary(&self) -> BeliefSummary {
        let mean = self.mean();
        if mean.is_nan() {
            return BeliefSummary {
                mean,
                std_dev: f64::NAN,
            };
        }
        let total = self.total_weight();
        let variance = self
            .particles
            .iter()
            .zip(&self.weights)
            .map(|(x, w)| w * (x - mean) * (x - mean))
            .sum::<f64>()
            / total;
        BeliefSummary {
            mean,
            std_dev: variance.max(0.0).sqrt(),
        }
    }

    /// Kish effective sample size `(Σw)² / Σw²`.
    pub fn effective_sample_size(&self) -> f64 {
        let total = self.total_weight();
        let squares: f64 = self.weights.iter().map(|w| w * w).sum();
        total * total / squares
    }

    /// Multiply every weight by `N(value; particle, sd)` and renormalise.
    ///
    /// Evidence that no particle can explain (every likelihood underflows
    /// to zero, or the total is not finite) leaves the weights as they
    /// were and returns `false`.
    pub fn observe(&mut self, value: f64, sd: f64) -> bool {
        let posterior: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.particles)
            .map(|(w, &x)| w * normal_pdf(value, x, sd))
            .collect();
        let total: f64 = posterior.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return false;
        }
        for (w, p) in self.weights.iter_mut().zip(posterior) {
            *w = p / total;
        }
        true
    }

    /// Move every particle by `scale · N(0,1)`, clamped to `[min, max]`.
    pub fn drift(&mut self, scale: f64, min: f64, max: f64, rng: &mut ChaCha8Rng) {
        for x in &mut self.particles {
            *x = (*x + scale * standard_normal(rng)).clamp(min, max);
        }
    }

    /// Systematic resampling to equal weights.
    ///
    /// Does nothing when the total weight is not positive.
    pub fn resample(&mut self, rng: &mut ChaCha8Rng) {
        let n = self.particles.len();
        let total = self.total_weight();
        if n == 0 || !(total > 0.0) {
            return;
        }
        let step = total / n as f64;
        let mut target = rng.random::<f64>() * step;
        let mut cumulative = self.weights[0];
        let mut j = 0;
        let mut resampled = Vec::with_capacity(n);
        for _ in 0..n {
            while target > cumulative && j + 1 < n {
                j += 1;
                cumulative += self.weights[j];
            }
            resampled.push(self.particles[j]);
            target += step;
        }
        self.particles = resampled;
        self.weights.fill(1.0 / n as f64);
    }
}

/// Particle-filter regression over a fixed [`SiteMap`].
#[derive(Clone, Debug)]
pub struct ParticleFilterRegression {
    sites: Arc<SiteMap>,
    beliefs: Vec<ParticleBelief>,
    min: f64,
    max: f64,
    temporal_drift: f64,
    evidence_deviation: f64,
    distance_noise: f64,
    informative_ratio: f64,
    resample_threshold: f64,
    drift_period: u64,
    rng: ChaCha8Rng,
    drift_handle: Option<CancelHandle>,
}

/// Builder for [`ParticleFilterRegression`].
///
/// Required: `sites` and `range`.
pub struct ParticleFilterRegressionBuilder {
    sites: Option<Arc<SiteMap>>,
    range: Option<(f64, f64)>,
    particles: usize,
    temporal_drift: f64,
    evidence_deviation: f64,
    distance_noise: f64,
    informative_ratio: f64,
    resample_threshold: f64,
    drift_period: u64,
    seed: u64,
}

impl ParticleFilterRegression {
    /// Start building.
    pub fn builder() -> ParticleFilterRegressionBuilder {
        ParticleFilterRegressionBuilder {
            sites: None,
            range: None,
            particles: 100,
            temporal_drift: 0.0,
            evidence_deviation: 1.0,
            distance_noise: 0.0,
            informative_ratio: 1.0,
            resample_threshold: 0.5,
            drift_period: 1,
            seed: 0,
        }
    }

    /// The belief at `coord`, if it is a site.
    pub fn belief(&self, coord: &Coord) -> Option<&ParticleBelief> {
        self.sites.site(coord).map(|id| &self.beliefs[id.index()])
    }

    /// Mean and standard deviation at `coord`, if it is a site.
    pub fn belief_summary(&self, coord: &Coord) -> Option<BeliefSummary> {
        self.belief(coord).map(ParticleBelief::summary)
    }

    /// Handle of the registered drift callback, while started.
    pub fn drift_handle(&self) -> Option<CancelHandle> {
        self.drift_handle
    }

    /// Apply one drift step to every site now.
    pub fn drift(&mut self) {
        if self.temporal_drift == 0.0 {
            return;
        }
        for belief in &mut self.beliefs {
            belief.drift(self.temporal_drift, self.min, self.max, &mut self.rng);
        }
        tracing::trace!(sites = self.beliefs.len(), "particle drift");
    }
}

impl ParticleFilterRegressionBuilder {
    /// Sites to track.
    pub fn sites(mut self, sites: Arc<SiteMap>) -> Self {
        self.sites = Some(sites);
        self
    }

    /// Value range `[min, max]` with `min < max`.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Particles per site (default 100).
    pub fn particles(mut self, n: usize) -> Self {
        self.particles = n;
        self
    }

    /// Drift scale per drift step (default 0).
    pub fn temporal_drift(mut self, scale: f64) -> Self {
        self.temporal_drift = scale;
        self
    }

    /// Evidence deviation at distance zero (default 1).
    pub fn evidence_deviation(mut self, sd: f64) -> Self {
        self.evidence_deviation = sd;
        self
    }

    /// Relative growth of the evidence deviation per unit distance
    /// (default 0).
    pub fn distance_noise(mut self, noise: f64) -> Self {
        self.distance_noise = noise;
        self
    }

    /// Evidence with deviation above `ratio · (max − min)` is ignored
    /// (default 1).
    pub fn informative_ratio(mut self, ratio: f64) -> Self {
        self.informative_ratio = ratio;
        self
    }

    /// Resample when the effective sample size drops below
    /// `threshold · particles` (default 0.5; 0 disables).
    pub fn resample_threshold(mut self, threshold: f64) -> Self {
        self.resample_threshold = threshold;
        self
    }

    /// Ticks between drift steps (default 1).
    pub fn drift_period(mut self, ticks: u64) -> Self {
        self.drift_period = ticks;
        self
    }

    /// RNG seed (default 0).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate, draw the initial particles and build.
    pub fn build(self) -> Result<ParticleFilterRegression, RegressionError> {
        let sites = self.sites.ok_or_else(|| RegressionError::InvalidConfig {
            reason: "sites are required".into(),
        })?;
        let (min, max) = self.range.ok_or_else(|| RegressionError::InvalidConfig {
            reason: "range is required".into(),
        })?;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(RegressionError::InvalidConfig {
                reason: format!("range must be finite with min < max, got [{min}, {max}]"),
            });
        }
        if self.particles == 0 {
            return Err(RegressionError::InvalidConfig {
                reason: "at least one particle per site is required".into(),
            });
        }
        if self.drift_period == 0 {
            return Err(RegressionError::InvalidConfig {
                reason: "drift period must be at least one tick".into(),
            });
        }
        if !(self.resample_threshold.is_finite() && (0.0..=1.0).contains(&self.resample_threshold)) {
            return Err(RegressionError::InvalidConfig {
                reason: format!(
                    "resample threshold must lie in [0, 1], got {}",
                    self.resample_threshold
                ),
            });
        }
        require_positive(0, self.informative_ratio).map_err(|_| RegressionError::InvalidConfig {
            reason: format!(
                "informative ratio must be finite and > 0, got {}",
                self.informative_ratio
            ),
        })?;
        require_non_negative(0, self.temporal_drift)?;
        require_positive(1, self.evidence_deviation)?;
        require_non_negative(2, self.distance_noise)?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let beliefs = (0..sites.len())
            .map(|_| ParticleBelief::uniform(self.particles, min, max, &mut rng))
            .collect();
        tracing::debug!(
            sites = sites.len(),
            particles = self.particles,
            min,
            max,
            seed = self.seed,
            "particle filter built"
        );
        Ok(ParticleFilterRegression {
            sites,
            beliefs,
            min,
            max,
            temporal_drift: self.temporal_drift,
            evidence_deviation: self.evidence_deviation,
            distance_noise: self.distance_noise,
            informative_ratio: self.informative_ratio,
            resample_threshold: self.resample_threshold,
            drift_period: self.drift_period,
            rng,
            drift_handle: None,
        })
    }
}

impl Regression for ParticleFilterRegression {
    fn name(&self) -> &str {
        "particle_filter"
    }

    fn predict(&self, coord: &Coord, _time: f64) -> f64 {
        self.belief(coord).map_or(f64::NAN, ParticleBelief::mean)
    }

    fn observe(&mut self, observation: &Observation) -> Result<(), RegressionError> {
        let Some(origin) = self.sites.site(&observation.coord) else {
            tracing::trace!(coord = ?observation.coord, "observation outside site map ignored");
            return Ok(());
        };
        let limit = self.informative_ratio * (self.max - self.min);
        let mut updated = 0usize;
        let mut unexplained = 0usize;
        for (id, _) in self.sites.iter() {
            let distance = self.sites.distance(origin, id);
            let sd = self.evidence_deviation * (1.0 + self.distance_noise * distance);
            if !(sd <= limit) {
                continue;
            }
            let belief = &mut self.beliefs[id.index()];
            if !belief.observe(observation.value, sd) {
                unexplained += 1;
                continue;
            }
            if self.resample_threshold > 0.0
                && belief.effective_sample_size() < self.resample_threshold * belief.len() as f64
            {
                belief.resample(&mut self.rng);
            }
            updated += 1;
        }
        if unexplained > 0 {
            tracing::warn!(
                unexplained,
                value = observation.value,
                min = self.min,
                max = self.max,
                "evidence outside every particle's support ignored"
            );
        }
        tracing::trace!(updated, value = observation.value, "particle evidence");
        Ok(())
    }

    /// `[temporal_drift, evidence_deviation, distance_noise]`.
    fn parameters(&self) -> Vec<f64> {
        vec![self.temporal_drift, self.evidence_deviation, self.distance_noise]
    }

    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        check_length(3, values.len())?;
        let temporal_drift = require_non_negative(0, values[0])?;
        let evidence_deviation = require_positive(1, values[1])?;
        let distance_noise = require_non_negative(2, values[2])?;
        self.temporal_drift = temporal_drift;
        self.evidence_deviation = evidence_deviation;
        self.distance_noise = distance_noise;
        tracing::debug!(temporal_drift, evidence_deviation, distance_noise, "particle filter parameters updated");
        Ok(())
    }

    fn parameter_names(&self) -> Vec<Cow<'static, str>> {
        vec![
            Cow::Borrowed("temporal_drift"),
            Cow::Borrowed("evidence_deviation"),
            Cow::Borrowed("distance_noise"),
        ]
    }

    fn on_start(&mut self, scheduler: &mut dyn Scheduler) -> Option<CancelHandle> {
        if self.drift_handle.is_none() {
            let handle = scheduler.schedule_every(self.drift_period);
            tracing::debug!(%handle, period = self.drift_period, "particle drift scheduled");
            self.drift_handle = Some(handle);
        }
        self.drift_handle
    }

    fn on_scheduled(&mut self, handle: CancelHandle, now: TickId) {
        if self.drift_handle == Some(handle) {
            tracing::trace!(%now, "drift callback");
            self.drift();
        }
    }

    fn on_stop(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(handle) = self.drift_handle.take() {
            scheduler.cancel(handle);
            tracing::debug!(%handle, "particle drift cancelled");
        }
    }
}
