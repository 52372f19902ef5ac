//! Two-hypothesis classifier: every site is either "good" or "bad".
//!
//! A site's belief is a single probability `p` that it is good. Its
//! prediction is the mixture `p · good_avg + (1 − p) · bad_avg`.
//! Evidence updates `p` by Bayes' rule against two normal likelihoods
//! whose deviation widens with distance, through the Gaussian radial
//! basis `rbf = exp(−(d/h)²/2)`:
//!
//! ```text
//! good ∝ p       · N(v; good_avg, σ / rbf)
//! bad  ∝ (1 − p) · N(v; bad_avg,  σ / rbf)
//! ```
//!
//! Sites with `rbf < 1e-5` are skipped, and so are observations made off
//! the site map. A scheduled drift step pulls every `p` towards one half:
//! `p ← (p + δ) / (1 + 2δ)`.
//!
//! `bad_avg < good_avg` always holds: both the constructor and
//! `set_parameters` reject an ordering that would swap the hypotheses.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shoal_core::{CancelHandle, Coord, Observation, ParameterError, RegressionError, Scheduler, TickId};
use shoal_regression::params::{check_length, require_finite, require_non_negative, require_positive};
use shoal_regression::{KernelFunction, Regression, NEGLIGIBLE_WEIGHT};
use shoal_space::SiteMap;
use std::borrow::Cow;
use std::sync::Arc;

fn require_ordered(bad_avg: f64, good_avg: f64) -> Result<(), ParameterError> {
    if bad_avg < good_avg {
        Ok(())
    } else {
        Err(ParameterError::OutOfDomain {
            index: 2,
            value: good_avg,
            reason: "good_avg must exceed bad_avg",
        })
    }
}

fn normal_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    let z = (x - mean) / sd;
    (-0.5 * z * z).exp() / (sd * (2.0 * std::f64::consts::PI).sqrt())
}

/// Good/bad spot classifier over a fixed [`SiteMap`].
#[derive(Clone, Debug)]
pub struct GoodBadRegression {
    sites: Arc<SiteMap>,
    probabilities: Vec<f64>,
    bandwidth: f64,
    bad_avg: f64,
    good_avg: f64,
    deviation: f64,
    drift: f64,
    drift_handle: Option<CancelHandle>,
}

impl GoodBadRegression {
    /// Draw every site's initial `p` uniformly from `seed`.
    ///
    /// `drift` is the per-day pull towards one half and is fixed for
    /// the lifetime of the regression.
    ///
    /// # Errors
    ///
    /// `Parameter` if `bandwidth` or `deviation` is not positive, an
    /// average is not finite, `good_avg <= bad_avg`, or `drift` is
    /// negative.
    pub fn new(
        sites: Arc<SiteMap>,
        bandwidth: f64,
        bad_avg: f64,
        good_avg: f64,
        deviation: f64,
        drift: f64,
        seed: u64,
    ) -> Result<Self, RegressionError> {
        require_positive(0, bandwidth)?;
        require_finite(1, bad_avg)?;
        require_finite(2, good_avg)?;
        require_ordered(bad_avg, good_avg)?;
        require_positive(3, deviation)?;
        let drift = require_non_negative(4, drift)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let probabilities = (0..sites.len()).map(|_| rng.random::<f64>()).collect();
        tracing::debug!(sites = sites.len(), bad_avg, good_avg, drift, seed, "good/bad regression built");
        Ok(Self {
            sites,
            probabilities,
            bandwidth,
            bad_avg,
            good_avg,
            deviation,
            drift,
            drift_handle: None,
        })
    }

    /// Probability that `coord` is a good site, `None` off the site map.
    pub fn probability_good(&self, coord: &Coord) -> Option<f64> {
        self.sites.site(coord).map(|id| self.probabilities[id.index()])
    }

    /// Pull every probability towards one half.
    pub fn drift(&mut self) {
        let d = self.drift;
        for p in &mut self.probabilities {
            *p = (*p + d) / (1.0 + 2.0 * d);
        }
    }

    fn update(&mut self, index: usize, value: f64, sd: f64) {
        let prior = self.probabilities[index];
        let good = prior * normal_pdf(value, self.good_avg, sd);
        let bad = (1.0 - prior) * normal_pdf(value, self.bad_avg, sd);
        self.probabilities[index] = if good + bad == 0.0 {
            if value > self.good_avg {
                1.0
            } else if value < self.bad_avg {
                0.0
            } else {
                0.5
            }
        } else {
            good / (good + bad)
        };
    }
}

impl Regression for GoodBadRegression {
    fn name(&self) -> &str {
        "good_bad"
    }

    fn predict(&self, coord: &Coord, _time: f64) -> f64 {
        self.probability_good(coord)
            .map_or(f64::NAN, |p| p * self.good_avg + (1.0 - p) * self.bad_avg)
    }

    fn observe(&mut self, observation: &Observation) -> Result<(), RegressionError> {
        let sites = Arc::clone(&self.sites);
        let Some(origin) = sites.site(&observation.coord) else {
            tracing::trace!(coord = ?observation.coord, "observation outside site map ignored");
            return Ok(());
        };
        let mut updated = 0usize;
        for (id, _) in sites.iter() {
            let distance = sites.distance(origin, id);
            let rbf = KernelFunction::Gaussian.weight(distance / self.bandwidth);
            if rbf < NEGLIGIBLE_WEIGHT {
                continue;
            }
            self.update(id.index(), observation.value, self.deviation / rbf);
            updated += 1;
        }
        tracing::trace!(updated, value = observation.value, "good/bad evidence");
        Ok(())
    }

    /// `[bandwidth, bad_avg, good_avg, deviation]`.
    fn parameters(&self) -> Vec<f64> {
        vec![self.bandwidth, self.bad_avg, self.good_avg, self.deviation]
    }

    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        check_length(4, values.len())?;
        let bandwidth = require_positive(0, values[0])?;
        let bad_avg = require_finite(1, values[1])?;
        let good_avg = require_finite(2, values[2])?;
        require_ordered(bad_avg, good_avg)?;
        let deviation = require_positive(3, values[3])?;
        self.bandwidth = bandwidth;
        self.bad_avg = bad_avg;
        self.good_avg = good_avg;
        self.deviation = deviation;
        tracing::debug!(bandwidth, bad_avg, good_avg, deviation, "good/bad parameters updated");
        Ok(())
    }

    fn parameter_names(&self) -> Vec<Cow<'static, str>> {
        vec![
            Cow::Borrowed("bandwidth"),
            Cow::Borrowed("bad_avg"),
            Cow::Borrowed("good_avg"),
            Cow::Borrowed("deviation"),
        ]
    }

    fn on_start(&mut self, scheduler: &mut dyn Scheduler) -> Option<CancelHandle> {
        if self.drift_handle.is_none() {
            let handle = scheduler.schedule_every(1);
            tracing::debug!(%handle, drift = self.drift, "good/bad drift scheduled");
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
            tracing::debug!(%handle, "good/bad drift cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_space::{EdgeBehavior, Square4};
    use shoal_test_utils::MockScheduler;
    use smallvec::smallvec;

    fn line(cols: u32, drift: f64) -> GoodBadRegression {
        let space = Arc::new(Square4::new(1, cols, EdgeBehavior::Absorb).unwrap());
        let sites = Arc::new(SiteMap::from_space(space).unwrap());
        GoodBadRegression::new(sites, 1.0, 0.0, 10.0, 2.0, drift, 42).unwrap()
    }

    #[test]
    fn initial_probabilities_are_seeded() {
        let a = line(5, 0.0);
        let b = line(5, 0.0);
        for c in 0..5 {
            let coord: Coord = smallvec![0, c];
            let p = a.probability_good(&coord).unwrap();
            assert!((0.0..1.0).contains(&p));
            assert_eq!(Some(p), b.probability_good(&coord));
        }
    }

    #[test]
    fn prediction_mixes_the_averages() {
        let r = line(1, 0.0);
        let p = r.probability_good(&smallvec![0, 0]).unwrap();
        assert!((r.predict(&smallvec![0, 0], 0.0) - 10.0 * p).abs() < 1e-12);
        assert!(r.predict(&smallvec![3, 3], 0.0).is_nan());
    }

    #[test]
    fn good_evidence_raises_probability() {
        let mut r = line(1, 0.0);
        let before = r.probability_good(&smallvec![0, 0]).unwrap();
        r.observe(&Observation::at(0, 0, 0.0, 9.0)).unwrap();
        assert!(r.probability_good(&smallvec![0, 0]).unwrap() > before);
    }

    #[test]
    fn far_sites_ignore_evidence() {
        let mut r = line(20, 0.0);
        let before = r.probability_good(&smallvec![0, 19]).unwrap();
        r.observe(&Observation::at(0, 0, 0.0, 9.0)).unwrap();
        assert_eq!(r.probability_good(&smallvec![0, 19]).unwrap(), before);
    }

    #[test]
    fn extreme_evidence_snaps() {
        let mut r = line(1, 0.0);
        r.observe(&Observation::at(0, 0, 0.0, 1e6)).unwrap();
        assert_eq!(r.probability_good(&smallvec![0, 0]), Some(1.0));
        r.observe(&Observation::at(0, 0, 0.0, -1e6)).unwrap();
        assert_eq!(r.probability_good(&smallvec![0, 0]), Some(0.0));
    }

    #[test]
    fn drift_pulls_towards_one_half() {
        let mut r = line(1, 0.5);
        r.observe(&Observation::at(0, 0, 0.0, 1e6)).unwrap();
        r.drift();
        // (1 + 0.5) / 2
        assert_eq!(r.probability_good(&smallvec![0, 0]), Some(0.75));
    }

    #[test]
    fn daily_drift_is_scheduled_and_cancelled() {
        shoal_test_utils::init_tracing();
        let mut r = line(1, 0.5);
        let mut sched = MockScheduler::new();
        let handle = r.on_start(&mut sched).unwrap();
        assert_eq!(sched.period(handle), Some(1));
        r.observe(&Observation::at(0, 0, 0.0, -1e6)).unwrap();
        r.on_scheduled(handle, TickId(1));
        assert_eq!(r.probability_good(&smallvec![0, 0]), Some(0.25));
        r.on_stop(&mut sched);
        assert_eq!(sched.active(), 0);
    }

    #[test]
    fn parameters_round_trip() {
        let mut r = line(1, 0.0);
        assert_eq!(r.parameters(), vec![1.0, 0.0, 10.0, 2.0]);
        r.set_parameters(&[2.0, 1.0, 5.0, 0.5]).unwrap();
        assert_eq!(r.parameters(), vec![2.0, 1.0, 5.0, 0.5]);
        assert!(matches!(
            r.set_parameters(&[2.0, 1.0, 5.0, -0.5]),
            Err(ParameterError::OutOfDomain { index: 3, .. })
        ));
        assert!(r.set_parameters(&[1.0]).is_err());
    }

    #[test]
    fn averages_cannot_swap() {
        let mut r = line(1, 0.0);
        for inverted in [[1.0, 10.0, 0.0, 2.0], [1.0, 4.0, 4.0, 2.0]] {
            assert!(matches!(
                r.set_parameters(&inverted),
                Err(ParameterError::OutOfDomain { index: 2, .. })
            ));
        }
        assert_eq!(r.parameters(), vec![1.0, 0.0, 10.0, 2.0]);

        let space = Arc::new(Square4::new(1, 1, EdgeBehavior::Absorb).unwrap());
        let sites = Arc::new(SiteMap::from_space(space).unwrap());
        assert!(GoodBadRegression::new(sites, 1.0, 5.0, 5.0, 2.0, 0.0, 1).is_err());
    }

    // ── Off-map evidence ────────────────────────────────────────

    #[test]
    fn observations_off_the_map_are_ignored() {
        let mut r = line(3, 0.0);
        let before: Vec<_> = (0..3).map(|c| r.probability_good(&smallvec![0, c])).collect();
        let off_map: [Coord; 3] = [smallvec![3], smallvec![0, 7], smallvec![i32::MIN, i32::MAX]];
        for coord in off_map {
            r.observe(&Observation::new(coord, 0.0, 9.0)).unwrap();
        }
        let after: Vec<_> = (0..3).map(|c| r.probability_good(&smallvec![0, c])).collect();
        assert_eq!(before, after);
    }
}
