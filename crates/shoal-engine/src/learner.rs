//! One named regression and its lifecycle.
//!
//! A [`Learner`] owns a boxed [`Regression`] and drives it through
//! `start` → (`observe` | `predict` | scheduled callbacks)* → `stop`.
//! It remembers the handle returned by `on_start`, forwards only that
//! handle's firings to `on_scheduled`, and keeps [`LearnerMetrics`].

use std::fmt;
use std::sync::Arc;

use shoal_core::{CancelHandle, Coord, Observation, ParameterError, RegressionError, Scheduler, TickId};
use shoal_regression::{ParameterSnapshot, Regression};
use shoal_space::SiteMap;

use crate::config::{ConfigError, LearnerConfig};
use crate::metrics::LearnerMetrics;

/// Where a learner is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LearnerState {
    /// Built, not yet started.
    Idle,
    /// Started; scheduled callbacks are delivered.
    Running,
    /// Stopped; its callback, if any, has been cancelled.
    Stopped,
}

/// A named regression with lifecycle and counters.
pub struct Learner {
    name: String,
    regression: Box<dyn Regression>,
    state: LearnerState,
    handle: Option<CancelHandle>,
    metrics: LearnerMetrics,
}

// Compile-time assertion: learners move between threads with their pool.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Learner>();
    }
};

impl Learner {
    /// Wrap an already-built regression.
    pub fn new(name: impl Into<String>, regression: Box<dyn Regression>) -> Self {
        Self {
            name: name.into(),
            regression,
            state: LearnerState::Idle,
            handle: None,
            metrics: LearnerMetrics::default(),
        }
    }

    /// Validate `config` and build its regression over `sites`.
    pub fn from_config(config: &LearnerConfig, sites: Arc<SiteMap>) -> Result<Self, ConfigError> {
        let regression = config.build_regression(sites)?;
        Ok(Self::new(config.name.clone(), regression))
    }

    /// The learner's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped regression.
    pub fn regression(&self) -> &dyn Regression {
        self.regression.as_ref()
    }

    /// Lifecycle state.
    pub fn state(&self) -> LearnerState {
        self.state
    }

    /// Handle of the registered callback, while running.
    pub fn handle(&self) -> Option<CancelHandle> {
        self.handle
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> &LearnerMetrics {
        &self.metrics
    }

    /// Let the regression register its periodic work.
    ///
    /// Starting a running learner does nothing. A stopped learner may be
    /// started again.
    pub fn start(&mut self, scheduler: &mut dyn Scheduler) -> Option<CancelHandle> {
        if self.state == LearnerState::Running {
            return self.handle;
        }
        self.handle = self.regression.on_start(scheduler);
        self.state = LearnerState::Running;
        tracing::info!(
            learner = %self.name,
            strategy = self.regression.name(),
            handle = ?self.handle,
            tick = %scheduler.now(),
            "learner started"
        );
        self.handle
    }

    /// Deliver the handles due at `now`; only this learner's own handle
    /// reaches the regression, and only while running.
    pub fn on_tick(&mut self, due: &[CancelHandle], now: TickId) {
        if self.state != LearnerState::Running {
            return;
        }
        let Some(handle) = self.handle else {
            return;
        };
        if due.contains(&handle) {
            self.regression.on_scheduled(handle, now);
            self.metrics.scheduled_callbacks += 1;
        }
    }

    /// Feed one observation, counting the outcome.
    pub fn observe(&mut self, observation: &Observation) -> Result<(), RegressionError> {
        match self.regression.observe(observation) {
            Ok(()) => {
                self.metrics.observations_accepted += 1;
                Ok(())
            }
            Err(e) => {
                self.metrics.observations_rejected += 1;
                tracing::warn!(learner = %self.name, error = %e, "observation rejected");
                Err(e)
            }
        }
    }

    /// Predict at `(coord, time)`.
    pub fn predict(&self, coord: &Coord, time: f64) -> f64 {
        self.regression.predict(coord, time)
    }

    /// Replace the hyperparameters, counting the outcome.
    pub fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        let result = self.regression.set_parameters(values);
        match &result {
            Ok(()) => self.metrics.parameter_updates += 1,
            Err(e) => {
                self.metrics.parameter_rejections += 1;
                tracing::debug!(learner = %self.name, error = %e, "parameters rejected");
            }
        }
        result
    }

    /// Capture the current hyperparameters.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot::capture(self.regression.as_ref())
    }

    /// Restore hyperparameters captured from the same strategy.
    pub fn restore(&mut self, snapshot: &ParameterSnapshot) -> Result<(), RegressionError> {
        let result = snapshot.restore(self.regression.as_mut());
        match &result {
            Ok(()) => self.metrics.parameter_updates += 1,
            Err(_) => self.metrics.parameter_rejections += 1,
        }
        result
    }

    /// Cancel the regression's periodic work. Stopping an idle or
    /// stopped learner does nothing.
    pub fn stop(&mut self, scheduler: &mut dyn Scheduler) {
        if self.state != LearnerState::Running {
            return;
        }
        self.regression.on_stop(scheduler);
        self.handle = None;
        self.state = LearnerState::Stopped;
        tracing::info!(
            learner = %self.name,
            accepted = self.metrics.observations_accepted,
            rejected = self.metrics.observations_rejected,
            tick = %scheduler.now(),
            "learner stopped"
        );
    }
}

impl fmt::Debug for Learner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Learner")
            .field("name", &self.name)
            .field("strategy", &self.regression.name())
            .field("state", &self.state)
            .field("handle", &self.handle)
            .field("metrics", &self.metrics)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TickScheduler;
    use shoal_test_utils::{grid_sites, ConstRegression, FailingRegression, MockScheduler};
    use smallvec::smallvec;

    // ── Lifecycle ───────────────────────────────────────────────

    #[test]
    fn passive_strategy_registers_nothing() {
        let mut sched = MockScheduler::new();
        let mut l = Learner::new("c", Box::new(ConstRegression::new(2.0)));
        assert_eq!(l.state(), LearnerState::Idle);
        assert_eq!(l.start(&mut sched), None);
        assert_eq!(l.state(), LearnerState::Running);
        assert_eq!(sched.active(), 0);
        l.stop(&mut sched);
        assert_eq!(l.state(), LearnerState::Stopped);
    }

    #[test]
    fn drifting_strategy_is_scheduled_then_cancelled() {
        let config = LearnerConfig {
            name: "pf".into(),
            regression: crate::config::RegressionConfig::ParticleFilter {
                particles: 10,
                min: 0.0,
                max: 1.0,
                temporal_drift: 0.1,
                evidence_deviation: 0.2,
                distance_noise: 0.0,
                informative_ratio: 1.0,
                resample_threshold: 0.5,
                drift_period: 2,
            },
            seed: 3,
        };
        let mut sched = TickScheduler::new();
        let mut l = Learner::from_config(&config, grid_sites(2, 2)).unwrap();
        let handle = l.start(&mut sched).unwrap();
        assert!(sched.is_active(handle));
        // Starting again is a no-op.
        assert_eq!(l.start(&mut sched), Some(handle));
        assert_eq!(sched.len(), 1);

        for _ in 0..6 {
            let due = sched.advance();
            l.on_tick(&due, sched.now());
        }
        assert_eq!(l.metrics().scheduled_callbacks, 3);

        l.stop(&mut sched);
        assert!(!sched.is_active(handle));
        assert!(l.handle().is_none());
    }

    #[test]
    fn foreign_handles_are_not_delivered() {
        let mut sched = TickScheduler::new();
        let other = sched.schedule_every(1);
        let mut l = Learner::new("c", Box::new(ConstRegression::new(0.0)));
        l.start(&mut sched);
        l.on_tick(&[other], TickId(1));
        assert_eq!(l.metrics().scheduled_callbacks, 0);
    }

    // ── Observations ────────────────────────────────────────────

    #[test]
    fn observation_outcomes_are_counted() {
        let mut l = Learner::new("f", Box::new(FailingRegression::new(2)));
        for _ in 0..3 {
            let _ = l.observe(&Observation::at(0, 0, 0.0, 1.0));
        }
        assert_eq!(l.metrics().observations_accepted, 2);
        assert_eq!(l.metrics().observations_rejected, 1);
        assert!(l.observe(&Observation::at(0, 0, 0.0, 1.0)).is_err());
    }

    #[test]
    fn predict_goes_through() {
        let l = Learner::new("c", Box::new(ConstRegression::new(4.5)));
        assert_eq!(l.predict(&smallvec![0, 0], 0.0), 4.5);
    }

    // ── Parameters ──────────────────────────────────────────────

    #[test]
    fn parameter_updates_and_snapshots() {
        let mut l = Learner::new("c", Box::new(ConstRegression::new(1.0)));
        let snap = l.snapshot();
        l.set_parameters(&[3.0]).unwrap();
        assert!(l.set_parameters(&[3.0, 4.0]).is_err());
        assert_eq!(l.predict(&smallvec![0, 0], 0.0), 3.0);
        l.restore(&snap).unwrap();
        assert_eq!(l.predict(&smallvec![0, 0], 0.0), 1.0);
        assert_eq!(l.metrics().parameter_updates, 2);
        assert_eq!(l.metrics().parameter_rejections, 1);
    }
}
