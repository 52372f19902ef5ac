//! The [`Regression`] trait.
//!
//! A regression strategy is an online learner: it absorbs observations
//! one at a time and answers value queries at any moment in between.
//! Strategies are selected at configuration time and stored as
//! `Box<dyn Regression>`.

use shoal_core::{
    CancelHandle, Coord, Observation, ParameterError, RegressionError, Scheduler, TickId,
};
use std::borrow::Cow;

/// An online spatial regression strategy.
///
/// # Contract
///
/// - `predict()` is side-effect free. `NaN` means "no prediction
///   available"; it is never an error and never a panic.
/// - `observe()` mutates in place. Only numeric instability and arity
///   violations are reported as `Err`, and a failed update leaves the
///   previous state intact.
/// - `parameters()` and `set_parameters()` share one fixed length and
///   order. `set_parameters(&parameters())` does not change subsequent
///   predictions.
/// - Strategies with periodic work register it in `on_start()` and
///   cancel it in `on_stop()`. The owner routes due handles to
///   `on_scheduled()`.
///
/// # Examples
///
/// A strategy that predicts the last value it saw:
///
/// ```
/// use std::borrow::Cow;
/// use shoal_core::{Coord, Observation, ParameterError, RegressionError};
/// use shoal_regression::Regression;
/// use shoal_regression::params::check_length;
///
/// struct LastValue(f64);
///
/// impl Regression for LastValue {
///     fn name(&self) -> &str { "last_value" }
///
///     fn predict(&self, _coord: &Coord, _time: f64) -> f64 { self.0 }
///
///     fn observe(&mut self, obs: &Observation) -> Result<(), RegressionError> {
///         self.0 = obs.value;
///         Ok(())
///     }
///
///     fn parameters(&self) -> Vec<f64> { Vec::new() }
///
///     fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
///         check_length(0, values.len())
///     }
///
///     fn parameter_names(&self) -> Vec<Cow<'static, str>> { Vec::new() }
/// }
///
/// let mut r = LastValue(f64::NAN);
/// r.observe(&Observation::at(0, 0, 0.0, 3.0)).unwrap();
/// assert_eq!(r.predict(&vec![5, 5].into(), 10.0), 3.0);
/// ```
pub trait Regression: Send {
    /// Short strategy name, used in logs and parameter snapshots.
    fn name(&self) -> &str;

    /// Predicted value at `coord` and `time`.
    fn predict(&self, coord: &Coord, time: f64) -> f64;

    /// Absorb one observation.
    fn observe(&mut self, observation: &Observation) -> Result<(), RegressionError>;

    /// The tunable hyperparameters as a flat vector in a fixed order.
    fn parameters(&self) -> Vec<f64>;

    /// Replace every tunable hyperparameter.
    ///
    /// Rejects a vector whose length differs from `parameters().len()`
    /// and any entry outside its domain. On error nothing is changed.
    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError>;

    /// One label per entry of `parameters()`.
    fn parameter_names(&self) -> Vec<Cow<'static, str>>;

    /// Register periodic work with the scheduler.
    ///
    /// Returns the handle of the registered callback, if any.
    fn on_start(&mut self, scheduler: &mut dyn Scheduler) -> Option<CancelHandle> {
        let _ = scheduler;
        None
    }

    /// Run the periodic work registered under `handle`.
    fn on_scheduled(&mut self, handle: CancelHandle, now: TickId) {
        let _ = (handle, now);
    }

    /// Cancel everything registered in `on_start()`.
    fn on_stop(&mut self, scheduler: &mut dyn Scheduler) {
        let _ = scheduler;
    }
}

impl<R: Regression + ?Sized> Regression for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn predict(&self, coord: &Coord, time: f64) -> f64 {
        (**self).predict(coord, time)
    }

    fn observe(&mut self, observation: &Observation) -> Result<(), RegressionError> {
        (**self).observe(observation)
    }

    fn parameters(&self) -> Vec<f64> {
        (**self).parameters()
    }

    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        (**self).set_parameters(values)
    }

    fn parameter_names(&self) -> Vec<Cow<'static, str>> {
        (**self).parameter_names()
    }

    fn on_start(&mut self, scheduler: &mut dyn Scheduler) -> Option<CancelHandle> {
        (**self).on_start(scheduler)
    }

    fn on_scheduled(&mut self, handle: CancelHandle, now: TickId) {
        (**self).on_scheduled(handle, now)
    }

    fn on_stop(&mut self, scheduler: &mut dyn Scheduler) {
        (**self).on_stop(scheduler)
    }
}
