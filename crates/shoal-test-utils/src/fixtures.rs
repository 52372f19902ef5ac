//! Reusable regression and data fixtures.
//!
//! - [`grid_sites`] / [`masked_sites`] build site maps over a `Square4`.
//! - [`observation_stream`] draws a deterministic stream of observations.
//! - [`ConstRegression`] predicts a constant and counts what it sees.
//! - [`FailingRegression`] fails deterministically after N observations.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shoal_core::{Coord, Observation, ParameterError, RegressionError};
use shoal_regression::params::{check_length, require_finite};
use shoal_regression::Regression;
use shoal_space::{EdgeBehavior, SiteMap, Space, Square4};
use smallvec::smallvec;
use std::borrow::Cow;
use std::sync::Arc;

/// Every cell of a `rows × cols` absorbing grid as a site.
pub fn grid_sites(rows: u32, cols: u32) -> Arc<SiteMap> {
    let space: Arc<dyn Space> =
        Arc::new(Square4::new(rows, cols, EdgeBehavior::Absorb).expect("valid grid dimensions"));
    Arc::new(SiteMap::from_space(space).expect("non-empty grid"))
}

/// The cells of a `rows × cols` grid accepted by `keep`.
pub fn masked_sites(rows: u32, cols: u32, keep: impl Fn(&Coord) -> bool) -> Arc<SiteMap> {
    let space: Arc<dyn Space> =
        Arc::new(Square4::new(rows, cols, EdgeBehavior::Absorb).expect("valid grid dimensions"));
    Arc::new(SiteMap::with_mask(space, keep).expect("mask keeps at least one cell"))
}

/// `count` observations at uniformly drawn cells of a `rows × cols` grid,
/// at times `0, 1, 2, ...`, valued by `field(row, col, time)`.
///
/// Identical arguments always produce the identical stream.
pub fn observation_stream(
    rows: u32,
    cols: u32,
    count: usize,
    seed: u64,
    field: impl Fn(i32, i32, f64) -> f64,
) -> Vec<Observation> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let row = rng.random_range(0..rows) as i32;
            let col = rng.random_range(0..cols) as i32;
            let time = i as f64;
            let coord: Coord = smallvec![row, col];
            Observation::new(coord, time, field(row, col, time))
        })
        .collect()
}

/// Predicts a fixed value everywhere and counts observations.
///
/// Its single parameter is the predicted value.
#[derive(Clone, Debug)]
pub struct ConstRegression {
    pub value: f64,
    pub observed: usize,
}

impl ConstRegression {
    pub fn new(value: f64) -> Self {
        Self { value, observed: 0 }
    }
}

impl Regression for ConstRegression {
    fn name(&self) -> &str {
        "const"
    }

    fn predict(&self, _coord: &Coord, _time: f64) -> f64 {
        self.value
    }

    fn observe(&mut self, _observation: &Observation) -> Result<(), RegressionError> {
        self.observed += 1;
        Ok(())
    }

    fn parameters(&self) -> Vec<f64> {
        vec![self.value]
    }

    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        check_length(1, values.len())?;
        self.value = require_finite(0, values[0])?;
        Ok(())
    }

    fn parameter_names(&self) -> Vec<Cow<'static, str>> {
        vec![Cow::Borrowed("value")]
    }
}

/// Accepts `succeed_count` observations, then fails every later one
/// with [`RegressionError::NumericInstability`].
///
/// Useful for testing error propagation and failure accounting.
#[derive(Clone, Debug)]
pub struct FailingRegression {
    pub succeed_count: usize,
    calls: usize,
}

impl FailingRegression {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            calls: 0,
        }
    }

    /// Observations received so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Regression for FailingRegression {
    fn name(&self) -> &str {
        "failing"
    }

    fn predict(&self, _coord: &Coord, _time: f64) -> f64 {
        0.0
    }

    fn observe(&mut self, _observation: &Observation) -> Result<(), RegressionError> {
        self.calls += 1;
        if self.calls > self.succeed_count {
            return Err(RegressionError::NumericInstability { stage: "fixture" });
        }
        Ok(())
    }

    fn parameters(&self) -> Vec<f64> {
        Vec::new()
    }

    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        check_length(0, values.len())
    }

    fn parameter_names(&self) -> Vec<Cow<'static, str>> {
        Vec::new()
    }
}
