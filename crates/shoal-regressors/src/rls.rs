//! Recursive least squares with exponential forgetting.
//!
//! Maintains `ŷ = x·β` and the `D×D` inverse-information matrix `P`.
//! One observation `(x, y)` with noise variance `σ²` and forgetting
//! factor `λ` updates them as
//!
//! ```text
//! π = x·P
//! γ = λσ² + x·πᵀ
//! g = π / γ
//! β ← β + (y − x·β) g
//! P ← (P − g ⊗ π) / λ
//! ```
//!
//! When `γ == 0` the correction is skipped and only `P ← P / λ` is
//! applied. Every intermediate is computed into scratch buffers first
//! and checked for finiteness; nothing is committed if any check fails.

use shoal_core::{Coord, Observation, ParameterError, RegressionError};
use shoal_regression::params::{check_length, require_forgetting, require_non_negative};
use shoal_regression::{FeatureSet, Regression};
use std::borrow::Cow;

/// Online linear regression with propagated uncertainty.
///
/// # Examples
///
/// ```
/// use shoal_regression::{FeatureSet, GridX, Regression};
/// use shoal_regressors::RecursiveLeastSquares;
///
/// let mut rls = RecursiveLeastSquares::new(FeatureSet::new().with(GridX), 1.0, 1.0, 1e4).unwrap();
/// for x in 1..=20 {
///     rls.update_features(&[x as f64], 2.0 * x as f64).unwrap();
/// }
/// assert!((rls.coefficients()[0] - 2.0).abs() < 1e-3);
/// ```
#[derive(Clone, Debug)]
pub struct RecursiveLeastSquares {
    features: FeatureSet,
    dim: usize,
    forgetting: f64,
    noise: f64,
    beta: Vec<f64>,
    /// Row-major `dim × dim`.
    p: Vec<f64>,
    scratch: Scratch,
}

#[derive(Clone, Debug)]
struct Scratch {
    pi: Vec<f64>,
    gain: Vec<f64>,
    beta: Vec<f64>,
    p: Vec<f64>,
}

impl Scratch {
    fn new(dim: usize) -> Self {
        Self {
            pi: vec![0.0; dim],
            gain: vec![0.0; dim],
            beta: vec![0.0; dim],
            p: vec![0.0; dim * dim],
        }
    }
}

fn all_finite(v: &[f64]) -> bool {
    v.iter().all(|x| x.is_finite())
}

fn unstable(stage: &'static str) -> RegressionError {
    tracing::warn!(stage, "RLS update rejected: non-finite intermediate");
    RegressionError::NumericInstability { stage }
}

impl RecursiveLeastSquares {
    /// `P` starts as `initial_uncertainty · I` and `β` as zero.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` without features or with a non-positive initial
    /// uncertainty; `Parameter` if `forgetting ∉ (0, 1]` or `noise < 0`.
    pub fn new(
        features: FeatureSet,
        forgetting: f64,
        noise: f64,
        initial_uncertainty: f64,
    ) -> Result<Self, RegressionError> {
        if features.is_empty() {
            return Err(RegressionError::InvalidConfig {
                reason: "at least one feature is required".into(),
            });
        }
        if !(initial_uncertainty.is_finite() && initial_uncertainty > 0.0) {
            return Err(RegressionError::InvalidConfig {
                reason: format!(
                    "initial uncertainty must be finite and > 0, got {initial_uncertainty}"
                ),
            });
        }
        require_forgetting(0, forgetting)?;
        require_non_negative(1, noise)?;
        let dim = features.len();
        let mut p = vec![0.0; dim * dim];
        for i in 0..dim {
            p[i * dim + i] = initial_uncertainty;
        }
        tracing::debug!(dim, forgetting, noise, initial_uncertainty, "RLS filter built");
        Ok(Self {
            features,
            dim,
            forgetting,
            noise,
            beta: vec![0.0; dim],
            p,
            scratch: Scratch::new(dim),
        })
    }

    /// Current coefficients `β`.
    pub fn coefficients(&self) -> &[f64] {
        &self.beta
    }

    /// Current `P`, row-major.
    pub fn covariance(&self) -> &[f64] {
        &self.p
    }

    /// `x·P·xᵀ` at `coord` and `time`: how uncertain the model is there.
    pub fn uncertainty(&self, coord: &Coord, time: f64) -> f64 {
        let x = self.features.extract(coord, time);
        let d = self.dim;
        let mut total = 0.0;
        for i in 0..d {
            for j in 0..d {
                total += x[i] * self.p[i * d + j] * x[j];
            }
        }
        total
    }

    /// `x·β` for a raw feature vector; `NaN` on a wrong length.
    pub fn predict_features(&self, x: &[f64]) -> f64 {
        if x.len() != self.dim {
            return f64::NAN;
        }
        x.iter().zip(&self.beta).map(|(a, b)| a * b).sum()
    }

    /// Update with a raw feature vector, using the configured noise.
    pub fn update_features(&mut self, x: &[f64], y: f64) -> Result<(), RegressionError> {
        self.update(x, y, self.noise)
    }

    /// Update with a raw feature vector and an explicit noise variance.
    ///
    /// # Errors
    ///
    /// `ArityMismatch` on a wrong-length `x`; `NumericInstability` if any
    /// intermediate is not finite, in which case `β` and `P` are
    /// unchanged.
    pub fn update(&mut self, x: &[f64], y: f64, noise: f64) -> Result<(), RegressionError> {
        let d = self.dim;
        if x.len() != d {
            return Err(RegressionError::ArityMismatch {
                expected: d,
                got: x.len(),
            });
        }
        let lambda = self.forgetting;
        let error = y - self.predict_features(x);
        let s = &mut self.scratch;

        for j in 0..d {
            s.pi[j] = (0..d).map(|i| x[i] * self.p[i * d + j]).sum();
        }
        if !all_finite(&s.pi) {
            return Err(unstable("pi"));
        }

        let gamma = lambda * noise + x.iter().zip(&s.pi).map(|(a, b)| a * b).sum::<f64>();
        if !gamma.is_finite() {
            return Err(unstable("gamma"));
        }

        if gamma == 0.0 {
            for (dst, src) in s.p.iter_mut().zip(&self.p) {
                *dst = src / lambda;
            }
            if !all_finite(&s.p) {
                return Err(unstable("P"));
            }
            std::mem::swap(&mut self.p, &mut s.p);
            tracing::warn!("degenerate RLS update: correction skipped, uncertainty inflated");
            return Ok(());
        }

        for j in 0..d {
            s.gain[j] = s.pi[j] / gamma;
        }
        if !all_finite(&s.gain) {
            return Err(unstable("gain"));
        }

        for j in 0..d {
            s.beta[j] = self.beta[j] + error * s.gain[j];
        }
        if !all_finite(&s.beta) {
            return Err(unstable("beta"));
        }

        for i in 0..d {
            for j in 0..d {
                s.p[i * d + j] = (self.p[i * d + j] - s.gain[i] * s.pi[j]) / lambda;
            }
        }
        if !all_finite(&s.p) {
            return Err(unstable("P"));
        }

        std::mem::swap(&mut self.beta, &mut s.beta);
        std::mem::swap(&mut self.p, &mut s.p);
        tracing::trace!(error, gamma, "RLS update");
        Ok(())
    }
}

impl Regression for RecursiveLeastSquares {
    fn name(&self) -> &str {
        "recursive_least_squares"
    }

    fn predict(&self, coord: &Coord, time: f64) -> f64 {
        self.predict_features(&self.features.extract(coord, time))
    }

    fn observe(&mut self, observation: &Observation) -> Result<(), RegressionError> {
        let x = self.features.extract(&observation.coord, observation.time);
        self.update(&x, observation.value, self.noise)
    }

    /// `[forgetting, noise]`.
    fn parameters(&self) -> Vec<f64> {
        vec![self.forgetting, self.noise]
    }

    fn set_parameters(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        check_length(2, values.len())?;
        let forgetting = require_forgetting(0, values[0])?;
        let noise = require_non_negative(1, values[1])?;
        self.forgetting = forgetting;
        self.noise = noise;
        tracing::debug!(forgetting, noise, "RLS parameters updated");
        Ok(())
    }

    fn parameter_names(&self) -> Vec<Cow<'static, str>> {
        vec![Cow::Borrowed("forgetting"), Cow::Borrowed("noise")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_regression::{Constant, GridX};
    use smallvec::smallvec;

    fn single(forgetting: f64, noise: f64) -> RecursiveLeastSquares {
        RecursiveLeastSquares::new(FeatureSet::new().with(GridX), forgetting, noise, 1e4).unwrap()
    }

    #[test]
    fn converges_on_noiseless_line() {
        let mut rls = single(1.0, 1.0);
        for x in 1..=30 {
            rls.observe(&Observation::at(0, x, 0.0, 2.0 * x as f64)).unwrap();
        }
        assert!((rls.coefficients()[0] - 2.0).abs() < 1e-3);
        assert!((rls.predict(&smallvec![0, 10], 0.0) - 20.0).abs() < 1e-2);
    }

    #[test]
    fn intercept_and_slope_recovered() {
        let features = FeatureSet::new().with(Constant(1.0)).with(GridX);
        let mut rls = RecursiveLeastSquares::new(features, 1.0, 1e-6, 1e6).unwrap();
        for x in 0..50 {
            rls.observe(&Observation::at(0, x, 0.0, 3.0 - 0.5 * x as f64)).unwrap();
        }
        let b = rls.coefficients();
        assert!((b[0] - 3.0).abs() < 1e-3, "intercept {}", b[0]);
        assert!((b[1] + 0.5).abs() < 1e-3, "slope {}", b[1]);
    }

    #[test]
    fn uncertainty_shrinks_with_data() {
        let mut rls = single(1.0, 1.0);
        let before = rls.uncertainty(&smallvec![0, 1], 0.0);
        rls.observe(&Observation::at(0, 1, 0.0, 2.0)).unwrap();
        assert!(rls.uncertainty(&smallvec![0, 1], 0.0) < before);
    }

    #[test]
    fn zero_gamma_only_inflates_uncertainty() {
        let mut rls = single(0.5, 0.0);
        // x = 0 and no noise: gamma is exactly zero.
        rls.update_features(&[0.0], 7.0).unwrap();
        assert_eq!(rls.coefficients(), &[0.0]);
        assert_eq!(rls.covariance(), &[2e4]);
    }

    #[test]
    fn non_finite_input_is_rejected_without_corruption() {
        let mut rls = single(1.0, 1.0);
        rls.update_features(&[1.0], 2.0).unwrap();
        let beta = rls.coefficients().to_vec();
        let p = rls.covariance().to_vec();
        let err = rls.update_features(&[f64::NAN], 2.0).unwrap_err();
        assert_eq!(err, RegressionError::NumericInstability { stage: "pi" });
        let err = rls.update_features(&[1.0], f64::INFINITY).unwrap_err();
        assert_eq!(err, RegressionError::NumericInstability { stage: "beta" });
        assert_eq!(rls.coefficients(), beta.as_slice());
        assert_eq!(rls.covariance(), p.as_slice());
    }

    #[test]
    fn arity_checked() {
        let mut rls = single(1.0, 1.0);
        assert_eq!(
            rls.update_features(&[1.0, 2.0], 0.0),
            Err(RegressionError::ArityMismatch { expected: 1, got: 2 })
        );
        assert!(rls.predict_features(&[]).is_nan());
    }

    #[test]
    fn parameters_validate_domain() {
        let mut rls = single(0.9, 2.0);
        assert_eq!(rls.parameters(), vec![0.9, 2.0]);
        assert!(rls.set_parameters(&[0.0, 1.0]).is_err());
        assert!(rls.set_parameters(&[1.0, -1.0]).is_err());
        rls.set_parameters(&[1.0, 0.5]).unwrap();
        assert_eq!(rls.parameters(), vec![1.0, 0.5]);
    }

    #[test]
    fn constructor_rejects_bad_config() {
        assert!(RecursiveLeastSquares::new(FeatureSet::new(), 1.0, 1.0, 1.0).is_err());
        assert!(RecursiveLeastSquares::new(FeatureSet::new().with(GridX), 1.0, 1.0, 0.0).is_err());
        assert!(RecursiveLeastSquares::new(FeatureSet::new().with(GridX), 1.5, 1.0, 1.0).is_err());
    }
}
