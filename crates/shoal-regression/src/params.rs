//! Validation helpers for flat hyperparameter vectors, and the
//! [`ParameterSnapshot`] handed to calibration tooling.

use crate::regression::Regression;
use serde::{Deserialize, Serialize};
use shoal_core::{ParameterError, RegressionError};

/// Fail unless `got == expected`.
pub fn check_length(expected: usize, got: usize) -> Result<(), ParameterError> {
    if expected == got {
        Ok(())
    } else {
        Err(ParameterError::LengthMismatch { expected, got })
    }
}

/// Accept finite, strictly positive values.
pub fn require_positive(index: usize, value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::OutOfDomain {
            index,
            value,
            reason: "must be finite and > 0",
        })
    }
}

/// Accept finite, non-negative values.
pub fn require_non_negative(index: usize, value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::OutOfDomain {
            index,
            value,
            reason: "must be finite and >= 0",
        })
    }
}

/// Accept a forgetting factor in `(0, 1]`.
pub fn require_forgetting(index: usize, value: f64) -> Result<f64, ParameterError> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(ParameterError::OutOfDomain {
            index,
            value,
            reason: "forgetting factor must lie in (0, 1]",
        })
    }
}

/// Accept any finite value.
pub fn require_finite(index: usize, value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParameterError::OutOfDomain {
            index,
            value,
            reason: "must be finite",
        })
    }
}

/// Neighbor count written through a real-valued parameter:
/// truncated, and never below one.
///
/// ```
/// use shoal_regression::params::neighbor_count;
///
/// assert_eq!(neighbor_count(3.9), 3);
/// assert_eq!(neighbor_count(0.2), 1);
/// assert_eq!(neighbor_count(-4.0), 1);
/// ```
pub fn neighbor_count(value: f64) -> usize {
    // `as` saturates: NaN and negatives become 0.
    (value.trunc() as usize).max(1)
}

/// A strategy's hyperparameters, labelled, for export to and import
/// from calibration runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    /// `Regression::name()` of the strategy captured.
    pub strategy: String,
    /// `Regression::parameter_names()`.
    pub names: Vec<String>,
    /// `Regression::parameters()`.
    pub values: Vec<f64>,
}

impl ParameterSnapshot {
    /// Record the current hyperparameters of `regression`.
    pub fn capture(regression: &dyn Regression) -> Self {
        Self {
            strategy: regression.name().to_string(),
            names: regression
                .parameter_names()
                .into_iter()
                .map(|n| n.into_owned())
                .collect(),
            values: regression.parameters(),
        }
    }

    /// Write the recorded values back into `regression`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the snapshot was taken from a different
    /// strategy, otherwise whatever `set_parameters` rejects.
    pub fn restore(&self, regression: &mut dyn Regression) -> Result<(), RegressionError> {
        if regression.name() != self.strategy {
            return Err(RegressionError::InvalidConfig {
                reason: format!(
                    "snapshot of '{}' cannot be restored into '{}'",
                    self.strategy,
                    regression.name()
                ),
            });
        }
        regression.set_parameters(&self.values)?;
        tracing::debug!(strategy = %self.strategy, values = ?self.values, "parameters restored");
        Ok(())
    }
}
