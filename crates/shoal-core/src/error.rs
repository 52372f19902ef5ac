//! Error types for the Shoal online-learning framework.
//!
//! Undefined predictions are never errors: they surface as `NaN` from
//! `predict`. The enums here cover the two remaining classes: violated
//! preconditions (wrong parameter arity, non-positive bandwidths,
//! mismatched feature counts) and numeric instability inside an update.

use std::error::Error;
use std::fmt;

/// Errors from writing a strategy's hyperparameter vector.
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterError {
    /// The supplied vector does not have the strategy's fixed length.
    LengthMismatch {
        /// Length returned by `parameters()`.
        expected: usize,
        /// Length of the rejected vector.
        got: usize,
    },
    /// A single entry lies outside the domain of its parameter.
    OutOfDomain {
        /// Position of the offending entry.
        index: usize,
        /// The rejected value.
        value: f64,
        /// Which constraint was violated.
        reason: &'static str,
    },
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, got } => {
                write!(f, "parameter vector has length {got}, expected {expected}")
            }
            Self::OutOfDomain {
                index,
                value,
                reason,
            } => write!(f, "parameter {index} = {value} is invalid: {reason}"),
        }
    }
}

impl Error for ParameterError {}

/// Errors from constructing or updating a regression strategy.
#[derive(Clone, Debug, PartialEq)]
pub enum RegressionError {
    /// An update produced a non-finite intermediate. The strategy's state
    /// is left as it was before the update.
    NumericInstability {
        /// Name of the intermediate that went non-finite.
        stage: &'static str,
    },
    /// A feature vector's length differs from the configured arity.
    ArityMismatch {
        /// Configured number of features.
        expected: usize,
        /// Length actually supplied.
        got: usize,
    },
    /// Construction-time configuration is invalid.
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
    /// A hyperparameter was rejected.
    Parameter(ParameterError),
}

impl fmt::Display for RegressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NumericInstability { stage } => {
                write!(f, "numeric instability: {stage} is not finite")
            }
            Self::ArityMismatch { expected, got } => {
                write!(f, "feature vector has {got} entries, expected {expected}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid configuration: {reason}"),
            Self::Parameter(e) => write!(f, "parameter: {e}"),
        }
    }
}

impl Error for RegressionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parameter(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParameterError> for RegressionError {
    fn from(e: ParameterError) -> Self {
        Self::Parameter(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_message_names_both_lengths() {
        let e = ParameterError::LengthMismatch {
            expected: 3,
            got: 1,
        };
        assert_eq!(e.to_string(), "parameter vector has length 1, expected 3");
    }

    #[test]
    fn parameter_error_is_source_of_regression_error() {
        let inner = ParameterError::OutOfDomain {
            index: 0,
            value: -1.0,
            reason: "bandwidth must be finite and > 0",
        };
        let outer = RegressionError::from(inner.clone());
        assert_eq!(outer, RegressionError::Parameter(inner));
        assert!(outer.source().is_some());
    }

    #[test]
    fn instability_has_no_source() {
        let e = RegressionError::NumericInstability { stage: "gain" };
        assert!(e.source().is_none());
        assert!(e.to_string().contains("gain"));
    }
}
