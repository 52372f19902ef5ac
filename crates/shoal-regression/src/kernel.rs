//! Kernels: non-negative weights from scaled distances.

use serde::{Deserialize, Serialize};

/// Weights below this are treated as zero.
///
/// Kernel regression returns `NaN` when its total weight falls below
/// this, and composite kernels stop multiplying once their running
/// product does.
pub const NEGLIGIBLE_WEIGHT: f64 = 1e-5;

/// Shape of the weight curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelFunction {
    /// `1 / (e^u + 2 + e^-u)`. Peaks at `0.25`.
    #[default]
    Logistic,
    /// `exp(-u^2 / 2)`.
    Gaussian,
    /// `max(0, 1 - |u|)`.
    Triangular,
}

impl KernelFunction {
    /// Weight for scaled distance `u`.
    ///
    /// Always in `[0, 1]`, even, and non-increasing in `|u|`. A `NaN`
    /// distance weighs zero.
    ///
    /// ```
    /// use shoal_regression::KernelFunction;
    ///
    /// assert_eq!(KernelFunction::Logistic.weight(0.0), 0.25);
    /// assert!(KernelFunction::Logistic.weight(3.0) < 0.25);
    /// ```
    pub fn weight(self, u: f64) -> f64 {
        let w = match self {
            Self::Logistic => 1.0 / (u.exp() + 2.0 + (-u).exp()),
            Self::Gaussian => (-0.5 * u * u).exp(),
            Self::Triangular => 1.0 - u.abs(),
        };
        // f64::max drops NaN in favour of the other operand.
        w.max(0.0)
    }
}

/// Product of one kernel per feature dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeKernel {
    kernel: KernelFunction,
    bandwidths: Vec<f64>,
}

impl CompositeKernel {
    /// One bandwidth per feature. Bandwidths are not validated here;
    /// callers check them with [`params::require_positive`].
    ///
    /// [`params::require_positive`]: crate::params::require_positive
    pub fn new(kernel: KernelFunction, bandwidths: Vec<f64>) -> Self {
        Self { kernel, bandwidths }
    }

    /// The kernel shape.
    pub fn kernel(&self) -> KernelFunction {
        self.kernel
    }

    /// Per-feature bandwidths.
    pub fn bandwidths(&self) -> &[f64] {
        &self.bandwidths
    }

    /// Replace the bandwidths, keeping their count.
    pub fn set_bandwidths(&mut self, bandwidths: &[f64]) {
        debug_assert_eq!(bandwidths.len(), self.bandwidths.len());
        self.bandwidths.copy_from_slice(bandwidths);
    }

    /// `Π k(|a_i - b_i| / h_i)`, or `0` once the running product is
    /// negligible.
    pub fn weight(&self, a: &[f64], b: &[f64]) -> f64 {
        let mut product = 1.0;
        for ((x, y), h) in a.iter().zip(b).zip(&self.bandwidths) {
            product *= self.kernel.weight((x - y).abs() / h);
            if product < NEGLIGIBLE_WEIGHT {
                return 0.0;
            }
        }
        product
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [KernelFunction; 3] = [
        KernelFunction::Logistic,
        KernelFunction::Gaussian,
        KernelFunction::Triangular,
    ];

    #[test]
    fn logistic_peak_is_a_quarter() {
        assert_eq!(KernelFunction::Logistic.weight(0.0), 0.25);
    }

    #[test]
    fn logistic_underflows_to_zero_far_away() {
        assert_eq!(KernelFunction::Logistic.weight(1e4), 0.0);
        assert_eq!(KernelFunction::Logistic.weight(-1e4), 0.0);
    }

    #[test]
    fn nan_distance_weighs_nothing() {
        for k in ALL {
            assert_eq!(k.weight(f64::NAN), 0.0, "{k:?}");
        }
    }

    #[test]
    fn triangular_has_compact_support() {
        assert_eq!(KernelFunction::Triangular.weight(0.5), 0.5);
        assert_eq!(KernelFunction::Triangular.weight(2.0), 0.0);
    }

    #[test]
    fn composite_multiplies_per_feature_weights() {
        let k = CompositeKernel::new(KernelFunction::Gaussian, vec![1.0, 2.0]);
        let w = k.weight(&[0.0, 0.0], &[1.0, 2.0]);
        let expected = (-0.5f64).exp() * (-0.5f64).exp();
        assert!((w - expected).abs() < 1e-12);
    }

    #[test]
    fn composite_short_circuits_below_threshold() {
        let k = CompositeKernel::new(KernelFunction::Logistic, vec![1.0, 1.0, 1.0]);
        // 0.25^3 is still above 1e-5.
        assert!(k.weight(&[0.0; 3], &[0.0; 3]) > 0.0);
        // A single far dimension zeroes the product.
        assert_eq!(k.weight(&[0.0, 0.0, 0.0], &[50.0, 0.0, 0.0]), 0.0);
    }

    proptest! {
        #[test]
        fn kernels_are_non_negative_and_non_increasing(
            a in 0.0f64..50.0,
            b in 0.0f64..50.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for k in ALL {
                let w_lo = k.weight(lo);
                let w_hi = k.weight(hi);
                prop_assert!(w_hi >= 0.0);
                prop_assert!(w_hi <= w_lo, "{k:?}: k({hi}) = {w_hi} > k({lo}) = {w_lo}");
            }
        }

        #[test]
        fn kernels_are_even(u in -50.0f64..50.0) {
            for k in ALL {
                prop_assert!((k.weight(u) - k.weight(-u)).abs() < 1e-15);
            }
        }
    }
}
