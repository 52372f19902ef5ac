//! Learner configuration, validation, and error types.
//!
//! [`LearnerConfig`] is the plain-data description of one learner: a
//! [`RegressionConfig`] naming the strategy and its hyperparameters, the
//! [`FeatureConfig`]s it reads, and an RNG seed. Every type here is
//! serde-derivable so calibration tooling can store and replay them.
//!
//! [`validate()`](RegressionConfig::validate) checks structural
//! invariants that need no spatial context. [`build()`](RegressionConfig::build)
//! re-validates, resolves features against a [`BuildContext`], and
//! constructs the boxed strategy.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shoal_core::{Coord, RegressionError};
use shoal_regression::{
    CellLookup, Constant, DistanceTransform, FeatureSet, GridX, GridY, KernelFunction,
    ObservationTime, PortDistance, Regression, WeightedMetric,
};
use shoal_regressors::{
    BoundedKernelRegression, EvictionPolicy, GoodBadRegression, NearestNeighborRegression,
    ParticleFilterRegression, RecursiveLeastSquares, TransductiveKernelRegression,
    TransductiveNearestNeighbor,
};
use shoal_space::{SiteMap, Space, SpaceError};

// ── FeatureConfig ─────────────────────────────────────────────────

/// One feature extractor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureConfig {
    /// Column coordinate.
    GridX,
    /// Row coordinate.
    GridY,
    /// Observation time.
    Time,
    /// Space distance to a fixed port cell.
    PortDistance {
        /// The port cell.
        port: Vec<i32>,
    },
    /// Static per-cell lookup; cells not listed read as `NaN`.
    Habitat {
        /// Feature label.
        name: String,
        /// `(cell, value)` entries.
        table: Vec<(Vec<i32>, f64)>,
    },
    /// The same value everywhere, usually an intercept.
    Constant {
        /// The value.
        value: f64,
    },
}

impl FeatureConfig {
    fn add_to(&self, set: &mut FeatureSet, space: &Arc<dyn Space>) -> Result<(), ConfigError> {
        match self {
            Self::GridX => set.push(Arc::new(GridX)),
            Self::GridY => set.push(Arc::new(GridY)),
            Self::Time => set.push(Arc::new(ObservationTime)),
            Self::PortDistance { port } => {
                let coord: Coord = port.iter().copied().collect();
                if !space.contains(&coord) {
                    return Err(ConfigError::CellOutsideSpace {
                        feature: "port_distance".into(),
                        cell: port.clone(),
                    });
                }
                set.push(Arc::new(PortDistance::new(Arc::clone(space), coord)));
            }
            Self::Habitat { name, table } => {
                let mut entries = Vec::with_capacity(table.len());
                for (cell, value) in table {
                    let coord: Coord = cell.iter().copied().collect();
                    if !space.contains(&coord) {
                        return Err(ConfigError::CellOutsideSpace {
                            feature: name.clone(),
                            cell: cell.clone(),
                        });
                    }
                    entries.push((coord, *value));
                }
                set.push(Arc::new(CellLookup::new(name.clone(), entries)));
            }
            Self::Constant { value } => set.push(Arc::new(Constant(*value))),
        }
        Ok(())
    }
}

/// `[grid_x, grid_y, time]`.
pub fn space_time_features() -> Vec<FeatureConfig> {
    vec![FeatureConfig::GridX, FeatureConfig::GridY, FeatureConfig::Time]
}

// ── BuildContext ──────────────────────────────────────────────────

/// What a configuration is resolved against.
#[derive(Clone, Debug)]
pub struct BuildContext {
    /// Sites for transductive strategies; its space resolves features.
    pub sites: Arc<SiteMap>,
    /// Seed for strategies that draw random numbers.
    pub seed: u64,
}

impl BuildContext {
    /// Context over `sites` with `seed`.
    pub fn new(sites: Arc<SiteMap>, seed: u64) -> Self {
        Self { sites, seed }
    }

    /// Resolve feature configs into a [`FeatureSet`].
    pub fn features(&self, configs: &[FeatureConfig]) -> Result<FeatureSet, ConfigError> {
        let mut set = FeatureSet::new();
        for config in configs {
            config.add_to(&mut set, self.sites.space())?;
        }
        Ok(set)
    }
}

// ── RegressionConfig ──────────────────────────────────────────────

/// Which strategy to build, and its hyperparameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RegressionConfig {
    /// [`NearestNeighborRegression`].
    NearestNeighbor {
        /// Features, one per metric dimension.
        features: Vec<FeatureConfig>,
        /// Per-feature distance transform.
        transforms: Vec<DistanceTransform>,
        /// Per-feature bandwidth.
        bandwidths: Vec<f64>,
        /// Neighbors averaged per prediction.
        neighbors: usize,
    },
    /// [`BoundedKernelRegression`].
    BoundedKernel {
        /// Features compared under the unit metric.
        features: Vec<FeatureConfig>,
        /// Weight curve.
        kernel: KernelFunction,
        /// Scalar bandwidth.
        bandwidth: f64,
        /// Maximum retained observations.
        capacity: usize,
        /// Which observation leaves first.
        eviction: EvictionPolicy,
        /// Predict `NaN` off the site map.
        restrict_to_sites: bool,
    },
    /// [`TransductiveKernelRegression`].
    TransductiveKernel {
        /// Features, one per bandwidth.
        features: Vec<FeatureConfig>,
        /// Weight curve.
        kernel: KernelFunction,
        /// Per-feature bandwidth.
        bandwidths: Vec<f64>,
        /// Exponential forgetting in `(0, 1]`.
        forgetting: f64,
    },
    /// [`TransductiveNearestNeighbor`].
    TransductiveNearestNeighbor {
        /// Features, one per metric dimension.
        features: Vec<FeatureConfig>,
        /// Per-feature distance transform.
        transforms: Vec<DistanceTransform>,
        /// Per-feature bandwidth.
        bandwidths: Vec<f64>,
        /// Observations at or beyond this distance are never cached.
        placeholder: Option<f64>,
    },
    /// [`RecursiveLeastSquares`].
    RecursiveLeastSquares {
        /// Regressors, usually with a constant intercept.
        features: Vec<FeatureConfig>,
        /// Exponential forgetting in `(0, 1]`.
        forgetting: f64,
        /// Observation noise variance.
        noise: f64,
        /// Initial covariance diagonal.
        initial_uncertainty: f64,
    },
    /// [`ParticleFilterRegression`].
    ParticleFilter {
        /// Particles per site.
        particles: usize,
        /// Lower end of the value range.
        min: f64,
        /// Upper end of the value range.
        max: f64,
        /// Drift scale per drift step.
        temporal_drift: f64,
        /// Evidence deviation at distance zero.
        evidence_deviation: f64,
        /// Relative growth of the deviation per unit distance.
        distance_noise: f64,
        /// Evidence wider than this fraction of the range is ignored.
        informative_ratio: f64,
        /// Effective-size fraction that triggers resampling.
        resample_threshold: f64,
        /// Ticks between drift steps.
        drift_period: u64,
    },
    /// [`GoodBadRegression`].
    GoodBad {
        /// Radial-basis bandwidth.
        bandwidth: f64,
        /// Mean value of a bad site.
        bad_avg: f64,
        /// Mean value of a good site.
        good_avg: f64,
        /// Evidence deviation at distance zero.
        deviation: f64,
        /// Daily pull towards one half.
        drift: f64,
    },
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self::NearestNeighbor {
            features: space_time_features(),
            transforms: vec![DistanceTransform::Absolute; 3],
            bandwidths: vec![1.0; 3],
            neighbors: 1,
        }
    }
}

impl RegressionConfig {
    /// Strategy name, as reported by the built regression.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::NearestNeighbor { .. } => "nearest_neighbor",
            Self::BoundedKernel { .. } => "bounded_kernel",
            Self::TransductiveKernel { .. } => "transductive_kernel",
            Self::TransductiveNearestNeighbor { .. } => "transductive_nearest_neighbor",
            Self::RecursiveLeastSquares { .. } => "recursive_least_squares",
            Self::ParticleFilter { .. } => "particle_filter",
            Self::GoodBad { .. } => "good_bad",
        }
    }

    /// Check structural invariants.
    ///
    /// Value domains (positive bandwidths, forgetting in range, ...) are
    /// left to the strategy constructors, which `build` runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let strategy = self.strategy();
        match self {
            Self::NearestNeighbor {
                features,
                transforms,
                bandwidths,
                neighbors,
            } => {
                require_features(strategy, features)?;
                require_arity("transforms", features.len(), transforms.len())?;
                require_arity("bandwidths", features.len(), bandwidths.len())?;
                if *neighbors == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "neighbors",
                        reason: "must be at least 1".into(),
                    });
                }
            }
            Self::BoundedKernel {
                features, capacity, ..
            } => {
                require_features(strategy, features)?;
                if *capacity == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "capacity",
                        reason: "must be at least 1".into(),
                    });
                }
            }
            Self::TransductiveKernel {
                features,
                bandwidths,
                ..
            } => {
                require_features(strategy, features)?;
                require_arity("bandwidths", features.len(), bandwidths.len())?;
            }
            Self::TransductiveNearestNeighbor {
                features,
                transforms,
                bandwidths,
                ..
            } => {
                require_features(strategy, features)?;
                require_arity("transforms", features.len(), transforms.len())?;
                require_arity("bandwidths", features.len(), bandwidths.len())?;
            }
            Self::RecursiveLeastSquares { features, .. } => {
                require_features(strategy, features)?;
            }
            Self::ParticleFilter {
                particles,
                min,
                max,
                drift_period,
                ..
            } => {
                if *particles == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "particles",
                        reason: "must be at least 1".into(),
                    });
                }
                if !(min < max) {
                    return Err(ConfigError::InvalidValue {
                        field: "min/max",
                        reason: format!("need min < max, got [{min}, {max}]"),
                    });
                }
                if *drift_period == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "drift_period",
                        reason: "must be at least 1".into(),
                    });
                }
            }
            Self::GoodBad {
                bad_avg, good_avg, ..
            } => {
                if !(bad_avg < good_avg) {
                    return Err(ConfigError::InvalidValue {
                        field: "bad_avg/good_avg",
                        reason: format!("need bad_avg < good_avg, got {bad_avg} and {good_avg}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate, resolve features, and construct the strategy.
    pub fn build(&self, ctx: &BuildContext) -> Result<Box<dyn Regression>, ConfigError> {
        self.validate()?;
        let regression: Box<dyn Regression> = match self {
            Self::NearestNeighbor {
                features,
                transforms,
                bandwidths,
                neighbors,
            } => {
                let metric = WeightedMetric::new(transforms.clone(), bandwidths.clone())?;
                Box::new(NearestNeighborRegression::new(
                    ctx.features(features)?,
                    metric,
                    *neighbors,
                )?)
            }
            Self::BoundedKernel {
                features,
                kernel,
                bandwidth,
                capacity,
                eviction,
                restrict_to_sites,
            } => {
                let mut builder = BoundedKernelRegression::builder()
                    .features(ctx.features(features)?)
                    .kernel(*kernel)
                    .bandwidth(*bandwidth)
                    .capacity(*capacity)
                    .eviction(*eviction);
                if *restrict_to_sites {
                    builder = builder.domain(Arc::clone(&ctx.sites));
                }
                Box::new(builder.build()?)
            }
            Self::TransductiveKernel {
                features,
                kernel,
                bandwidths,
                forgetting,
            } => Box::new(TransductiveKernelRegression::new(
                Arc::clone(&ctx.sites),
                ctx.features(features)?,
                *kernel,
                bandwidths.clone(),
                *forgetting,
            )?),
            Self::TransductiveNearestNeighbor {
                features,
                transforms,
                bandwidths,
                placeholder,
            } => {
                let metric = WeightedMetric::new(transforms.clone(), bandwidths.clone())?;
                Box::new(TransductiveNearestNeighbor::with_placeholder(
                    Arc::clone(&ctx.sites),
                    ctx.features(features)?,
                    metric,
                    placeholder.unwrap_or(f64::INFINITY),
                )?)
            }
            Self::RecursiveLeastSquares {
                features,
                forgetting,
                noise,
                initial_uncertainty,
            } => Box::new(RecursiveLeastSquares::new(
                ctx.features(features)?,
                *forgetting,
                *noise,
                *initial_uncertainty,
            )?),
            Self::ParticleFilter {
                particles,
                min,
                max,
                temporal_drift,
                evidence_deviation,
                distance_noise,
                informative_ratio,
                resample_threshold,
                drift_period,
            } => Box::new(
                ParticleFilterRegression::builder()
                    .sites(Arc::clone(&ctx.sites))
                    .range(*min, *max)
                    .particles(*particles)
                    .temporal_drift(*temporal_drift)
                    .evidence_deviation(*evidence_deviation)
                    .distance_noise(*distance_noise)
                    .informative_ratio(*informative_ratio)
                    .resample_threshold(*resample_threshold)
                    .drift_period(*drift_period)
                    .seed(ctx.seed)
                    .build()?,
            ),
            Self::GoodBad {
                bandwidth,
                bad_avg,
                good_avg,
                deviation,
                drift,
            } => Box::new(GoodBadRegression::new(
                Arc::clone(&ctx.sites),
                *bandwidth,
                *bad_avg,
                *good_avg,
                *deviation,
                *drift,
                ctx.seed,
            )?),
        };
        Ok(regression)
    }
}

fn require_features(strategy: &'static str, features: &[FeatureConfig]) -> Result<(), ConfigError> {
    if features.is_empty() {
        return Err(ConfigError::NoFeatures { strategy });
    }
    Ok(())
}

fn require_arity(what: &'static str, expected: usize, got: usize) -> Result<(), ConfigError> {
    if expected != got {
        return Err(ConfigError::ArityMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

// ── LearnerConfig ─────────────────────────────────────────────────

/// One named learner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearnerConfig {
    /// Unique name within a pool.
    pub name: String,
    /// Strategy and hyperparameters.
    pub regression: RegressionConfig,
    /// Seed for strategies that draw random numbers. Default: 0.
    pub seed: u64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            name: "learner".into(),
            regression: RegressionConfig::default(),
            seed: 0,
        }
    }
}

impl LearnerConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "name",
                reason: "must not be empty".into(),
            });
        }
        self.regression.validate()
    }

    /// Build the regression over `sites` with this config's seed.
    pub fn build_regression(&self, sites: Arc<SiteMap>) -> Result<Box<dyn Regression>, ConfigError> {
        self.validate()?;
        self.regression.build(&BuildContext::new(sites, self.seed))
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected while validating or building a configuration.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// A strategy that reads features was given none.
    NoFeatures {
        /// The strategy.
        strategy: &'static str,
    },
    /// A per-feature list has the wrong length.
    ArityMismatch {
        /// Which list.
        what: &'static str,
        /// Number of features.
        expected: usize,
        /// Length of the list.
        got: usize,
    },
    /// A field violates its invariant.
    InvalidValue {
        /// The field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// A feature refers to a cell outside the space.
    CellOutsideSpace {
        /// The feature.
        feature: String,
        /// The offending cell.
        cell: Vec<i32>,
    },
    /// Two learners in one pool share a name.
    DuplicateLearner {
        /// The name.
        name: String,
    },
    /// The spatial domain is invalid.
    Space(SpaceError),
    /// The strategy constructor rejected the configuration.
    Regression(RegressionError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFeatures { strategy } => write!(f, "{strategy} needs at least one feature"),
            Self::ArityMismatch {
                what,
                expected,
                got,
            } => write!(f, "{what}: expected {expected} entries (one per feature), got {got}"),
            Self::InvalidValue { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::CellOutsideSpace { feature, cell } => {
                write!(f, "feature '{feature}' refers to cell {cell:?} outside the space")
            }
            Self::DuplicateLearner { name } => write!(f, "duplicate learner name '{name}'"),
            Self::Space(e) => write!(f, "space: {e}"),
            Self::Regression(e) => write!(f, "regression: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Space(e) => Some(e),
            Self::Regression(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpaceError> for ConfigError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}

impl From<RegressionError> for ConfigError {
    fn from(e: RegressionError) -> Self {
        Self::Regression(e)
    }
}
