//! Per-learner activity counters.
//!
//! [`LearnerMetrics`] is cumulative over a learner's lifetime. The
//! [`Learner`](crate::Learner) updates it; telemetry and calibration
//! tooling read it.

use serde::{Deserialize, Serialize};

/// Cumulative counters for one learner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerMetrics {
    /// Observations the regression accepted.
    pub observations_accepted: u64,
    /// Observations the regression rejected with an error.
    pub observations_rejected: u64,
    /// Scheduled callbacks delivered to the regression.
    pub scheduled_callbacks: u64,
    /// Successful `set_parameters` calls.
    pub parameter_updates: u64,
    /// Rejected `set_parameters` calls.
    pub parameter_rejections: u64,
}

impl LearnerMetrics {
    /// Accepted plus rejected observations.
    pub fn observations(&self) -> u64 {
        self.observations_accepted + self.observations_rejected
    }
}
