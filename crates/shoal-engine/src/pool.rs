//! A set of learners sharing one clock.
//!
//! [`LearnerPool`] owns a [`TickScheduler`] and any number of uniquely
//! named [`Learner`]s, kept in insertion order. Each
//! [`tick()`](LearnerPool::tick) advances the clock once and hands the
//! due handles to every learner in that order, so a pool replays
//! identically for identical inputs.

use std::sync::Arc;

use indexmap::IndexMap;
use shoal_core::{Coord, Observation, RegressionError, Scheduler, TickId};
use shoal_space::SiteMap;

use crate::config::{ConfigError, LearnerConfig};
use crate::learner::Learner;
use crate::scheduler::TickScheduler;

/// Learners driven by a shared [`TickScheduler`].
#[derive(Debug, Default)]
pub struct LearnerPool {
    scheduler: TickScheduler,
    learners: IndexMap<String, Learner>,
    started: bool,
}

impl LearnerPool {
    /// An empty pool at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one learner per config over `sites`.
    ///
    /// # Errors
    ///
    /// The first config that fails to validate or build, or
    /// `DuplicateLearner` if two configs share a name.
    pub fn from_configs(configs: &[LearnerConfig], sites: Arc<SiteMap>) -> Result<Self, ConfigError> {
        let mut pool = Self::new();
        for config in configs {
            pool.insert(Learner::from_config(config, Arc::clone(&sites))?)?;
        }
        Ok(pool)
    }

    /// Add a learner. If the pool is already started, so is the learner.
    pub fn insert(&mut self, mut learner: Learner) -> Result<(), ConfigError> {
        if self.learners.contains_key(learner.name()) {
            return Err(ConfigError::DuplicateLearner {
                name: learner.name().to_string(),
            });
        }
        if self.started {
            learner.start(&mut self.scheduler);
        }
        self.learners.insert(learner.name().to_string(), learner);
        Ok(())
    }

    /// Stop and remove a learner.
    pub fn remove(&mut self, name: &str) -> Option<Learner> {
        let mut learner = self.learners.shift_remove(name)?;
        learner.stop(&mut self.scheduler);
        Some(learner)
    }

    /// Start every learner.
    pub fn start(&mut self) {
        for learner in self.learners.values_mut() {
            learner.start(&mut self.scheduler);
        }
        self.started = true;
    }

    /// Stop every learner, cancelling their callbacks.
    pub fn stop(&mut self) {
        for learner in self.learners.values_mut() {
            learner.stop(&mut self.scheduler);
        }
        self.started = false;
    }

    /// Advance one tick and deliver due callbacks. Returns the new tick.
    pub fn tick(&mut self) -> TickId {
        let due = self.scheduler.advance();
        let now = self.scheduler.now();
        if !due.is_empty() {
            for learner in self.learners.values_mut() {
                learner.on_tick(&due, now);
            }
        }
        now
    }

    /// Feed an observation to every learner.
    ///
    /// Returns the learners that rejected it, with their errors. A
    /// rejection does not stop delivery to the remaining learners.
    pub fn observe(&mut self, observation: &Observation) -> Vec<(String, RegressionError)> {
        let mut failures = Vec::new();
        for (name, learner) in &mut self.learners {
            if let Err(e) = learner.observe(observation) {
                failures.push((name.clone(), e));
            }
        }
        failures
    }

    /// Prediction of the named learner, `None` if there is no such learner.
    pub fn predict(&self, name: &str, coord: &Coord, time: f64) -> Option<f64> {
        self.learners.get(name).map(|l| l.predict(coord, time))
    }

    /// The named learner.
    pub fn get(&self, name: &str) -> Option<&Learner> {
        self.learners.get(name)
    }

    /// The named learner, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Learner> {
        self.learners.get_mut(name)
    }

    /// Learners in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Learner> + '_ {
        self.learners.values()
    }

    /// Number of learners.
    pub fn len(&self) -> usize {
        self.learners.len()
    }

    /// Whether the pool has no learners.
    pub fn is_empty(&self) -> bool {
        self.learners.is_empty()
    }

    /// The shared clock.
    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// The current tick.
    pub fn now(&self) -> TickId {
        self.scheduler.now()
    }
}
