//! Test utilities and mock types for Shoal development.
//!
//! Provides a [`MockScheduler`] that records registrations without
//! running anything, an [`init_tracing`] hook for tests that want log
//! output, and the regression and data [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    grid_sites, masked_sites, observation_stream, ConstRegression, FailingRegression,
};

use shoal_core::{CancelHandle, Scheduler, TickId};
use std::sync::Once;

/// Install a `tracing` subscriber that honours `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs. Output
/// goes through the test writer so `cargo test` captures it.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Mock implementation of [`Scheduler`].
///
/// Records `(handle, period)` registrations in order. Nothing fires on
/// its own: tests call the strategy's `on_scheduled` directly with the
/// handle they want to simulate.
#[derive(Debug, Default)]
pub struct MockScheduler {
    now: TickId,
    next: u64,
    registered: Vec<(CancelHandle, u64)>,
    cancelled: Vec<CancelHandle>,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick reported by `now()`.
    pub fn set_now(&mut self, tick: TickId) {
        self.now = tick;
    }

    /// Period of a live registration.
    pub fn period(&self, handle: CancelHandle) -> Option<u64> {
        self.registered
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, p)| *p)
    }

    /// Number of live registrations.
    pub fn active(&self) -> usize {
        self.registered.len()
    }

    /// Handles cancelled so far, in order.
    pub fn cancelled(&self) -> &[CancelHandle] {
        &self.cancelled
    }
}

impl Scheduler for MockScheduler {
    fn now(&self) -> TickId {
        self.now
    }

    fn schedule_every(&mut self, period: u64) -> CancelHandle {
        let handle = CancelHandle(self.next);
        self.next += 1;
        self.registered.push((handle, period.max(1)));
        handle
    }

    fn cancel(&mut self, handle: CancelHandle) -> bool {
        let before = self.registered.len();
        self.registered.retain(|(h, _)| *h != handle);
        let removed = self.registered.len() != before;
        if removed {
            self.cancelled.push(handle);
        }
        removed
    }
}
