//! The scheduler boundary used by strategies with periodic work.
//!
//! The discrete-event scheduler itself lives outside this framework.
//! Strategies only see this trait: they ask for a periodic callback in
//! `on_start`, keep the returned [`CancelHandle`], and hand it back in
//! `on_stop`. Whoever owns the strategy routes due handles to
//! `on_scheduled`.

use crate::id::{CancelHandle, TickId};

/// Registration and cancellation of periodic callbacks.
///
/// Implementations must be deterministic: callbacks due on the same tick
/// fire in registration order.
pub trait Scheduler {
    /// The current tick.
    fn now(&self) -> TickId;

    /// Register a callback that fires every `period` ticks, first at
    /// `now() + period`. A `period` of zero is treated as one.
    fn schedule_every(&mut self, period: u64) -> CancelHandle;

    /// Stop all future invocations of `handle`.
    ///
    /// Returns `false` if the handle was unknown or already cancelled.
    fn cancel(&mut self, handle: CancelHandle) -> bool;
}
