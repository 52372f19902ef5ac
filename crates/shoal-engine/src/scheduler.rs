//! Deterministic tick-driven scheduler.
//!
//! [`TickScheduler`] is the reference [`Scheduler`]: it keeps periodic
//! registrations in registration order and reports which are due each
//! time [`advance()`](TickScheduler::advance) moves the clock one tick.
//! It never calls anything itself; the owner routes the returned handles.

use shoal_core::{CancelHandle, Scheduler, TickId};

#[derive(Clone, Debug)]
struct Registration {
    handle: CancelHandle,
    period: u64,
    next_due: u64,
}

/// Periodic registrations over a discrete clock.
#[derive(Clone, Debug, Default)]
pub struct TickScheduler {
    now: u64,
    next_handle: u64,
    registrations: Vec<Registration>,
}

impl TickScheduler {
    /// A scheduler at tick 0 with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move one tick forward and return the handles due at the new tick,
    /// in registration order.
    pub fn advance(&mut self) -> Vec<CancelHandle> {
        self.now += 1;
        let now = self.now;
        let due: Vec<CancelHandle> = self
            .registrations
            .iter_mut()
            .filter(|r| r.next_due == now)
            .map(|r| {
                r.next_due += r.period;
                r.handle
            })
            .collect();
        if !due.is_empty() {
            tracing::trace!(tick = now, due = due.len(), "scheduled callbacks due");
        }
        due
    }

    /// Whether `handle` is registered and not cancelled.
    pub fn is_active(&self, handle: CancelHandle) -> bool {
        self.registrations.iter().any(|r| r.handle == handle)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl Scheduler for TickScheduler {
    fn now(&self) -> TickId {
        TickId(self.now)
    }

    fn schedule_every(&mut self, period: u64) -> CancelHandle {
        let period = period.max(1);
        let handle = CancelHandle(self.next_handle);
        self.next_handle += 1;
        self.registrations.push(Registration {
            handle,
            period,
            next_due: self.now + period,
        });
        tracing::debug!(%handle, period, first = self.now + period, "callback registered");
        handle
    }

    fn cancel(&mut self, handle: CancelHandle) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.handle != handle);
        let removed = self.registrations.len() != before;
        if removed {
            tracing::debug!(%handle, "callback cancelled");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_fire_is_one_period_after_registration() {
        let mut s = TickScheduler::new();
        s.advance();
        let h = s.schedule_every(3);
        assert!(s.advance().is_empty());
        assert!(s.advance().is_empty());
        assert_eq!(s.advance(), vec![h]);
        assert_eq!(s.now(), TickId(4));
    }

    #[test]
    fn zero_period_behaves_as_one() {
        let mut s = TickScheduler::new();
        let h = s.schedule_every(0);
        assert_eq!(s.advance(), vec![h]);
        assert_eq!(s.advance(), vec![h]);
    }

    #[test]
    fn same_tick_fires_in_registration_order() {
        let mut s = TickScheduler::new();
        let a = s.schedule_every(2);
        let b = s.schedule_every(1);
        let c = s.schedule_every(2);
        assert_eq!(s.advance(), vec![b]);
        assert_eq!(s.advance(), vec![a, b, c]);
    }

    #[test]
    fn cancelled_handles_stop_firing() {
        let mut s = TickScheduler::new();
        let a = s.schedule_every(1);
        let b = s.schedule_every(1);
        assert!(s.cancel(a));
        assert_eq!(s.advance(), vec![b]);
        assert!(!s.is_active(a));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn unknown_or_repeated_cancel_returns_false() {
        let mut s = TickScheduler::new();
        assert!(!s.cancel(CancelHandle(7)));
        let h = s.schedule_every(1);
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert!(s.is_empty());
    }

    #[test]
    fn handles_are_never_reused() {
        let mut s = TickScheduler::new();
        let a = s.schedule_every(1);
        s.cancel(a);
        let b = s.schedule_every(1);
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn fires_exactly_every_period(period in 1u64..10, ticks in 1u64..60) {
            let mut s = TickScheduler::new();
            let h = s.schedule_every(period);
            let mut fired = 0u64;
            for _ in 0..ticks {
                if s.advance().contains(&h) {
                    fired += 1;
                }
            }
            prop_assert_eq!(fired, ticks / period);
        }
    }
}
