use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source used to pace relay activations.
///
/// - now(): returns a monotonic Instant
/// - sleep(): blocks for the provided duration (implementations may simulate)
/// - sleep_until(): blocks until `deadline`, returning immediately if it already passed
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Sleep until `deadline`. Deadlines in the past return without sleeping.
    fn sleep_until(&self, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(self.now());
        self.sleep(remaining);
    }

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall-clock implementation backed by `std::time::Instant` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, d: Duration) {
        (**self).sleep(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Virtual clock: sleep(d) advances time by d without blocking.
    #[derive(Debug, Clone)]
    struct ManualClock {
        origin: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
            self.origin + off
        }

        fn sleep(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }
    }

    #[test]
    fn sleep_until_advances_to_deadline() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.sleep_until(start + Duration::from_millis(1_500));
        assert_eq!(clock.ms_since(start), 1_500);
    }

    #[test]
    fn sleep_until_past_deadline_is_noop() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_secs(2));
        clock.sleep_until(start + Duration::from_secs(1));
        assert_eq!(clock.ms_since(start), 2_000);
    }

    #[test]
    fn borrowed_clock_delegates() {
        let clock = ManualClock::new();
        let start = clock.now();
        let by_ref = &clock;
        by_ref.sleep(Duration::from_millis(40));
        assert_eq!(clock.ms_since(start), 40);
    }

    #[test]
    fn monotonic_zero_sleep_returns() {
        let clock = MonotonicClock::new();
        let start = clock.now();
        clock.sleep(Duration::ZERO);
        assert!(clock.ms_since(start) < 50);
    }
}
