//! Time source and fixed-delay sleeper.
//!
//! Every delay in the bridge (retry backoff, sample period, settle time)
//! goes through [`Clock::sleep`] so bring-up timing can be checked on host.

use core::time::Duration;

/// Monotonic time plus blocking sleep.
pub trait Clock: Send + Sync {
    /// Microseconds since boot.
    fn now_us(&self) -> i64;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> i64 {
        (**self).now_us()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_us(&self) -> i64 {
        (**self).now_us()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Host clock backed by `std::time::Instant`.
///
/// On ESP-IDF `thread::sleep` maps onto `vTaskDelay`, so this is also the
/// sleeper used on target; only the time base differs (see `hal::clock`).
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_us(&self) -> i64 {
        self.start.elapsed().as_micros() as i64
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_us();
        clock.sleep(Duration::from_millis(2));
        let b = clock.now_us();
        assert!(b >= a + 2_000);
    }
}
