//! Fixed-delay retry loops.
//!
//! All bring-up retries use a constant delay between attempts, no
//! exponential growth, and no delay after the final attempt.

use core::time::Duration;

use crate::clock::Clock;

/// Result of a bounded retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Operation succeeded on the given attempt (1-based).
    Succeeded { attempt: u32 },
    /// Every attempt failed.
    Exhausted { attempts: u32 },
}

impl RetryOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, RetryOutcome::Succeeded { .. })
    }

    /// Number of attempts actually made.
    pub fn attempts(self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempt } => attempt,
            RetryOutcome::Exhausted { attempts } => attempts,
        }
    }
}

/// Run `op` up to `max_attempts` times, sleeping `delay` between failures.
///
/// `op` receives the 1-based attempt number.
pub fn retry_bounded<C, F>(clock: &C, max_attempts: u32, delay: Duration, mut op: F) -> RetryOutcome
where
    C: Clock + ?Sized,
    F: FnMut(u32) -> bool,
{
    for attempt in 1..=max_attempts {
        if op(attempt) {
            return RetryOutcome::Succeeded { attempt };
        }
        if attempt < max_attempts {
            clock.sleep(delay);
        }
    }
    RetryOutcome::Exhausted {
        attempts: max_attempts,
    }
}

/// Run `op` until it succeeds, sleeping `delay` between failures.
///
/// Only for steps where nothing downstream is meaningful without success
/// (network join). Returns the attempt that succeeded.
pub fn retry_forever<C, F>(clock: &C, delay: Duration, mut op: F) -> u32
where
    C: Clock + ?Sized,
    F: FnMut(u32) -> bool,
{
    let mut attempt = 1u32;
    while !op(attempt) {
        clock.sleep(delay);
        attempt = attempt.saturating_add(1);
    }
    attempt
}
