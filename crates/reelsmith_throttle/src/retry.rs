//! Exponential backoff for transient provider failures.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry2::strategy::ExponentialBackoff;

/// Bounded exponential backoff.
///
/// The n-th retry (1-based) waits `backoff_unit_ms * backoff_base^n`
/// milliseconds, capped at `max_backoff`. No jitter is applied, so delays
/// grow strictly until they reach the cap.
///
/// Delays are looked up by retry number rather than drawn from a running
/// iterator, so a job resumed from disk continues its schedule where the
/// persisted retry count left off.
///
/// # Examples
///
/// ```
/// use reelsmith_throttle::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy {
///     max_retries: 3,
///     backoff_base: 2,
///     backoff_unit_ms: 500,
///     max_backoff: Duration::from_secs(60),
/// };
///
/// assert_eq!(policy.delay_for_retry(1), Some(Duration::from_millis(1000)));
/// assert_eq!(policy.delay_for_retry(2), Some(Duration::from_millis(2000)));
/// assert_eq!(policy.delay_for_retry(4), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Growth factor between delays
    pub backoff_base: u64,
    /// Multiplier applied to every delay, in milliseconds
    pub backoff_unit_ms: u64,
    /// Ceiling for a single delay
    pub max_backoff: Duration,
}

impl RetryPolicy {
    fn strategy(&self) -> ExponentialBackoff {
        ExponentialBackoff::from_millis(self.backoff_base)
            .factor(self.backoff_unit_ms)
            .max_delay(self.max_backoff)
    }

    /// Every delay the policy allows, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        self.strategy().take(self.max_retries as usize)
    }

    /// Delay before the given retry, or `None` once the budget is spent.
    pub fn delay_for_retry(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        self.strategy().nth(retry as usize - 1)
    }

    /// Whether another retry is allowed after `retries_so_far`.
    pub fn allows(&self, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
    }
}
