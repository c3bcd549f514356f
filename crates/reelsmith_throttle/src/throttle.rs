//! Submission throttle using Tokio primitives and governor.
//!
//! Two independent limits guard every provider:
//! - a concurrency ceiling, held for the whole life of a job ([`ThrottleSlot`])
//! - a cooldown since the last accepted submission, enforced through a single
//!   gate that only one submitter can hold at a time ([`SubmissionTicket`])
//!
//! An optional submissions-per-minute quota is checked with governor (GCRA)
//! before the cooldown gate. A run with its own limits nests them inside the
//! provider's shared ones, so the shared limits always hold.

use crate::ProviderProfile;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use reelsmith_error::{ReelsmithResult, RunError, RunErrorKind};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::{debug, instrument};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// One set of limits: slots, cooldown gate and optional quota.
struct Limits {
    provider: String,
    max_concurrent: usize,
    cooldown: Duration,
    slots: Arc<Semaphore>,
    last_accepted: Arc<Mutex<Option<Instant>>>,
    quota: Option<DirectRateLimiter>,
}

impl Limits {
    fn new(profile: &ProviderProfile) -> Self {
        let max_concurrent = profile.max_concurrent.max(1) as usize;
        let quota = profile
            .submissions_per_minute
            .and_then(NonZeroU32::new)
            .map(|n| GovernorRateLimiter::direct(Quota::per_minute(n)));

        Self {
            provider: profile.name.clone(),
            max_concurrent,
            cooldown: profile.submit_cooldown(),
            slots: Arc::new(Semaphore::new(max_concurrent)),
            last_accepted: Arc::new(Mutex::new(None)),
            quota,
        }
    }

    async fn acquire(&self) -> ReelsmithResult<OwnedSemaphorePermit> {
        self.slots.clone().acquire_owned().await.map_err(|_| {
            RunError::new(RunErrorKind::Cancelled(format!(
                "{} throttle closed",
                self.provider
            )))
            .into()
        })
    }

    async fn admit(&self) -> OwnedMutexGuard<Option<Instant>> {
        if let Some(quota) = &self.quota {
            quota.until_ready().await;
        }

        let gate = self.last_accepted.clone().lock_owned().await;
        if let Some(last) = *gate {
            let remaining = self.cooldown.saturating_sub(last.elapsed());
            if !remaining.is_zero() {
                debug!(wait_ms = remaining.as_millis() as u64, "Waiting out submission cooldown");
                tokio::time::sleep(remaining).await;
            }
        }
        gate
    }
}

/// Per-provider concurrency ceiling and submission cooldown.
///
/// Cloning shares the same limits, so every task of a run can hold a clone.
/// [`SubmissionThrottle::nested`] derives a throttle with its own, usually
/// stricter, limits that still passes through every limit of its parent.
///
/// # Example
///
/// ```rust,ignore
/// let throttle = SubmissionThrottle::new(&profile);
///
/// let slot = throttle.acquire_slot().await?;   // held until the job ends
/// let ticket = throttle.admit().await;         // waits out the cooldown
/// let id = provider.submit(&payload).await?;
/// ticket.accepted();                           // starts the next cooldown
/// ```
#[derive(Clone)]
pub struct SubmissionThrottle {
    limits: Arc<Limits>,
    /// Enclosing limits, innermost first.
    outer: Vec<Arc<Limits>>,
}

impl SubmissionThrottle {
    /// Creates a throttle from a provider profile.
    pub fn new(profile: &ProviderProfile) -> Self {
        Self {
            limits: Arc::new(Limits::new(profile)),
            outer: Vec::new(),
        }
    }

    /// Creates a throttle with the profile's limits inside this one's.
    ///
    /// A slot or submission from the nested throttle also takes one here, so
    /// the nested limits can tighten the shared ones but never loosen them.
    pub fn nested(&self, profile: &ProviderProfile) -> Self {
        let mut outer = Vec::with_capacity(self.outer.len() + 1);
        outer.push(self.limits.clone());
        outer.extend(self.outer.iter().cloned());
        Self {
            limits: Arc::new(Limits::new(profile)),
            outer,
        }
    }

    /// Provider this throttle guards.
    pub fn provider(&self) -> &str {
        &self.limits.provider
    }

    /// Concurrency ceiling in force, counting enclosing limits.
    pub fn max_concurrent(&self) -> usize {
        self.outer
            .iter()
            .map(|l| l.max_concurrent)
            .fold(self.limits.max_concurrent, usize::min)
    }

    /// Cooldown between accepted submissions, counting enclosing limits.
    pub fn cooldown(&self) -> Duration {
        self.outer
            .iter()
            .map(|l| l.cooldown)
            .fold(self.limits.cooldown, Duration::max)
    }

    /// Slots currently free at this level.
    pub fn available_slots(&self) -> usize {
        self.limits.slots.available_permits()
    }

    /// Waits for a concurrency slot at every level.
    ///
    /// Levels are taken innermost first, so waiting on this throttle's own
    /// ceiling never holds a shared slot.
    ///
    /// # Errors
    ///
    /// Fails only after [`SubmissionThrottle::close`].
    #[instrument(skip(self), fields(provider = %self.limits.provider))]
    pub async fn acquire_slot(&self) -> ReelsmithResult<ThrottleSlot> {
        let mut permits = Vec::with_capacity(self.outer.len() + 1);
        permits.push(self.limits.acquire().await?);
        for limits in &self.outer {
            permits.push(limits.acquire().await?);
        }
        debug!(available = self.available_slots(), "Acquired throttle slot");
        Ok(ThrottleSlot { _permits: permits })
    }

    /// Waits until a submission may be sent and returns the gates.
    ///
    /// The returned ticket holds the cooldown gate of every level, so no
    /// other submitter passes until it is consumed or dropped.
    #[instrument(skip(self), fields(provider = %self.limits.provider))]
    pub async fn admit(&self) -> SubmissionTicket {
        let mut gates = Vec::with_capacity(self.outer.len() + 1);
        gates.push(self.limits.admit().await);
        for limits in &self.outer {
            gates.push(limits.admit().await);
        }
        SubmissionTicket { gates }
    }

    /// Time of the last accepted submission through this throttle.
    pub async fn last_accepted(&self) -> Option<Instant> {
        *self.limits.last_accepted.lock().await
    }

    /// Refuses further slot requests at this level; waiters fail immediately.
    pub fn close(&self) {
        self.limits.slots.close();
    }
}

impl std::fmt::Debug for SubmissionThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionThrottle")
            .field("provider", &self.limits.provider)
            .field("max_concurrent", &self.limits.max_concurrent)
            .field("cooldown", &self.limits.cooldown)
            .field("available", &self.available_slots())
            .field("quota", &self.limits.quota.is_some())
            .field("nesting", &self.outer.len())
            .finish()
    }
}

/// Held concurrency slots; released on drop.
#[derive(Debug)]
pub struct ThrottleSlot {
    _permits: Vec<OwnedSemaphorePermit>,
}

/// Exclusive right to submit one request.
///
/// Call [`SubmissionTicket::accepted`] once the provider accepts the request;
/// dropping the ticket without it leaves the cooldown clocks untouched.
#[derive(Debug)]
pub struct SubmissionTicket {
    gates: Vec<OwnedMutexGuard<Option<Instant>>>,
}

impl SubmissionTicket {
    /// Records an accepted submission and releases the gates.
    pub fn accepted(mut self) {
        let now = Instant::now();
        for gate in &mut self.gates {
            **gate = Some(now);
        }
    }
}
