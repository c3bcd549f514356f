//! Provider profiles, submission throttling and retry policy.
//!
//! Generation providers are slow, rate-limited and asynchronous. This crate
//! keeps the orchestrator within each provider's limits:
//!
//! - [`ProviderProfile`]: capability-tagged limits loaded from configuration
//! - [`SubmissionThrottle`]: concurrency ceiling plus submission cooldown
//! - [`RetryPolicy`]: bounded exponential backoff for transient failures
//! - [`ReelsmithConfig`]: layered TOML configuration holding the profiles

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod profile;
mod retry;
mod throttle;

pub use config::ReelsmithConfig;
pub use profile::{Capability, ProviderProfile};
pub use retry::RetryPolicy;
pub use throttle::{SubmissionThrottle, SubmissionTicket, ThrottleSlot};
