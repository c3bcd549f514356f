//! Capability-tagged provider profiles.
//!
//! A profile describes everything the orchestrator needs to know about one
//! generation provider: what it can produce, how hard it may be pushed, how
//! long its clips may be and how patiently it should be polled. A profile is
//! chosen once when a run starts and never swapped while the run executes.
//!
//! ```toml
//! [providers.veo]
//! capabilities = ["video", "audio"]
//! max_concurrent = 2
//! submit_cooldown_secs = 0.0
//! max_clip_seconds = 8.0
//! allowed_durations = [4, 6, 8]
//! ```

use crate::RetryPolicy;
use reelsmith_core::PlanningConfig;
use reelsmith_error::{ConfigError, ReelsmithResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// What a provider can generate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Video clips
    Video,
    /// Clips with a generated soundtrack
    Audio,
    /// Background music
    Music,
}

/// Limits and pacing for one generation provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderProfile {
    /// Provider name; filled from the configuration key when empty
    pub name: String,

    /// What the provider can generate
    pub capabilities: Vec<Capability>,

    /// Most jobs in flight at once
    pub max_concurrent: u32,

    /// Minimum time between two accepted submissions
    pub submit_cooldown_secs: f64,

    /// Longest clip the provider generates
    pub max_clip_seconds: f64,

    /// Clip lengths the provider accepts; empty means any whole second
    pub allowed_durations: Vec<u32>,

    /// Time between two status checks of one job
    pub poll_interval_secs: f64,

    /// Longest time a job may take from submission to result
    pub max_wait_secs: f64,

    /// Transient failures retried per job before giving up
    pub max_retries: u32,

    /// Growth factor between two retry delays
    pub backoff_base: u64,

    /// Multiplier, in milliseconds, applied to every retry delay
    pub backoff_unit_ms: u64,

    /// Ceiling for a single retry delay
    pub max_backoff_secs: f64,

    /// Clip length difference tolerated without a warning
    pub duration_tolerance_secs: f64,

    /// Optional submissions-per-minute quota
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submissions_per_minute: Option<u32>,

    /// Optional negative prompt sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Base URL of the provider's job API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Environment variable holding the provider's bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for ProviderProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            capabilities: vec![Capability::Video],
            max_concurrent: 2,
            submit_cooldown_secs: 0.0,
            max_clip_seconds: 8.0,
            allowed_durations: Vec::new(),
            poll_interval_secs: 10.0,
            max_wait_secs: 600.0,
            max_retries: 3,
            backoff_base: 2,
            backoff_unit_ms: 1000,
            max_backoff_secs: 60.0,
            duration_tolerance_secs: 0.5,
            submissions_per_minute: None,
            negative_prompt: None,
            base_url: None,
            api_key_env: None,
        }
    }
}

/// Converts configured seconds, treating unusable values as zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl ProviderProfile {
    /// Creates a profile with default limits.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the provider can generate the given kind of media.
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Time between two status checks.
    pub fn poll_interval(&self) -> Duration {
        seconds(self.poll_interval_secs)
    }

    /// Longest time a job may take.
    pub fn max_wait(&self) -> Duration {
        seconds(self.max_wait_secs)
    }

    /// Minimum time between accepted submissions.
    pub fn submit_cooldown(&self) -> Duration {
        seconds(self.submit_cooldown_secs)
    }

    /// Retry policy for transient provider failures.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base: self.backoff_base,
            backoff_unit_ms: self.backoff_unit_ms,
            max_backoff: seconds(self.max_backoff_secs),
        }
    }

    /// Planning limits with this provider's clip ceiling.
    pub fn planning_config(&self, base: &PlanningConfig) -> PlanningConfig {
        base.with_max_clip_seconds(self.max_clip_seconds)
    }

    /// Clip length to request for a planned target duration.
    ///
    /// Picks the smallest allowed duration that is at least the target, or
    /// the largest allowed duration when none is long enough. Without an
    /// allow-list the target is rounded up to whole seconds and capped at the
    /// provider's maximum.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelsmith_throttle::ProviderProfile;
    ///
    /// let mut profile = ProviderProfile::new("veo");
    /// profile.allowed_durations = vec![4, 6, 8];
    ///
    /// assert_eq!(profile.request_duration(3.2), 4);
    /// assert_eq!(profile.request_duration(6.0), 6);
    /// assert_eq!(profile.request_duration(9.5), 8);
    /// ```
    pub fn request_duration(&self, target_seconds: f64) -> u32 {
        if self.allowed_durations.is_empty() {
            let capped = target_seconds.min(self.max_clip_seconds).max(1.0);
            return capped.ceil() as u32;
        }

        let mut allowed = self.allowed_durations.clone();
        allowed.sort_unstable();
        allowed
            .iter()
            .copied()
            .find(|&d| f64::from(d) + 1e-9 >= target_seconds)
            .or_else(|| allowed.last().copied())
            .unwrap_or(1)
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first unusable field.
    pub fn validate(&self) -> ReelsmithResult<()> {
        let non_negative = [
            ("submit_cooldown_secs", self.submit_cooldown_secs),
            ("poll_interval_secs", self.poll_interval_secs),
            ("max_wait_secs", self.max_wait_secs),
            ("max_backoff_secs", self.max_backoff_secs),
            ("duration_tolerance_secs", self.duration_tolerance_secs),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::new(format!(
                    "provider {}: {} must be a non-negative number, got {}",
                    self.name, field, value
                ))
                .into());
            }
        }

        if !self.max_clip_seconds.is_finite() || self.max_clip_seconds <= 0.0 {
            return Err(ConfigError::new(format!(
                "provider {}: max_clip_seconds must be positive, got {}",
                self.name, self.max_clip_seconds
            ))
            .into());
        }
        if self.poll_interval_secs <= 0.0 {
            return Err(ConfigError::new(format!(
                "provider {}: poll_interval_secs must be positive, got {}",
                self.name, self.poll_interval_secs
            ))
            .into());
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::new(format!(
                "provider {}: max_concurrent must be at least 1",
                self.name
            ))
            .into());
        }
        if self.backoff_base < 2 || self.backoff_unit_ms == 0 {
            return Err(ConfigError::new(format!(
                "provider {}: backoff_base must be at least 2 and backoff_unit_ms at least 1",
                self.name
            ))
            .into());
        }
        if self.allowed_durations.contains(&0) {
            return Err(ConfigError::new(format!(
                "provider {}: allowed_durations must be positive",
                self.name
            ))
            .into());
        }
        if let Some(&longest) = self.allowed_durations.iter().max() {
            if f64::from(longest) + 1e-9 < self.max_clip_seconds {
                return Err(ConfigError::new(format!(
                    "provider {}: longest allowed duration {}s is shorter than max_clip_seconds {}",
                    self.name, longest, self.max_clip_seconds
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Returns a copy with dispatch overrides applied.
    ///
    /// Recognized keys: `max_concurrent`, `submit_cooldown_secs`,
    /// `poll_interval_secs`, `max_wait_secs`, `max_retries`. Unknown keys are
    /// logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a value does not parse or the patched
    /// profile fails validation.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, String>) -> ReelsmithResult<Self> {
        let mut profile = self.clone();
        for (key, value) in overrides {
            match key.as_str() {
                "max_concurrent" => profile.max_concurrent = parse(key, value)?,
                "submit_cooldown_secs" => profile.submit_cooldown_secs = parse(key, value)?,
                "poll_interval_secs" => profile.poll_interval_secs = parse(key, value)?,
                "max_wait_secs" => profile.max_wait_secs = parse(key, value)?,
                "max_retries" => profile.max_retries = parse(key, value)?,
                _ => {
                    warn!(provider = %self.name, key = %key, "Ignoring unknown provider override");
                    continue;
                }
            }
            debug!(provider = %self.name, key = %key, value = %value, "Applied provider override");
        }
        profile.validate()?;
        Ok(profile)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> ReelsmithResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::new(format!("Invalid value {:?} for provider override {}", value, key)).into()
    })
}
