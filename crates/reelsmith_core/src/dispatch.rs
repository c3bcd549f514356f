//! Dispatch records handed in by an external scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What an external scheduler hands the pipeline to start a run.
///
/// Deduplication of already-dispatched records is the scheduler's business.
///
/// # Examples
///
/// ```
/// use reelsmith_core::DispatchRecord;
///
/// let record = DispatchRecord::now("https://news.example/story")
///     .with_override("max_concurrent", "1");
/// assert_eq!(record.provider_overrides().get("max_concurrent").map(String::as_str), Some("1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct DispatchRecord {
    /// Reference to the source article (usually a URL).
    source_article_ref: String,
    /// When the scheduler wanted the run to start.
    scheduled_time: DateTime<Utc>,
    /// Provider profile fields to override for this run.
    #[serde(default)]
    provider_overrides: BTreeMap<String, String>,
}

impl DispatchRecord {
    /// Creates a record.
    pub fn new(
        source_article_ref: impl Into<String>,
        scheduled_time: DateTime<Utc>,
        provider_overrides: BTreeMap<String, String>,
    ) -> Self {
        Self {
            source_article_ref: source_article_ref.into(),
            scheduled_time,
            provider_overrides,
        }
    }

    /// Creates a record scheduled for the current instant with no overrides.
    pub fn now(source_article_ref: impl Into<String>) -> Self {
        Self::new(source_article_ref, Utc::now(), BTreeMap::new())
    }

    /// Adds one provider override.
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.provider_overrides.insert(key.into(), value.into());
        self
    }
}
