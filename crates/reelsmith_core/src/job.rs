//! Generation jobs: one outstanding provider request per segment.

use chrono::{DateTime, Utc};
use reelsmith_error::{RunError, RunErrorKind};
use serde::{Deserialize, Serialize};

/// Lifecycle of one generation request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    /// Handed to the provider (or being handed over)
    Submitted,
    /// Provider accepted the job and is being polled
    Polling,
    /// Provider finished; a result locator is available
    Ready,
    /// Job ended without a usable result
    Failed,
}

impl GenerationStatus {
    /// Whether a worker currently owns this job.
    pub fn is_active(&self) -> bool {
        matches!(self, GenerationStatus::Submitted | GenerationStatus::Polling)
    }

    /// Whether the job can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Ready | GenerationStatus::Failed)
    }
}

/// Why a generation job ended FAILED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum FailureReason {
    /// Maximum wait elapsed before the provider finished
    #[display("timeout")]
    Timeout,
    /// Run was cancelled while the job was in flight
    #[display("cancelled")]
    Cancelled,
    /// Provider refused the request
    #[display("rejected: {}", message)]
    Rejected {
        /// Provider explanation
        message: String,
    },
    /// Transient errors outlasted the retry budget
    #[display("retries exhausted: {}", message)]
    RetriesExhausted {
        /// Last transient error
        message: String,
    },
    /// Provider reported the job failed
    #[display("provider failed: {}", message)]
    ProviderFailed {
        /// Provider explanation
        message: String,
    },
    /// Result could not be fetched or stored
    #[display("fetch failed: {}", message)]
    Fetch {
        /// Underlying error
        message: String,
    },
    /// Process stopped before the provider acknowledged the job
    #[display("interrupted")]
    Interrupted,
}

impl FailureReason {
    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::Cancelled => "cancelled",
            FailureReason::Rejected { .. } => "provider_rejected",
            FailureReason::RetriesExhausted { .. } => "retries_exhausted",
            FailureReason::ProviderFailed { .. } => "provider_failed",
            FailureReason::Fetch { .. } => "fetch_failed",
            FailureReason::Interrupted => "interrupted",
        }
    }
}

/// One outstanding request to a media provider for one segment.
///
/// Jobs only move forward: `SUBMITTED → POLLING → READY | FAILED`. Once
/// terminal, every mutator refuses to change them.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{GenerationJob, GenerationStatus};
///
/// let mut job = GenerationJob::new("seg-001");
/// job.record_submission("prov-42").unwrap();
/// job.record_poll().unwrap();
/// job.mark_ready("https://cdn.example/clip.mp4").unwrap();
///
/// assert_eq!(*job.status(), GenerationStatus::Ready);
/// assert!(job.mark_ready("again").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GenerationJob {
    /// Segment this job generates.
    segment_id: String,
    /// Id assigned by the provider once it accepts the job.
    provider_job_id: Option<String>,
    /// Current status.
    status: GenerationStatus,
    /// When the provider accepted the job.
    submitted_at: Option<DateTime<Utc>>,
    /// When the provider was last asked for status.
    last_polled_at: Option<DateTime<Utc>>,
    /// Transient failures retried so far.
    retry_count: u32,
    /// Where the finished media can be fetched.
    result_locator: Option<String>,
    /// Set once the job ends FAILED.
    failure: Option<FailureReason>,
}

impl GenerationJob {
    /// Creates a job that is about to be submitted.
    pub fn new(segment_id: impl Into<String>) -> Self {
        Self {
            segment_id: segment_id.into(),
            provider_job_id: None,
            status: GenerationStatus::Submitted,
            submitted_at: None,
            last_polled_at: None,
            retry_count: 0,
            result_locator: None,
            failure: None,
        }
    }

    fn ensure_open(&self, to: GenerationStatus) -> Result<(), RunError> {
        if self.status.is_terminal() {
            return Err(RunError::new(RunErrorKind::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            }));
        }
        Ok(())
    }

    /// Records that the provider accepted the job.
    pub fn record_submission(&mut self, provider_job_id: impl Into<String>) -> Result<(), RunError> {
        self.ensure_open(GenerationStatus::Submitted)?;
        self.provider_job_id = Some(provider_job_id.into());
        self.submitted_at = Some(Utc::now());
        self.status = GenerationStatus::Submitted;
        Ok(())
    }

    /// Records one status check.
    pub fn record_poll(&mut self) -> Result<(), RunError> {
        self.ensure_open(GenerationStatus::Polling)?;
        self.last_polled_at = Some(Utc::now());
        self.status = GenerationStatus::Polling;
        Ok(())
    }

    /// Counts one more transient failure and returns the new count.
    pub fn record_retry(&mut self) -> Result<u32, RunError> {
        self.ensure_open(self.status)?;
        self.retry_count += 1;
        Ok(self.retry_count)
    }

    /// Marks the job READY with the locator of its result.
    pub fn mark_ready(&mut self, locator: impl Into<String>) -> Result<(), RunError> {
        self.ensure_open(GenerationStatus::Ready)?;
        self.result_locator = Some(locator.into());
        self.status = GenerationStatus::Ready;
        Ok(())
    }

    /// Marks the job FAILED.
    pub fn mark_failed(&mut self, reason: FailureReason) -> Result<(), RunError> {
        self.ensure_open(GenerationStatus::Failed)?;
        self.failure = Some(reason);
        self.status = GenerationStatus::Failed;
        Ok(())
    }

    /// Whether the provider has acknowledged the job.
    pub fn is_acknowledged(&self) -> bool {
        self.provider_job_id.is_some()
    }
}
