//! Clip artifacts: durable results of finished generation jobs.

use crate::{GenerationJob, GenerationStatus};
use chrono::{DateTime, Utc};
use reelsmith_error::{RunError, RunErrorKind};
use serde::{Deserialize, Serialize};

/// Where a payload landed in clip storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMedia {
    /// Storage locator (a filesystem path for the local backend)
    pub locator: String,
    /// SHA-256 of the payload, lowercase hex
    pub checksum: String,
    /// Payload size
    pub size_bytes: u64,
    /// MIME type reported by the provider
    pub mime_type: String,
}

/// The resolved output of a READY generation job.
///
/// Artifacts have no mutators. The only constructor requires a READY job, so
/// an artifact cannot exist for a segment whose generation did not finish.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{ClipArtifact, GenerationJob, StoredMedia};
///
/// let mut job = GenerationJob::new("seg-001");
/// job.record_submission("prov-1").unwrap();
/// job.mark_ready("remote://clip").unwrap();
///
/// let stored = StoredMedia {
///     locator: "/media/video/ab/cd/abcd".to_string(),
///     checksum: "abcd".to_string(),
///     size_bytes: 1024,
///     mime_type: "video/mp4".to_string(),
/// };
/// let artifact = ClipArtifact::from_ready_job(&job, stored, 8.1).unwrap();
/// assert_eq!(artifact.segment_id(), "seg-001");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ClipArtifact {
    /// Segment this clip belongs to.
    segment_id: String,
    /// Provider job that produced it.
    provider_job_id: String,
    /// Storage locator of the payload.
    locator: String,
    /// SHA-256 of the payload.
    checksum: String,
    /// Payload size in bytes.
    size_bytes: u64,
    /// MIME type of the payload.
    mime_type: String,
    /// Measured clip length.
    actual_duration_seconds: f64,
    /// When the artifact was recorded.
    created_at: DateTime<Utc>,
}

impl ClipArtifact {
    /// Creates an artifact from a READY job and its stored payload.
    ///
    /// # Errors
    ///
    /// Returns [`RunErrorKind::JobNotReady`] unless the job is READY and was
    /// acknowledged by the provider.
    pub fn from_ready_job(
        job: &GenerationJob,
        stored: StoredMedia,
        actual_duration_seconds: f64,
    ) -> Result<Self, RunError> {
        let provider_job_id = match (job.status(), job.provider_job_id()) {
            (GenerationStatus::Ready, Some(id)) => id.clone(),
            _ => {
                return Err(RunError::new(RunErrorKind::JobNotReady(
                    job.segment_id().clone(),
                )));
            }
        };

        Ok(Self {
            segment_id: job.segment_id().clone(),
            provider_job_id,
            locator: stored.locator,
            checksum: stored.checksum,
            size_bytes: stored.size_bytes,
            mime_type: stored.mime_type,
            actual_duration_seconds,
            created_at: Utc::now(),
        })
    }
}
