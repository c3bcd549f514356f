//! Request and response bodies of the job API.

use reelsmith_core::PromptPayload;
use reelsmith_error::{ProviderError, ProviderErrorKind};
use reelsmith_interface::ProviderStatus;
use serde::{Deserialize, Serialize};

/// Body of `POST {base}/jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJobRequest {
    /// Composed prompt text
    pub prompt: String,
    /// Requested clip length in whole seconds
    pub seconds: u32,
    /// Things to avoid, when configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Caller reference echoed back by most services
    pub client_reference: String,
}

impl From<&PromptPayload> for CreateJobRequest {
    fn from(payload: &PromptPayload) -> Self {
        Self {
            prompt: payload.compose(),
            seconds: payload.requested_seconds,
            negative_prompt: payload.negative_prompt.clone(),
            client_reference: payload.segment_id.clone(),
        }
    }
}

/// Body returned by `POST {base}/jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJobResponse {
    /// Provider job id
    pub id: String,
}

/// Body returned by `GET {base}/jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Provider status word
    pub status: String,
    /// Download location once completed
    #[serde(default)]
    pub result_url: Option<String>,
    /// Provider explanation once failed
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusResponse {
    /// Maps the provider's status word onto [`ProviderStatus`].
    ///
    /// # Errors
    ///
    /// Returns [`ProviderErrorKind::InvalidResponse`] for an unknown status
    /// word or a completed job without a result URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelsmith_interface::ProviderStatus;
    /// use reelsmith_providers::JobStatusResponse;
    ///
    /// let body: JobStatusResponse =
    ///     serde_json::from_str(r#"{"status": "running"}"#).unwrap();
    /// assert_eq!(body.into_status("job-1").unwrap(), ProviderStatus::Pending);
    /// ```
    pub fn into_status(self, job_id: &str) -> Result<ProviderStatus, ProviderError> {
        match self.status.to_ascii_lowercase().as_str() {
            "pending" | "queued" | "running" | "in_progress" | "processing" => {
                Ok(ProviderStatus::Pending)
            }
            "completed" | "succeeded" => match self.result_url {
                Some(locator) if !locator.trim().is_empty() => {
                    Ok(ProviderStatus::Ready { locator })
                }
                _ => Err(ProviderError::new(ProviderErrorKind::InvalidResponse(
                    format!("job {} completed without a result_url", job_id),
                ))),
            },
            "failed" | "cancelled" | "canceled" => Ok(ProviderStatus::Failed {
                reason: self
                    .error
                    .unwrap_or_else(|| format!("job {} {}", job_id, self.status)),
            }),
            other => Err(ProviderError::new(ProviderErrorKind::InvalidResponse(
                format!("job {} has unknown status {:?}", job_id, other),
            ))),
        }
    }
}
