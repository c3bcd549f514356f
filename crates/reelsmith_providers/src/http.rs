//! Generic HTTP job API client.

use crate::wire::{CreateJobRequest, CreateJobResponse, JobStatusResponse};
use async_trait::async_trait;
use reelsmith_core::PromptPayload;
use reelsmith_error::{ConfigError, HttpError, ProviderError, ProviderErrorKind, ReelsmithResult};
use reelsmith_interface::{FetchedMedia, MediaProvider, ProviderStatus};
use reelsmith_throttle::ProviderProfile;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Per-request timeout; the orchestrator's wait budget covers the job itself.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Assumed when the download is served as something other than media.
const DEFAULT_MIME_TYPE: &str = "video/mp4";

/// Client for a provider exposing `POST /jobs`, `GET /jobs/{id}` and a
/// downloadable result URL.
#[derive(Debug, Clone)]
pub struct HttpMediaProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpMediaProvider {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an HTTP error if the underlying client cannot be built.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> ReelsmithResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let name = name.into();
        debug!(provider = %name, base_url = %base_url, "Creating HTTP media provider");
        Ok(Self {
            name,
            base_url,
            api_key,
            client,
        })
    }

    /// Creates a client from a provider profile.
    ///
    /// The profile must name a `base_url`. When it names an `api_key_env`,
    /// that variable must be set.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a missing base URL or API key.
    pub fn from_profile(profile: &ProviderProfile) -> ReelsmithResult<Self> {
        let base_url = profile.base_url.clone().ok_or_else(|| {
            ConfigError::new(format!("Provider {} has no base_url", profile.name))
        })?;
        let api_key = match &profile.api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                ConfigError::new(format!(
                    "Provider {} needs the {} environment variable",
                    profile.name, var
                ))
            })?),
            None => None,
        };
        Self::new(profile.name.clone(), base_url, api_key)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ReelsmithResult<Response> {
        let response = self.authorized(request).send().await.map_err(|e| {
            error!(provider = %self.name, error = %e, "Provider request failed");
            ProviderError::new(ProviderErrorKind::Unavailable(e.to_string()))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(provider = %self.name, status = %status, body = %body, "Provider returned error");
        Err(ProviderError::new(ProviderErrorKind::from_status(status.as_u16(), body)).into())
    }
}

#[async_trait]
impl MediaProvider for HttpMediaProvider {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, payload), fields(provider = %self.name, segment_id = %payload.segment_id))]
    async fn submit(&self, payload: &PromptPayload) -> ReelsmithResult<String> {
        let url = format!("{}/jobs", self.base_url);
        let body = CreateJobRequest::from(payload);
        let response = self.send(self.client.post(&url).json(&body)).await?;

        let created: CreateJobResponse = response.json().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                "create job: {}",
                e
            )))
        })?;
        debug!(job_id = %created.id, "Provider accepted job");
        Ok(created.id)
    }

    #[instrument(skip(self), fields(provider = %self.name))]
    async fn poll(&self, job_id: &str) -> ReelsmithResult<ProviderStatus> {
        let url = format!("{}/jobs/{}", self.base_url, job_id);
        let response = self.send(self.client.get(&url)).await?;

        let body: JobStatusResponse = response.json().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                "job {} status: {}",
                job_id, e
            )))
        })?;
        Ok(body.into_status(job_id)?)
    }

    #[instrument(skip(self), fields(provider = %self.name))]
    async fn fetch(&self, locator: &str) -> ReelsmithResult<FetchedMedia> {
        let response = self.send(self.client.get(locator)).await?;
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|m| m.starts_with("video/") || m.starts_with("audio/"))
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        let bytes = response.bytes().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::Unavailable(format!(
                "download {}: {}",
                locator, e
            )))
        })?;
        debug!(size = bytes.len(), mime_type = %mime_type, "Downloaded result");
        Ok(FetchedMedia::new(bytes.to_vec(), mime_type))
    }
}
