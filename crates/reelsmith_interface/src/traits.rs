//! Trait definitions for the pipeline's external collaborators.

use crate::{FetchedMedia, MuxPlan, ProviderStatus};
use async_trait::async_trait;
use reelsmith_core::{PromptPayload, RunState, StoredMedia};
use reelsmith_error::ReelsmithResult;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// An asynchronous clip generation service.
///
/// Submissions return immediately with a provider job id; the result is
/// discovered by polling. Errors should be [`reelsmith_error::ProviderError`]s
/// so the orchestrator can tell transient failures from rejections.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Provider name, matching its configuration profile.
    fn name(&self) -> &str;

    /// Submit a generation request and return the provider's job id.
    async fn submit(&self, payload: &PromptPayload) -> ReelsmithResult<String>;

    /// Check the state of a submitted job.
    async fn poll(&self, provider_job_id: &str) -> ReelsmithResult<ProviderStatus>;

    /// Download a finished result.
    async fn fetch(&self, locator: &str) -> ReelsmithResult<FetchedMedia>;
}

/// Durable storage for run state.
///
/// `save` must be atomic: a reader sees either the previous state or the new
/// one, never a partial write.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persist the run, replacing any earlier state.
    async fn save(&self, run: &RunState) -> ReelsmithResult<()>;

    /// Load a run by id.
    async fn load(&self, run_id: Uuid) -> ReelsmithResult<RunState>;

    /// Ids of every stored run.
    async fn list(&self) -> ReelsmithResult<Vec<Uuid>>;
}

/// Content-addressed storage for generated clips.
#[async_trait]
pub trait ClipStorage: Send + Sync {
    /// Store bytes; identical content yields the identical locator.
    async fn store(&self, data: &[u8], mime_type: &str) -> ReelsmithResult<StoredMedia>;

    /// Read stored bytes back, verifying their checksum.
    async fn retrieve(&self, media: &StoredMedia) -> ReelsmithResult<Vec<u8>>;

    /// Local file for a locator, failing if it no longer exists.
    async fn resolve(&self, locator: &str) -> ReelsmithResult<PathBuf>;
}

/// Measures media files.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Playback length of an audio or video file in seconds.
    async fn duration_seconds(&self, path: &Path) -> ReelsmithResult<f64>;
}

/// Renders a [`MuxPlan`] into a finished video.
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Render the plan and return the written file.
    async fn mux(&self, plan: &MuxPlan) -> ReelsmithResult<PathBuf>;
}
