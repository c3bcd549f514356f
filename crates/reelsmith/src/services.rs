//! Production wiring of the run collaborators.

use reelsmith_assembly::{FfmpegMuxer, FfprobeProbe};
use reelsmith_error::ReelsmithResult;
use reelsmith_orchestrator::RunServices;
use reelsmith_providers::HttpMediaProvider;
use reelsmith_storage::{FileSystemClipStorage, FileSystemRunStore};
use reelsmith_throttle::{ProviderProfile, ReelsmithConfig};
use std::sync::Arc;
use tracing::debug;

/// Builds services backed by the local filesystem, `ffmpeg`, and the
/// profile's HTTP job API.
///
/// # Errors
///
/// Returns a configuration error when the profile lacks a base URL or its API
/// key variable is unset, and a storage error when the configured
/// directories cannot be created.
pub fn local_services(
    config: &ReelsmithConfig,
    profile: &ProviderProfile,
) -> ReelsmithResult<RunServices> {
    debug!(
        provider = %profile.name,
        storage_dir = %config.storage_dir.display(),
        runs_dir = %config.runs_dir.display(),
        "Wiring local services"
    );
    Ok(RunServices {
        provider: Arc::new(HttpMediaProvider::from_profile(profile)?),
        store: Arc::new(FileSystemRunStore::new(&config.runs_dir)?),
        storage: Arc::new(FileSystemClipStorage::new(&config.storage_dir)?),
        probe: Arc::new(FfprobeProbe::default()),
        muxer: Arc::new(FfmpegMuxer::default()),
    })
}
