//! Turns a run's artifacts into one muxed video.

use crate::captions::CaptionRenderer;
use crate::naming::sanitize_output_name;
use crate::timeline::{fit_clip, narration_windows};
use reelsmith_core::{AssemblyConfig, ClipArtifact, RunInputs, RunState};
use reelsmith_error::{AssemblyError, AssemblyErrorKind, ReelsmithError, ReelsmithResult};
use reelsmith_interface::{ClipCut, ClipStorage, MediaProbe, MuxPlan, Muxer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Builds and executes the mux plan for a run.
///
/// The assembler fails closed: a planned segment without an artifact stops it
/// before any file is touched, and no placeholder clip is ever substituted.
#[derive(Clone)]
pub struct Assembler {
    config: AssemblyConfig,
    storage: Arc<dyn ClipStorage>,
    probe: Arc<dyn MediaProbe>,
    muxer: Arc<dyn Muxer>,
}

impl std::fmt::Debug for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Assembler {
    /// Creates an assembler.
    pub fn new(
        config: AssemblyConfig,
        storage: Arc<dyn ClipStorage>,
        probe: Arc<dyn MediaProbe>,
        muxer: Arc<dyn Muxer>,
    ) -> Self {
        Self {
            config,
            storage,
            probe,
            muxer,
        }
    }

    /// Settings in use.
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Checks preconditions, writes captions, and returns the mux plan.
    ///
    /// # Errors
    ///
    /// - [`AssemblyErrorKind::NoSegments`] when the run has no plan
    /// - [`AssemblyErrorKind::MissingArtifact`] for the first segment without a clip
    /// - an alignment error when the word timings are defective or do not
    ///   cover the narration
    #[tracing::instrument(skip_all, fields(run_id = %run.run_id()))]
    pub async fn prepare(&self, run: &RunState, inputs: &RunInputs) -> ReelsmithResult<MuxPlan> {
        let artifacts = ordered_artifacts(run)?;

        let narration_seconds = self.probe.duration_seconds(&inputs.narration).await?;
        let windows = narration_windows(
            run.segments(),
            inputs.alignment.as_ref(),
            narration_seconds,
        )?;

        let mut clips = Vec::with_capacity(artifacts.len());
        for (artifact, window) in artifacts.into_iter().zip(windows) {
            let source = self.storage.resolve(artifact.locator()).await?;
            let source_seconds = *artifact.actual_duration_seconds();
            let fit = fit_clip(source_seconds, window, *self.config.fit_tolerance_seconds());
            debug!(
                segment_id = %artifact.segment_id(),
                source_seconds,
                window_seconds = window,
                fit = ?fit,
                "Fitted clip to narration window"
            );
            clips.push(ClipCut {
                segment_id: artifact.segment_id().clone(),
                source,
                source_seconds,
                window_seconds: window,
                fit,
            });
        }

        let name = output_stem(run, inputs);
        let subtitles = self.write_captions(run, inputs, &name).await?;
        let output = self.config.output_dir().join(format!("{}.mp4", name));

        Ok(MuxPlan {
            clips,
            narration: inputs.narration.clone(),
            narration_seconds,
            music: inputs.music.clone(),
            music_level: *self.config.music_level(),
            subtitles,
            fonts_dir: self.config.fonts_dir().clone(),
            encoder: self.config.encoder().clone(),
            output,
        })
    }

    /// Prepares the mux plan and hands it to the muxer.
    ///
    /// # Errors
    ///
    /// Returns the first precondition failure from [`Assembler::prepare`] or
    /// the muxer's error.
    #[tracing::instrument(skip_all, fields(run_id = %run.run_id()))]
    pub async fn assemble(&self, run: &RunState, inputs: &RunInputs) -> ReelsmithResult<PathBuf> {
        let plan = self.prepare(run, inputs).await?;
        let output = self.muxer.mux(&plan).await?;
        info!(output = %output.display(), clips = plan.clips.len(), "Assembled run");
        Ok(output)
    }

    async fn write_captions(
        &self,
        run: &RunState,
        inputs: &RunInputs,
        name: &str,
    ) -> ReelsmithResult<Option<PathBuf>> {
        let renderer = CaptionRenderer::new(self.config.captions().clone());
        let script = match (&inputs.alignment, &inputs.caption_cues) {
            (Some(track), _) => renderer.render_alignment(track, run.segments())?,
            (None, Some(cues)) => renderer.render_cues(cues)?,
            (None, None) => {
                debug!("No word timing or cues, captions omitted");
                return Ok(None);
            }
        };

        let path = self.config.output_dir().join(format!("{}.ass", name));
        write_text(&path, &script).await?;
        Ok(Some(path))
    }
}

/// Artifacts in plan order, or the first gap.
fn ordered_artifacts(run: &RunState) -> ReelsmithResult<Vec<&ClipArtifact>> {
    if run.segments().is_empty() {
        return Err(AssemblyError::new(AssemblyErrorKind::NoSegments).into());
    }
    run.segments()
        .iter()
        .map(|segment| {
            run.artifacts().get(segment.id()).ok_or_else(|| {
                ReelsmithError::from(AssemblyError::new(AssemblyErrorKind::MissingArtifact(
                    segment.id().clone(),
                )))
            })
        })
        .collect()
}

fn output_stem(run: &RunState, inputs: &RunInputs) -> String {
    let requested = inputs
        .output_name
        .clone()
        .unwrap_or_else(|| format!("reelsmith-{}", run.run_id().simple()));
    let requested = requested
        .strip_suffix(".mp4")
        .map(str::to_string)
        .unwrap_or(requested);
    sanitize_output_name(&requested)
}

async fn write_text(path: &Path, contents: &str) -> ReelsmithResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AssemblyError::new(AssemblyErrorKind::Captions(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }
    tokio::fs::write(path, contents).await.map_err(|e| {
        AssemblyError::new(AssemblyErrorKind::Captions(format!("{}: {}", path.display(), e)))
    })?;
    Ok(())
}
