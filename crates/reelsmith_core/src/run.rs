//! Run state: the full lifecycle record of one article-to-video run.

use crate::{ClipArtifact, ClipSegment, DispatchRecord, GenerationJob, RunInputs};
use chrono::{DateTime, Utc};
use reelsmith_error::{RunError, RunErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Longest failure message kept on a run record.
pub const MAX_FAILURE_MESSAGE_CHARS: usize = 400;

/// Overall status of a run.
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
pub enum RunStatus {
    /// Accepted, not yet started
    Pending,
    /// Awaiting a worker slot
    Queued,
    /// Planning, generation, or assembly in progress
    Running,
    /// Output produced
    Completed,
    /// Stopped on a fatal error; reopenable
    Failed,
}

impl RunStatus {
    /// Whether moving from `self` to `to` is allowed.
    ///
    /// Transitions only move forward, except `FAILED → RUNNING` on reopen.
    /// `RUNNING → RUNNING` is allowed so that re-entry after a crash is
    /// idempotent.
    pub fn can_transition_to(&self, to: RunStatus) -> bool {
        use RunStatus::*;
        matches!(
            (self, to),
            (Pending, Queued)
                | (Pending, Failed)
                | (Queued, Running)
                | (Queued, Failed)
                | (Running, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Failed, Running)
        )
    }

    /// Whether the run has stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Pipeline stage a failure is attributed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Chunk planning
    Planning,
    /// Media generation
    Generation,
    /// Final assembly
    Assembly,
}

/// Completion timestamps for each stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageMarkers {
    /// Segments were planned
    pub planned_at: Option<DateTime<Utc>>,
    /// Every segment has an artifact
    pub media_completed_at: Option<DateTime<Utc>>,
    /// Final output was produced
    pub assembled_at: Option<DateTime<Utc>>,
}

/// The first fatal failure of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct RunFailure {
    /// Stage that failed.
    stage: Stage,
    /// Segment that failed, when the failure belongs to one.
    segment_id: Option<String>,
    /// Machine-readable reason.
    reason_code: String,
    /// Human-readable detail, truncated.
    message: String,
    /// When the failure was recorded.
    at: DateTime<Utc>,
}

/// One recorded status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// Status before the change; `None` on creation
    pub from: Option<RunStatus>,
    /// Status after the change
    pub to: RunStatus,
    /// When it happened
    pub at: DateTime<Utc>,
}

/// The full job lifecycle for one article-to-video run.
///
/// A run owns its segments, jobs, and artifacts. Artifact presence is the
/// only record of finished work; resumption derives everything else from it.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{DispatchRecord, RunState, RunStatus};
///
/// let mut run = RunState::new(DispatchRecord::now("https://news.example/a"), "veo");
/// run.transition(RunStatus::Queued).unwrap();
/// run.transition(RunStatus::Running).unwrap();
/// assert!(run.transition(RunStatus::Pending).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct RunState {
    /// Run identifier.
    run_id: Uuid,
    /// What started the run.
    dispatch: DispatchRecord,
    /// Provider profile selected at run start.
    provider: String,
    /// Script and media inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inputs: Option<RunInputs>,
    /// Overall status.
    status: RunStatus,
    /// Planned segments in order; empty until planning finishes.
    segments: Vec<ClipSegment>,
    /// Latest job per segment id.
    jobs: BTreeMap<String, GenerationJob>,
    /// Artifacts per segment id.
    artifacts: BTreeMap<String, ClipArtifact>,
    /// Stage completion markers.
    stages: StageMarkers,
    /// First fatal failure.
    failure: Option<RunFailure>,
    /// Locator of the final video.
    output: Option<String>,
    /// Every status change.
    history: Vec<StatusTransition>,
    /// Creation time.
    created_at: DateTime<Utc>,
    /// Last modification time.
    updated_at: DateTime<Utc>,
}

impl RunState {
    /// Creates a PENDING run.
    pub fn new(dispatch: DispatchRecord, provider: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            dispatch,
            provider: provider.into(),
            inputs: None,
            status: RunStatus::Pending,
            segments: Vec::new(),
            jobs: BTreeMap::new(),
            artifacts: BTreeMap::new(),
            stages: StageMarkers::default(),
            failure: None,
            output: None,
            history: vec![StatusTransition {
                from: None,
                to: RunStatus::Pending,
                at: now,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Attaches the run's script and media inputs.
    pub fn set_inputs(&mut self, inputs: RunInputs) {
        self.inputs = Some(inputs);
        self.touch();
    }

    /// Moves the run to a new status.
    ///
    /// # Errors
    ///
    /// Returns [`RunErrorKind::InvalidTransition`] for disallowed moves.
    pub fn transition(&mut self, to: RunStatus) -> Result<(), RunError> {
        if !self.status.can_transition_to(to) {
            return Err(RunError::new(RunErrorKind::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            }));
        }
        if self.status == to {
            debug!(run_id = %self.run_id, status = %to, "Run re-entered current status");
            return Ok(());
        }

        info!(run_id = %self.run_id, from = %self.status, to = %to, "Run status changed");
        self.history.push(StatusTransition {
            from: Some(self.status),
            to,
            at: Utc::now(),
        });
        self.status = to;
        self.touch();
        Ok(())
    }

    /// Reopens a FAILED run. The previous failure is cleared so a new one
    /// can be recorded; artifacts are kept.
    pub fn reopen(&mut self) -> Result<(), RunError> {
        if self.status != RunStatus::Failed {
            return Err(RunError::new(RunErrorKind::InvalidTransition {
                from: self.status.to_string(),
                to: RunStatus::Running.to_string(),
            }));
        }
        self.transition(RunStatus::Running)?;
        self.failure = None;
        Ok(())
    }

    /// Stores the plan. Planning happens once per run; a second call is ignored.
    pub fn set_plan(&mut self, segments: Vec<ClipSegment>) -> bool {
        if !self.segments.is_empty() {
            debug!(run_id = %self.run_id, "Plan already recorded, keeping existing segments");
            return false;
        }
        self.segments = segments;
        self.stages.planned_at = Some(Utc::now());
        self.touch();
        true
    }

    /// Segments with no artifact, in plan order.
    pub fn missing_segments(&self) -> Vec<&ClipSegment> {
        self.segments
            .iter()
            .filter(|s| !self.artifacts.contains_key(s.id()))
            .collect()
    }

    /// Looks up a planned segment.
    pub fn segment(&self, segment_id: &str) -> Option<&ClipSegment> {
        self.segments.iter().find(|s| s.id() == segment_id)
    }

    /// Whether every planned segment has an artifact.
    pub fn is_media_complete(&self) -> bool {
        !self.segments.is_empty() && self.missing_segments().is_empty()
    }

    /// Checks that a new job may start for the segment.
    ///
    /// # Errors
    ///
    /// - [`RunErrorKind::UnknownSegment`] if the segment is not planned
    /// - [`RunErrorKind::ArtifactExists`] if the segment already has an artifact
    /// - [`RunErrorKind::SegmentBusy`] if another job for it is still active
    pub fn ensure_job_allowed(&self, segment_id: &str) -> Result<(), RunError> {
        if self.segment(segment_id).is_none() {
            return Err(RunError::new(RunErrorKind::UnknownSegment(
                segment_id.to_string(),
            )));
        }
        if self.artifacts.contains_key(segment_id) {
            return Err(RunError::new(RunErrorKind::ArtifactExists(
                segment_id.to_string(),
            )));
        }
        if self
            .jobs
            .get(segment_id)
            .is_some_and(|job| job.status().is_active())
        {
            return Err(RunError::new(RunErrorKind::SegmentBusy(
                segment_id.to_string(),
            )));
        }
        Ok(())
    }

    /// Registers a fresh job for a segment, replacing a finished one.
    pub fn begin_job(&mut self, segment_id: &str) -> Result<GenerationJob, RunError> {
        self.ensure_job_allowed(segment_id)?;
        let job = GenerationJob::new(segment_id);
        self.jobs.insert(segment_id.to_string(), job.clone());
        self.touch();
        Ok(job)
    }

    /// Stores the latest snapshot of a job.
    pub fn update_job(&mut self, job: GenerationJob) -> Result<(), RunError> {
        if self.segment(job.segment_id()).is_none() {
            return Err(RunError::new(RunErrorKind::UnknownSegment(
                job.segment_id().clone(),
            )));
        }
        self.jobs.insert(job.segment_id().clone(), job);
        self.touch();
        Ok(())
    }

    /// Attaches an artifact. Artifacts are immutable, so a segment accepts
    /// exactly one.
    pub fn attach_artifact(&mut self, artifact: ClipArtifact) -> Result<(), RunError> {
        let segment_id = artifact.segment_id().clone();
        if self.segment(&segment_id).is_none() {
            return Err(RunError::new(RunErrorKind::UnknownSegment(segment_id)));
        }
        if self.artifacts.contains_key(&segment_id) {
            return Err(RunError::new(RunErrorKind::ArtifactExists(segment_id)));
        }
        self.artifacts.insert(segment_id, artifact);
        if self.is_media_complete() && self.stages.media_completed_at.is_none() {
            self.stages.media_completed_at = Some(Utc::now());
        }
        self.touch();
        Ok(())
    }

    /// Records a fatal failure. Only the first one is kept.
    pub fn record_failure(
        &mut self,
        stage: Stage,
        segment_id: Option<String>,
        reason_code: impl Into<String>,
        message: impl AsRef<str>,
    ) {
        if self.failure.is_some() {
            return;
        }
        let message: String = message
            .as_ref()
            .chars()
            .take(MAX_FAILURE_MESSAGE_CHARS)
            .collect();
        self.failure = Some(RunFailure {
            stage,
            segment_id,
            reason_code: reason_code.into(),
            message,
            at: Utc::now(),
        });
        self.touch();
    }

    /// Records the final output and stamps the assembly marker.
    pub fn record_output(&mut self, locator: impl Into<String>) {
        self.output = Some(locator.into());
        self.stages.assembled_at = Some(Utc::now());
        self.touch();
    }
}
