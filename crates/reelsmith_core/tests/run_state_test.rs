//! Tests for run lifecycle bookkeeping.

use reelsmith_core::{
    BeatSpan, ClipArtifact, ClipSegment, DispatchRecord, FailureReason, GenerationJob,
    GenerationStatus, MAX_FAILURE_MESSAGE_CHARS, RunState, RunStatus, Stage, StoredMedia,
};
use reelsmith_error::RunErrorKind;

fn segment(index: usize) -> ClipSegment {
    ClipSegment::builder()
        .id(format!("seg-{:03}", index + 1))
        .index(index)
        .beats(BeatSpan::single(index as u32 + 1))
        .narration("some narration here")
        .start_offset_seconds(index as f64 * 8.0)
        .target_duration_seconds(8.0)
        .visual_directive("visual")
        .audio_directive("audio")
        .build()
        .unwrap()
}

fn stored(tag: &str) -> StoredMedia {
    StoredMedia {
        locator: format!("/media/{}", tag),
        checksum: tag.to_string(),
        size_bytes: 10,
        mime_type: "video/mp4".to_string(),
    }
}

fn ready_job(segment_id: &str) -> GenerationJob {
    let mut job = GenerationJob::new(segment_id);
    job.record_submission("prov").unwrap();
    job.record_poll().unwrap();
    job.mark_ready("remote://result").unwrap();
    job
}

fn planned_run(segments: usize) -> RunState {
    let mut run = RunState::new(DispatchRecord::now("article"), "test");
    run.set_plan((0..segments).map(segment).collect());
    run
}

#[test]
fn test_forward_transitions() {
    let mut run = planned_run(1);
    run.transition(RunStatus::Queued).unwrap();
    run.transition(RunStatus::Running).unwrap();
    run.transition(RunStatus::Running).unwrap();
    run.transition(RunStatus::Completed).unwrap();

    let err = run.transition(RunStatus::Running).unwrap_err();
    assert!(matches!(err.kind, RunErrorKind::InvalidTransition { .. }));
    // Creation plus three real changes; the re-entry is not recorded.
    assert_eq!(run.history().len(), 4);
}

#[test]
fn test_reopen_only_from_failed() {
    let mut run = planned_run(1);
    assert!(run.reopen().is_err());

    run.transition(RunStatus::Queued).unwrap();
    run.transition(RunStatus::Running).unwrap();
    run.record_failure(Stage::Generation, Some("seg-001".to_string()), "timeout", "slow");
    run.transition(RunStatus::Failed).unwrap();

    run.reopen().unwrap();
    assert_eq!(*run.status(), RunStatus::Running);
    assert!(run.failure().is_none());
}

#[test]
fn test_single_active_job_per_segment() {
    let mut run = planned_run(2);
    run.begin_job("seg-001").unwrap();

    let err = run.begin_job("seg-001").unwrap_err();
    assert!(matches!(err.kind, RunErrorKind::SegmentBusy(_)));

    // A failed job can be replaced.
    let mut failed = GenerationJob::new("seg-002");
    failed.mark_failed(FailureReason::Timeout).unwrap();
    run.update_job(failed).unwrap();
    let fresh = run.begin_job("seg-002").unwrap();
    assert_eq!(*fresh.status(), GenerationStatus::Submitted);
    assert_eq!(*fresh.retry_count(), 0);
}

#[test]
fn test_artifacts_are_immutable() {
    let mut run = planned_run(2);
    let job = ready_job("seg-001");
    run.update_job(job.clone()).unwrap();
    run.attach_artifact(ClipArtifact::from_ready_job(&job, stored("one"), 8.0).unwrap())
        .unwrap();

    let again = ClipArtifact::from_ready_job(&job, stored("two"), 8.0).unwrap();
    let err = run.attach_artifact(again).unwrap_err();
    assert!(matches!(err.kind, RunErrorKind::ArtifactExists(_)));
    assert_eq!(run.artifacts()["seg-001"].checksum(), "one");

    let err = run.begin_job("seg-001").unwrap_err();
    assert!(matches!(err.kind, RunErrorKind::ArtifactExists(_)));
}

#[test]
fn test_artifact_requires_ready_job() {
    let mut job = GenerationJob::new("seg-001");
    job.record_submission("prov").unwrap();
    let err = ClipArtifact::from_ready_job(&job, stored("x"), 1.0).unwrap_err();
    assert!(matches!(err.kind, RunErrorKind::JobNotReady(_)));
}

#[test]
fn test_missing_segments_follow_plan_order() {
    let mut run = planned_run(3);
    let job = ready_job("seg-002");
    run.attach_artifact(ClipArtifact::from_ready_job(&job, stored("b"), 8.0).unwrap())
        .unwrap();

    let missing: Vec<_> = run.missing_segments().iter().map(|s| s.id().clone()).collect();
    assert_eq!(missing, vec!["seg-001", "seg-003"]);
    assert!(!run.is_media_complete());
    assert!(run.stages().media_completed_at.is_none());
}

#[test]
fn test_media_complete_marker() {
    let mut run = planned_run(1);
    let job = ready_job("seg-001");
    run.attach_artifact(ClipArtifact::from_ready_job(&job, stored("a"), 8.0).unwrap())
        .unwrap();
    assert!(run.is_media_complete());
    assert!(run.stages().media_completed_at.is_some());
}

#[test]
fn test_first_failure_kept_and_truncated() {
    let mut run = planned_run(1);
    let long = "x".repeat(1000);
    run.record_failure(Stage::Generation, Some("seg-001".to_string()), "timeout", &long);
    run.record_failure(Stage::Assembly, None, "assembly", "later");

    let failure = run.failure().as_ref().unwrap();
    assert_eq!(*failure.stage(), Stage::Generation);
    assert_eq!(failure.reason_code(), "timeout");
    assert_eq!(failure.message().chars().count(), MAX_FAILURE_MESSAGE_CHARS);
}

#[test]
fn test_terminal_job_refuses_changes() {
    let mut job = GenerationJob::new("seg-001");
    job.mark_failed(FailureReason::Cancelled).unwrap();
    assert!(job.mark_ready("late").is_err());
    assert!(job.record_retry().is_err());
    assert_eq!(*job.status(), GenerationStatus::Failed);
}

#[test]
fn test_status_serializes_screaming_case() {
    let json = serde_json::to_string(&RunStatus::Completed).unwrap();
    assert_eq!(json, "\"COMPLETED\"");
    let parsed: GenerationStatus = serde_json::from_str("\"POLLING\"").unwrap();
    assert_eq!(parsed, GenerationStatus::Polling);
}
