//! Core data model for reelsmith.
//!
//! A run turns a script of [`ScriptBeat`]s into planned [`ClipSegment`]s,
//! drives one [`GenerationJob`] per segment until it yields a
//! [`ClipArtifact`], and keeps all of it on a [`RunState`] that can be
//! persisted and resumed. [`AlignmentTrack`] carries word timings from the
//! narration provider for caption highlighting.
//!
//! # Examples
//!
//! ```
//! use reelsmith_core::{DispatchRecord, RunState, RunStatus};
//!
//! let run = RunState::new(DispatchRecord::now("https://news.example/a"), "veo");
//! assert_eq!(*run.status(), RunStatus::Pending);
//! assert!(run.missing_segments().is_empty());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod alignment;
mod artifact;
mod beat;
mod config;
mod dispatch;
mod inputs;
mod job;
mod prompt;
mod run;
mod segment;

pub use alignment::{AlignmentTrack, CaptionCue, CharacterAlignment, WordTiming};
pub use artifact::{ClipArtifact, StoredMedia};
pub use beat::{ScriptBeat, ScriptBeatBuilder, SuspenseTag};
pub use config::{
    AssemblyConfig, CaptionStyle, EncoderSettings, PlanningConfig, PlanningConfigBuilder,
};
pub use dispatch::DispatchRecord;
pub use inputs::RunInputs;
pub use job::{FailureReason, GenerationJob, GenerationStatus};
pub use prompt::PromptPayload;
pub use run::{
    MAX_FAILURE_MESSAGE_CHARS, RunFailure, RunState, RunStatus, Stage, StageMarkers,
    StatusTransition,
};
pub use segment::{BeatSpan, ClipSegment, ClipSegmentBuilder, SplitPart};
