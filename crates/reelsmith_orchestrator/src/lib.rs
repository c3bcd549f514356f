//! Run orchestration for reelsmith.
//!
//! - [`MediaOrchestrator`]: submits, polls and fetches one generation job per
//!   missing segment within the provider's throttle
//! - [`RunController`]: moves a run through planning, generation and
//!   assembly, persisting after every change so any stage can resume
//! - [`SegmentLeases`]: in-process guard keeping one worker per segment

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod lease;
mod media;
mod run;

pub use lease::{SegmentLease, SegmentLeases};
pub use media::{GenerationReport, MediaOrchestrator, SegmentFailure};
pub use run::{RunController, RunServices};
