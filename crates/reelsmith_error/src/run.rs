//! Run lifecycle errors.

/// Violations of the run state machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RunErrorKind {
    /// Requested status change is not allowed
    #[display("Cannot move run from {} to {}", from, to)]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
    /// Another worker already holds an active job for the segment
    #[display("Segment {} already has an active generation job", _0)]
    SegmentBusy(String),
    /// Segment is backed by an artifact and may not be regenerated
    #[display("Segment {} already has an artifact", _0)]
    ArtifactExists(String),
    /// Segment id is not part of the run plan
    #[display("Unknown segment: {}", _0)]
    UnknownSegment(String),
    /// An artifact can only come from a ready job
    #[display("Job for segment {} is not ready", _0)]
    JobNotReady(String),
    /// No stored run has this id
    #[display("Run not found: {}", _0)]
    NotFound(String),
    /// Run was cancelled by the operator
    #[display("Run {} was cancelled", _0)]
    Cancelled(String),
    /// Run ended FAILED
    #[display("Run {} failed: {}", run_id, reason)]
    Failed {
        /// Run id
        run_id: String,
        /// Failure reason code and message
        reason: String,
    },
}

/// Run error with location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{RunError, RunErrorKind};
///
/// let err = RunError::new(RunErrorKind::SegmentBusy("seg-001".to_string()));
/// assert!(format!("{}", err).contains("active generation job"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Run Error: {} at line {} in {}", kind, line, file)]
pub struct RunError {
    /// The kind of error that occurred
    pub kind: RunErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RunError {
    /// Create a new run error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RunErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
