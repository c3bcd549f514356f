//! Errors that end a single generation job.

/// Terminal conditions for one generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// The job did not reach a terminal provider status within the maximum wait
    #[display("Segment {} timed out after {}s", segment_id, waited_secs)]
    Timeout {
        /// Segment whose job timed out
        segment_id: String,
        /// Seconds waited before giving up
        waited_secs: u64,
    },
    /// The run was cancelled while the job was in flight
    #[display("Segment {} cancelled", _0)]
    Cancelled(String),
    /// Transient failures kept recurring past the retry bound
    #[display("Segment {} failed after {} retries: {}", segment_id, retries, last_error)]
    RetriesExhausted {
        /// Segment whose job failed
        segment_id: String,
        /// Retries spent
        retries: u32,
        /// Last transient error seen
        last_error: String,
    },
    /// The provider refused the job outright
    #[display("Segment {} rejected: {}", segment_id, reason)]
    Rejected {
        /// Segment whose job was rejected
        segment_id: String,
        /// Provider explanation
        reason: String,
    },
}

/// Generation error with location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::Timeout {
///     segment_id: "seg-002".to_string(),
///     waited_secs: 600,
/// });
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new generation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
