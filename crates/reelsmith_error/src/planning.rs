//! Chunk planning errors.
//!
//! Planning errors are input defects. They are never retried.

/// Conditions that stop the planner from producing segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PlanningErrorKind {
    /// No beats were supplied
    #[display("Script has no beats")]
    NoBeats,
    /// A beat has no words to narrate
    #[display("Beat {} has no narration text", _0)]
    EmptyBeat(u32),
    /// A single word is longer than the clip ceiling and cannot be split further
    #[display("Beat {} cannot fit {}s clips even after splitting: word {:?} is too long", ordinal, max_clip_seconds, word)]
    Unsplittable {
        /// Ordinal of the offending beat
        ordinal: u32,
        /// Word that alone exceeds the ceiling
        word: String,
        /// Clip ceiling in force
        max_clip_seconds: String,
    },
    /// Beat ordinals are not strictly increasing
    #[display("Beat ordinal {} follows {}; ordinals must be unique and increasing", current, previous)]
    OrdinalOrder {
        /// Ordinal seen first
        previous: u32,
        /// Ordinal that broke the order
        current: u32,
    },
    /// A segment starting at this beat would take no narration time
    #[display("Beat {} starts a segment with no narration time", _0)]
    Silent(u32),
    /// Planning configuration is unusable
    #[display("Invalid planning configuration: {}", _0)]
    InvalidConfig(String),
}

/// Planning error with location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{PlanningError, PlanningErrorKind};
///
/// let err = PlanningError::new(PlanningErrorKind::EmptyBeat(3));
/// assert!(format!("{}", err).contains("Beat 3"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Planning Error: {} at line {} in {}", kind, line, file)]
pub struct PlanningError {
    /// The kind of error that occurred
    pub kind: PlanningErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PlanningError {
    /// Create a new planning error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PlanningErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
