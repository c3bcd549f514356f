//! Word timing defects.

/// Ways an alignment track can be malformed.
///
/// Defects are reported, never repaired.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum AlignmentErrorKind {
    /// A word ends before it starts
    #[display("Word {} ({:?}) ends before it starts", index, word)]
    NegativeSpan {
        /// Position of the word in the track
        index: usize,
        /// The word itself
        word: String,
    },
    /// A word starts before the previous word started
    #[display("Word {} ({:?}) is out of order", index, word)]
    OutOfOrder {
        /// Position of the word in the track
        index: usize,
        /// The word itself
        word: String,
    },
    /// A word starts before the previous word ended
    #[display("Word {} ({:?}) overlaps the previous word", index, word)]
    Overlap {
        /// Position of the word in the track
        index: usize,
        /// The word itself
        word: String,
    },
    /// A timestamp is negative or not a finite number
    #[display("Word {} has an invalid timestamp", _0)]
    InvalidTimestamp(usize),
    /// The track does not cover the narration text
    #[display("Alignment covers {} words but narration has {}", aligned, expected)]
    Coverage {
        /// Words in the track
        aligned: usize,
        /// Words in the narration
        expected: usize,
    },
    /// Character timing arrays disagree in length
    #[display("Character alignment arrays differ in length: {}", _0)]
    CharacterArrays(String),
}

/// Alignment defect with location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{AlignmentError, AlignmentErrorKind};
///
/// let err = AlignmentError::new(AlignmentErrorKind::Overlap {
///     index: 1,
///     word: "b".to_string(),
/// });
/// assert!(format!("{}", err).contains("overlaps"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Alignment Error: {} at line {} in {}", kind, line, file)]
pub struct AlignmentError {
    /// The kind of error that occurred
    pub kind: AlignmentErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl AlignmentError {
    /// Create a new alignment error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AlignmentErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
