//! Final assembly errors.

/// Reasons the assembler refuses or fails to produce output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum AssemblyErrorKind {
    /// A planned segment has no clip artifact
    #[display("Segment {} has no clip artifact", _0)]
    MissingArtifact(String),
    /// There is nothing to assemble
    #[display("Run has no segments to assemble")]
    NoSegments,
    /// Narration track is unusable
    #[display("Invalid narration track: {}", _0)]
    Narration(String),
    /// External tool could not be started
    #[display("Failed to launch {}: {}", tool, message)]
    Launch {
        /// Tool name
        tool: String,
        /// OS error text
        message: String,
    },
    /// External tool exited unsuccessfully
    #[display("{} exited with status {}: {}", tool, status, stderr)]
    ToolFailed {
        /// Tool name
        tool: String,
        /// Exit status description
        status: String,
        /// Tail of the tool's stderr
        stderr: String,
    },
    /// Probe output could not be interpreted
    #[display("Failed to read media duration: {}", _0)]
    Probe(String),
    /// Caption file could not be written
    #[display("Failed to write captions: {}", _0)]
    Captions(String),
}

/// Assembly error with location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{AssemblyError, AssemblyErrorKind};
///
/// let err = AssemblyError::new(AssemblyErrorKind::MissingArtifact("seg-003".to_string()));
/// assert!(format!("{}", err).contains("seg-003"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Assembly Error: {} at line {} in {}", kind, line, file)]
pub struct AssemblyError {
    /// The kind of error that occurred
    pub kind: AssemblyErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl AssemblyError {
    /// Create a new assembly error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AssemblyErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
