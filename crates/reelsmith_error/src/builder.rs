//! Errors from building beats, segments and payloads by hand.

/// Why a builder refused to produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A field without a default was never set
    #[display("{} was not set", _0)]
    MissingField(String),
    /// A field was set to a value the type cannot hold
    #[display("{} is invalid: {}", field, reason)]
    InvalidField {
        /// Field name
        field: String,
        /// What is wrong with the value
        reason: String,
    },
}

/// A builder failure, located at the `build` call that raised it.
///
/// ```
/// use reelsmith_error::{BuilderError, BuilderErrorKind};
///
/// let err = BuilderError::new(BuilderErrorKind::InvalidField {
///     field: "target_seconds".to_string(),
///     reason: "must be positive".to_string(),
/// });
/// assert!(err.to_string().contains("target_seconds is invalid"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    /// What was wrong
    pub kind: BuilderErrorKind,
    /// Line of the failing `build` call
    pub line: u32,
    /// File of the failing `build` call
    pub file: &'static str,
}

impl BuilderError {
    /// Records the error at the caller's location.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
