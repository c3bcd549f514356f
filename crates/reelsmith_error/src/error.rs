//! Top-level error wrapper types.

use crate::{
    AlignmentError, AssemblyError, BuilderError, ConfigError, GenerationError, HttpError,
    JsonError, PlanningError, ProviderError, RunError, StorageError,
};

/// Every error a reelsmith crate can raise.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{ReelsmithError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: ReelsmithError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ReelsmithErrorKind {
    /// HTTP transport error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Chunk planning error
    #[from(PlanningError)]
    Planning(PlanningError),
    /// Media provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Generation job error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Alignment defect
    #[from(AlignmentError)]
    Alignment(AlignmentError),
    /// Assembly error
    #[from(AssemblyError)]
    Assembly(AssemblyError),
    /// Run lifecycle error
    #[from(RunError)]
    Run(RunError),
}

/// reelsmith error with kind discrimination.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{ReelsmithError, ReelsmithResult, ConfigError};
///
/// fn might_fail() -> ReelsmithResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Reelsmith Error: {}", _0)]
pub struct ReelsmithError(Box<ReelsmithErrorKind>);

impl ReelsmithError {
    /// Create a new error from a kind.
    pub fn new(kind: ReelsmithErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ReelsmithErrorKind {
        &self.0
    }

    /// Short machine-readable code used in run failure records.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelsmith_error::{ReelsmithError, PlanningError, PlanningErrorKind};
    ///
    /// let err: ReelsmithError = PlanningError::new(PlanningErrorKind::NoBeats).into();
    /// assert_eq!(err.reason_code(), "planning");
    /// ```
    pub fn reason_code(&self) -> &'static str {
        match self.kind() {
            ReelsmithErrorKind::Http(_) => "http",
            ReelsmithErrorKind::Json(_) => "json",
            ReelsmithErrorKind::Config(_) => "config",
            ReelsmithErrorKind::Builder(_) => "builder",
            ReelsmithErrorKind::Storage(_) => "storage",
            ReelsmithErrorKind::Planning(_) => "planning",
            ReelsmithErrorKind::Provider(e) if e.kind.is_retryable() => "provider_transient",
            ReelsmithErrorKind::Provider(_) => "provider_rejected",
            ReelsmithErrorKind::Generation(e) => match e.kind {
                crate::GenerationErrorKind::Timeout { .. } => "timeout",
                crate::GenerationErrorKind::Cancelled(_) => "cancelled",
                crate::GenerationErrorKind::RetriesExhausted { .. } => "retries_exhausted",
                crate::GenerationErrorKind::Rejected { .. } => "provider_rejected",
            },
            ReelsmithErrorKind::Alignment(_) => "alignment_defect",
            ReelsmithErrorKind::Assembly(e) => match e.kind {
                crate::AssemblyErrorKind::MissingArtifact(_)
                | crate::AssemblyErrorKind::NoSegments => "assembly_precondition",
                _ => "assembly",
            },
            ReelsmithErrorKind::Run(e) => match e.kind {
                crate::RunErrorKind::Cancelled(_) => "cancelled",
                _ => "run",
            },
        }
    }
}

// Generic From implementation for any type that converts to ReelsmithErrorKind
impl<T> From<T> for ReelsmithError
where
    T: Into<ReelsmithErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for reelsmith operations.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{ReelsmithResult, HttpError};
///
/// fn fetch_data() -> ReelsmithResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type ReelsmithResult<T> = std::result::Result<T, ReelsmithError>;
