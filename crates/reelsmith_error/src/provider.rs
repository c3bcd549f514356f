//! Generation provider errors and retry classification.

/// Failure conditions reported by an asynchronous media provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status_code, message)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Provider signalled an explicit rate limit
    #[display("Rate limited: {}", _0)]
    RateLimited(String),
    /// Provider could not be reached
    #[display("Provider unavailable: {}", _0)]
    Unavailable(String),
    /// Provider refused the content (policy or moderation)
    #[display("Request rejected: {}", _0)]
    Rejected(String),
    /// Provider could not interpret the request
    #[display("Malformed request: {}", _0)]
    Malformed(String),
    /// Provider answered with something we cannot parse
    #[display("Invalid provider response: {}", _0)]
    InvalidResponse(String),
    /// Provider does not know the job or locator
    #[display("Unknown provider job: {}", _0)]
    UnknownJob(String),
}

impl ProviderErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderErrorKind::Http { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            ProviderErrorKind::RateLimited(_) => true,
            ProviderErrorKind::Unavailable(_) => true,
            _ => false,
        }
    }

    /// Classify an HTTP status code returned by a provider.
    ///
    /// Retryable statuses stay [`ProviderErrorKind::Http`]; other client errors
    /// become rejections (policy statuses) or malformed requests.
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            429 => ProviderErrorKind::RateLimited(message),
            403 | 451 => ProviderErrorKind::Rejected(message),
            404 => ProviderErrorKind::UnknownJob(message),
            400 | 413 | 415 | 422 => ProviderErrorKind::Malformed(message),
            _ => ProviderErrorKind::Http {
                status_code,
                message,
            },
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let err = ProviderError::new(ProviderErrorKind::Http {
///     status_code: 503,
///     message: "Service unavailable".to_string(),
/// });
/// assert!(err.is_retryable());
///
/// let rejected = ProviderError::new(ProviderErrorKind::Rejected("policy".to_string()));
/// assert!(!rejected.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that support retry logic.
///
/// Transient errors (rate limits, 5xx responses, dropped connections) are
/// retried with backoff; everything else fails immediately.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
