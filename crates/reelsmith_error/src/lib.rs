//! Error types for the reelsmith workspace.
//!
//! Every concern gets its own error so callers can tell an input defect
//! (bad script, malformed timing data) from a provider hiccup worth retrying.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! | Failure class | Type |
//! |---|---|
//! | bad script input | [`PlanningError`] |
//! | provider hiccup worth retrying | [`ProviderError`] where [`RetryableError::is_retryable`] |
//! | provider refusal | [`ProviderError`] otherwise |
//! | job ran out of time, retries, or was cancelled | [`GenerationError`] |
//! | malformed word timings | [`AlignmentError`] |
//! | missing artifact or mux failure | [`AssemblyError`] |
//!
//! # Examples
//!
//! ```
//! use reelsmith_error::{ReelsmithResult, HttpError};
//!
//! fn fetch_clip() -> ReelsmithResult<Vec<u8>> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! assert!(fetch_clip().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod alignment;
mod assembly;
mod builder;
mod error;
mod generation;
mod message;
mod planning;
mod provider;
mod run;
mod storage;

pub use alignment::{AlignmentError, AlignmentErrorKind};
pub use assembly::{AssemblyError, AssemblyErrorKind};
pub use builder::{BuilderError, BuilderErrorKind};
pub use error::{ReelsmithError, ReelsmithErrorKind, ReelsmithResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use message::{ConfigError, HttpError, JsonError};
pub use planning::{PlanningError, PlanningErrorKind};
pub use provider::{ProviderError, ProviderErrorKind, RetryableError};
pub use run::{RunError, RunErrorKind};
pub use storage::{StorageError, StorageErrorKind};
