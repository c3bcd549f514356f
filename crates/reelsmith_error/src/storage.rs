//! Storage error types for clip payloads and run records.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create a storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write a file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read a file
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// Nothing stored at the requested locator
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Stored bytes no longer match their recorded checksum
    #[display("Checksum mismatch for {}: expected {}, got {}", locator, expected, actual)]
    ChecksumMismatch {
        /// Locator of the corrupted payload
        locator: String,
        /// Checksum recorded at write time
        expected: String,
        /// Checksum of the bytes on disk
        actual: String,
    },
    /// Failed to remove a file
    #[display("Failed to delete file: {}", _0)]
    FileDelete(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("runs/abc.json".to_string()));
/// assert!(format!("{}", err).contains("Not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
