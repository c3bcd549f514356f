//! Durable storage for the reelsmith pipeline.
//!
//! - [`FileSystemClipStorage`]: content-addressable clip payloads (SHA-256)
//! - [`FileSystemRunStore`]: one JSON document per run, replaced atomically
//! - [`MemoryRunStore`]: in-memory run store for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clips;
mod runs;

pub use clips::FileSystemClipStorage;
pub use runs::{FileSystemRunStore, MemoryRunStore};
