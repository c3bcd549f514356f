//! Media provider adapters for reelsmith.
//!
//! [`HttpMediaProvider`] speaks a small job API shared by most hosted video
//! generators: create a job, poll it until it settles, download the result.
//! Status codes are classified so the orchestrator can tell a hiccup worth
//! retrying from a refusal.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod http;
mod wire;

pub use http::HttpMediaProvider;
pub use wire::{CreateJobRequest, CreateJobResponse, JobStatusResponse};
