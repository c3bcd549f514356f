//! Trait definitions for the reelsmith video pipeline.
//!
//! The orchestration core talks to everything slow or external through these
//! traits: generation providers, run persistence, clip storage, media probing
//! and the final muxer. Production implementations live in
//! `reelsmith_providers`, `reelsmith_storage` and `reelsmith_assembly`; tests
//! substitute scripted fakes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ClipStorage, MediaProbe, MediaProvider, Muxer, RunStore};
pub use types::{ClipCut, ClipFit, FetchedMedia, MuxPlan, ProviderStatus};
