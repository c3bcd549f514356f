//! Reelsmith turns a narrated article script into a captioned short-form video.
//!
//! A run moves through three restartable stages:
//!
//! 1. **Planning**: script beats are grouped into clip-sized segments that
//!    respect the provider's maximum clip length
//! 2. **Generation**: one job per segment is submitted to a slow,
//!    rate-limited media provider, polled, and its result stored
//! 3. **Assembly**: clips are fitted to the narration, karaoke captions are
//!    rendered, and everything is muxed by `ffmpeg`
//!
//! Run state is persisted after every change, so a crashed or cancelled run
//! picks up where it stopped without paying for finished clips twice.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use reelsmith::{DispatchRecord, ReelsmithConfig, RunController, RunInputs, local_services};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReelsmithConfig::load()?;
//!     let profile = config.provider(None)?;
//!     let controller = RunController::from_config(local_services(&config, &profile)?, &config, None)?;
//!
//!     let inputs = RunInputs::new(reelsmith::read_beats("beats.json").await?, "narration.mp3");
//!     let run_id = controller.admit(DispatchRecord::now("article-42"), inputs).await?;
//!     let run = controller.execute(run_id).await?;
//!     println!("{} {:?}", run.status(), run.output());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `reelsmith_error` - Error types
//! - `reelsmith_core` - Beats, segments, jobs, artifacts and run state
//! - `reelsmith_planner` - Chunk planner
//! - `reelsmith_throttle` - Provider profiles, throttle, retry policy, configuration
//! - `reelsmith_interface` - Provider, store, probe and muxer traits
//! - `reelsmith_storage` - Clip storage and run stores
//! - `reelsmith_orchestrator` - Media orchestration and run lifecycle
//! - `reelsmith_assembly` - Captions and `ffmpeg` assembly
//! - `reelsmith_providers` - HTTP job API client
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod files;
pub mod observability;
mod services;

pub use files::{read_alignment, read_beats};
pub use services::local_services;

pub use reelsmith_assembly::*;
pub use reelsmith_core::*;
pub use reelsmith_error::*;
pub use reelsmith_interface::*;
pub use reelsmith_orchestrator::*;
pub use reelsmith_planner::*;
pub use reelsmith_providers::*;
pub use reelsmith_storage::*;
pub use reelsmith_throttle::*;
