//! Chunk planning for reelsmith.
//!
//! The planner turns an ordered script into clip segments a video provider
//! can generate in one request:
//!
//! - no segment exceeds `max_clip_seconds`
//! - beats stay whole unless a single beat is longer than the ceiling, in which
//!   case it is cut at the word boundary nearest its midpoint
//! - beat order is preserved and segments cover the script without gaps
//! - each segment starts where the previous one ended
//!
//! A reveal that directly follows a tension beat always opens a new segment,
//! and the tension segment holds a short pause before it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod planner;

pub use planner::ChunkPlanner;
