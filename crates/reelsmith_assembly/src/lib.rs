//! Final assembly for reelsmith.
//!
//! The narration track is the timing backbone of the finished video. Each
//! planned segment receives a narration window, its clip is trimmed or
//! stretched to fill that window at the segment boundary, and the clips are
//! concatenated strictly in plan order. Music sits under the narration at a
//! fixed level and never pushes it down.
//!
//! Captions are rendered as an ASS karaoke script: every line is shown for
//! its duration and the word being spoken is highlighted exactly while its
//! `[start, end)` interval covers the playhead.
//!
//! Encoding is delegated to external tools behind the
//! [`Muxer`](reelsmith_interface::Muxer) and
//! [`MediaProbe`](reelsmith_interface::MediaProbe) traits; [`FfmpegMuxer`] and
//! [`FfprobeProbe`] are the production implementations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembler;
mod captions;
mod ffmpeg;
mod naming;
mod timeline;

pub use assembler::Assembler;
pub use captions::{CaptionRenderer, format_ass_time};
pub use ffmpeg::{FfmpegMuxer, FfprobeProbe, mux_args, parse_probe_duration};
pub use naming::{DEFAULT_OUTPUT_NAME, sanitize_output_name};
pub use timeline::{MIN_WINDOW_SECONDS, fit_clip, narration_windows};
