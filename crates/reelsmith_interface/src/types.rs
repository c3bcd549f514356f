//! Values exchanged with collaborators.

use reelsmith_core::EncoderSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Provider-side state of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(tag = "state", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderStatus {
    /// Still queued or rendering
    Pending,
    /// Finished; the result can be fetched from `locator`
    Ready {
        /// Where the result can be fetched
        locator: String,
    },
    /// The provider gave up on the job
    Failed {
        /// Provider's explanation
        reason: String,
    },
}

impl ProviderStatus {
    /// Whether the provider will not change this status again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProviderStatus::Pending)
    }
}

/// Bytes downloaded from a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    /// Raw payload
    pub bytes: Vec<u8>,
    /// MIME type reported by the provider
    pub mime_type: String,
}

impl FetchedMedia {
    /// Creates a payload.
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// How one clip is fitted to its narration window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClipFit {
    /// Used unchanged
    AsIs,
    /// Cut at its end to `seconds`
    Trim {
        /// Length kept
        seconds: f64,
    },
    /// Slowed down by `factor` (> 1) to fill the window
    Stretch {
        /// Presentation timestamp multiplier
        factor: f64,
    },
}

/// One clip in the stitch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipCut {
    /// Segment the clip belongs to
    pub segment_id: String,
    /// Local file of the clip
    pub source: PathBuf,
    /// Measured clip length
    pub source_seconds: f64,
    /// Narration window the clip must fill
    pub window_seconds: f64,
    /// Adjustment applied at the boundary
    pub fit: ClipFit,
}

/// Everything the external muxer needs to render the final video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuxPlan {
    /// Clips in segment order
    pub clips: Vec<ClipCut>,
    /// Narration track; also the timing backbone
    pub narration: PathBuf,
    /// Length of the narration track
    pub narration_seconds: f64,
    /// Optional background music, looped under the narration
    pub music: Option<PathBuf>,
    /// Gain applied to the music
    pub music_level: f64,
    /// Optional ASS subtitle file burned into the video
    pub subtitles: Option<PathBuf>,
    /// Directory of fonts for the subtitle renderer
    pub fonts_dir: Option<PathBuf>,
    /// Encoder settings
    pub encoder: EncoderSettings,
    /// Destination file
    pub output: PathBuf,
}
