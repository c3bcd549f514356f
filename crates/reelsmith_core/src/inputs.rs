//! Script and media inputs a run needs from start to finish.

use crate::{AlignmentTrack, CaptionCue, ScriptBeat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a run consumes besides its dispatch record.
///
/// Stored on the run at admission so that a resumed or reopened run needs
/// nothing but its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInputs {
    /// Script beats in order
    pub beats: Vec<ScriptBeat>,
    /// Narration audio file
    pub narration: PathBuf,
    /// Word timings of the narration, when the voice provider returned them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentTrack>,
    /// Explicit caption timing used when no alignment exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_cues: Option<Vec<CaptionCue>>,
    /// Background music file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<PathBuf>,
    /// Requested output file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
}

impl RunInputs {
    /// Inputs with only a script and narration.
    pub fn new(beats: Vec<ScriptBeat>, narration: impl Into<PathBuf>) -> Self {
        Self {
            beats,
            narration: narration.into(),
            alignment: None,
            caption_cues: None,
            music: None,
            output_name: None,
        }
    }

    /// Adds narration word timings.
    pub fn with_alignment(mut self, alignment: AlignmentTrack) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Adds background music.
    pub fn with_music(mut self, music: impl Into<PathBuf>) -> Self {
        self.music = Some(music.into());
        self
    }

    /// Adds explicit caption cues.
    pub fn with_caption_cues(mut self, cues: Vec<CaptionCue>) -> Self {
        self.caption_cues = Some(cues);
        self
    }

    /// Sets the output file name.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}
