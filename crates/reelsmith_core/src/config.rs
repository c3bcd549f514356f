//! Planning and assembly settings.

use reelsmith_error::{PlanningError, PlanningErrorKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pacing and duration limits for the chunk planner.
///
/// # Examples
///
/// ```
/// use reelsmith_core::PlanningConfig;
///
/// let config = PlanningConfig::builder()
///     .max_clip_seconds(20.0)
///     .max_beats_per_clip(4usize)
///     .build()
///     .unwrap();
/// assert_eq!(*config.reading_rate_wps(), 2.5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(setter(into), default)]
#[serde(default, deny_unknown_fields)]
pub struct PlanningConfig {
    /// Longest clip the provider can generate.
    max_clip_seconds: f64,
    /// Fewest whole beats a clip should carry.
    min_beats_per_clip: usize,
    /// Most beats a clip may carry.
    max_beats_per_clip: usize,
    /// Narration speed used to estimate beat length.
    reading_rate_wps: f64,
    /// Silence held after a tension beat that precedes a reveal.
    reveal_pause_seconds: f64,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            max_clip_seconds: 8.0,
            min_beats_per_clip: 1,
            max_beats_per_clip: 3,
            reading_rate_wps: 2.5,
            reveal_pause_seconds: 0.5,
        }
    }
}

impl PlanningConfig {
    /// Creates a builder seeded with defaults.
    pub fn builder() -> PlanningConfigBuilder {
        PlanningConfigBuilder::default()
    }

    /// Returns a copy with a different clip ceiling.
    pub fn with_max_clip_seconds(&self, max_clip_seconds: f64) -> Self {
        Self {
            max_clip_seconds,
            ..self.clone()
        }
    }

    /// Checks that the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningErrorKind::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> Result<(), PlanningError> {
        let problem = if !(self.max_clip_seconds.is_finite() && self.max_clip_seconds > 0.0) {
            Some(format!(
                "max_clip_seconds must be positive, got {}",
                self.max_clip_seconds
            ))
        } else if !(self.reading_rate_wps.is_finite() && self.reading_rate_wps > 0.0) {
            Some(format!(
                "reading_rate_wps must be positive, got {}",
                self.reading_rate_wps
            ))
        } else if self.min_beats_per_clip == 0 {
            Some("min_beats_per_clip must be at least 1".to_string())
        } else if self.max_beats_per_clip < self.min_beats_per_clip {
            Some(format!(
                "max_beats_per_clip ({}) is below min_beats_per_clip ({})",
                self.max_beats_per_clip, self.min_beats_per_clip
            ))
        } else if !(self.reveal_pause_seconds.is_finite() && self.reveal_pause_seconds >= 0.0) {
            Some(format!(
                "reveal_pause_seconds must be non-negative, got {}",
                self.reveal_pause_seconds
            ))
        } else {
            None
        };

        match problem {
            Some(message) => Err(PlanningError::new(PlanningErrorKind::InvalidConfig(message))),
            None => Ok(()),
        }
    }
}

/// Look of burned-in captions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(default)]
pub struct CaptionStyle {
    /// Font family name.
    font: String,
    /// Font size in script pixels.
    font_size: u32,
    /// Horizontal script resolution.
    play_res_x: u32,
    /// Vertical script resolution.
    play_res_y: u32,
    /// Text colour in ASS `&HAABBGGRR` form.
    primary_colour: String,
    /// Highlight colour in ASS `&HBBGGRR&` override form.
    highlight_colour: String,
    /// Outline thickness.
    outline: u32,
    /// Longest caption line in characters.
    max_chars_per_line: usize,
    /// Longest time a caption line stays up.
    max_line_seconds: f64,
    /// Vertical position as a fraction of the frame height.
    vertical_position: f64,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font: "Inter".to_string(),
            font_size: 48,
            play_res_x: 720,
            play_res_y: 1280,
            primary_colour: "&H00FFFFFF".to_string(),
            highlight_colour: "&H00FFFF&".to_string(),
            outline: 3,
            max_chars_per_line: 36,
            max_line_seconds: 3.0,
            vertical_position: 0.58,
        }
    }
}

/// Encoder settings passed to the external muxer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(default)]
pub struct EncoderSettings {
    /// Video codec.
    video_codec: String,
    /// Constant rate factor.
    crf: u8,
    /// Encoder preset.
    preset: String,
    /// Audio codec.
    audio_codec: String,
    /// Audio bitrate.
    audio_bitrate: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            crf: 18,
            preset: "slow".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// Settings for final assembly.
///
/// # Examples
///
/// ```
/// use reelsmith_core::AssemblyConfig;
///
/// let config = AssemblyConfig::default();
/// assert_eq!(*config.music_level(), 0.12);
/// assert_eq!(config.captions().max_chars_per_line(), &36);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Gain applied to background music; narration always stays at unity.
    music_level: f64,
    /// Clip/narration length difference ignored when fitting clips.
    fit_tolerance_seconds: f64,
    /// Caption appearance.
    captions: CaptionStyle,
    /// Encoder settings.
    encoder: EncoderSettings,
    /// Directory of fonts handed to the subtitle renderer.
    #[serde(skip_serializing_if = "Option::is_none")]
    fonts_dir: Option<PathBuf>,
    /// Directory where final videos are written.
    output_dir: PathBuf,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            music_level: 0.12,
            fit_tolerance_seconds: 0.05,
            captions: CaptionStyle::default(),
            encoder: EncoderSettings::default(),
            fonts_dir: None,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AssemblyConfig {
    /// Returns a copy writing into another output directory.
    pub fn with_output_dir(&self, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with another music level.
    pub fn with_music_level(&self, music_level: f64) -> Self {
        Self {
            music_level,
            ..self.clone()
        }
    }
}
