//! Prompt payloads sent to generation providers.

use crate::ClipSegment;
use serde::{Deserialize, Serialize};

/// Everything a provider needs to generate one clip.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{BeatSpan, ClipSegment, PromptPayload};
///
/// let segment = ClipSegment::builder()
///     .id("seg-001")
///     .index(0usize)
///     .beats(BeatSpan::single(1))
///     .narration("Lights flicker in the archive.")
///     .start_offset_seconds(0.0)
///     .target_duration_seconds(5.2)
///     .visual_directive("flickering fluorescent archive, handheld")
///     .audio_directive("low hum")
///     .build()
///     .unwrap();
///
/// let payload = PromptPayload::for_segment(&segment, 6, Some("text, watermarks"));
/// let prompt = payload.compose();
/// assert!(prompt.starts_with("flickering fluorescent archive"));
/// assert!(prompt.contains("Audio direction: low hum"));
/// assert!(prompt.contains("Avoid: text, watermarks"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPayload {
    /// Segment being generated
    pub segment_id: String,
    /// What the clip should show
    pub visual_directive: String,
    /// What the clip should sound like
    pub audio_directive: String,
    /// Narration read over the clip, for context
    pub narration: String,
    /// Clip length requested from the provider, snapped to what it supports
    pub requested_seconds: u32,
    /// Things the provider should avoid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

impl PromptPayload {
    /// Builds the payload for a segment.
    pub fn for_segment(
        segment: &ClipSegment,
        requested_seconds: u32,
        negative_prompt: Option<&str>,
    ) -> Self {
        Self {
            segment_id: segment.id().clone(),
            visual_directive: segment.visual_directive().clone(),
            audio_directive: segment.audio_directive().clone(),
            narration: segment.narration().clone(),
            requested_seconds,
            negative_prompt: negative_prompt
                .filter(|p| !p.trim().is_empty())
                .map(str::to_string),
        }
    }

    /// Single prompt string for providers that take free text.
    pub fn compose(&self) -> String {
        let mut prompt = self.visual_directive.trim().to_string();
        if !self.audio_directive.trim().is_empty() {
            prompt.push_str("\n\nAudio direction: ");
            prompt.push_str(self.audio_directive.trim());
        }
        if let Some(negative) = &self.negative_prompt {
            prompt.push_str("\n\nAvoid: ");
            prompt.push_str(negative.trim());
        }
        prompt
    }
}
