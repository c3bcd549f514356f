//! Planned clip segments.

use reelsmith_error::{BuilderError, BuilderErrorKind, ReelsmithResult};
use serde::{Deserialize, Serialize};

/// Inclusive range of beat ordinals covered by a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeatSpan {
    /// First ordinal covered
    pub first: u32,
    /// Last ordinal covered
    pub last: u32,
}

impl BeatSpan {
    /// Span covering a single beat.
    pub fn single(ordinal: u32) -> Self {
        Self {
            first: ordinal,
            last: ordinal,
        }
    }

    /// Whether the ordinal falls inside the span.
    pub fn contains(&self, ordinal: u32) -> bool {
        (self.first..=self.last).contains(&ordinal)
    }
}

impl std::fmt::Display for BeatSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Marks a segment that carries one piece of a force-split beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitPart {
    /// 1-based index of this piece
    pub index: u16,
    /// Total number of pieces the beat was cut into
    pub count: u16,
}

/// A planned, provider-sized unit of video to generate.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{BeatSpan, ClipSegment};
///
/// let segment = ClipSegment::builder()
///     .id("seg-001")
///     .index(0usize)
///     .beats(BeatSpan { first: 1, last: 2 })
///     .narration("Two beats of narration.")
///     .start_offset_seconds(0.0)
///     .target_duration_seconds(16.0)
///     .visual_directive("a dim archive")
///     .audio_directive("low drones")
///     .build()
///     .unwrap();
///
/// assert_eq!(segment.end_offset_seconds(), 16.0);
/// assert!(segment.part().is_none());
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
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct ClipSegment {
    /// Stable identifier, `seg-NNN` in plan order.
    id: String,
    /// Zero-based position in the plan.
    index: usize,
    /// Beats narrated over this clip.
    beats: BeatSpan,
    /// Set when the clip carries part of a split beat.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    part: Option<SplitPart>,
    /// Narration text read over this clip.
    narration: String,
    /// Cumulative duration of every earlier segment.
    start_offset_seconds: f64,
    /// Planned clip length, including any trailing pause.
    target_duration_seconds: f64,
    /// Silence held after the narration, already part of the target duration.
    #[builder(default)]
    #[serde(default)]
    pause_after_seconds: f64,
    /// What the clip should show.
    visual_directive: String,
    /// What the clip should sound like.
    audio_directive: String,
}

impl ClipSegment {
    /// Creates a builder.
    pub fn builder() -> ClipSegmentBuilder {
        ClipSegmentBuilder::default()
    }

    /// Offset at which the next segment starts.
    pub fn end_offset_seconds(&self) -> f64 {
        self.start_offset_seconds + self.target_duration_seconds
    }

    /// Number of narration words in this clip.
    pub fn word_count(&self) -> usize {
        self.narration.split_whitespace().count()
    }
}

impl ClipSegmentBuilder {
    /// Build the segment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing or the duration is not positive.
    pub fn build(&self) -> ReelsmithResult<ClipSegment> {
        let segment = self
            .build_internal()
            .map_err(|e| BuilderError::new(BuilderErrorKind::MissingField(e.to_string())))?;
        let duration = segment.target_duration_seconds;
        if duration.is_nan() || duration <= 0.0 {
            return Err(BuilderError::new(BuilderErrorKind::InvalidField {
                field: "target_duration_seconds".to_string(),
                reason: format!("must be positive, got {}", duration),
            })
            .into());
        }
        Ok(segment)
    }
}
