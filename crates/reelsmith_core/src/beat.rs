//! Script beats: the narrative units a script is made of.

use reelsmith_error::{BuilderError, BuilderErrorKind, ReelsmithResult};
use serde::{Deserialize, Serialize};

/// Dramatic role of a beat within the script.
///
/// The planner only cares about one pairing: a [`SuspenseTag::Reveal`] that
/// directly follows a [`SuspenseTag::Tension`] beat always starts a new clip.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SuspenseTag {
    /// Opening line that grabs attention
    Hook,
    /// Context and build-up
    #[default]
    Build,
    /// Peak of suspense before a payoff
    Tension,
    /// Payoff of the preceding tension
    Reveal,
    /// Wrap-up
    Resolution,
}

/// One narrative unit of the crafted script.
///
/// Beats are immutable once built; the planner reads them by reference.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{ScriptBeat, SuspenseTag};
///
/// let beat = ScriptBeat::builder()
///     .ordinal(1u32)
///     .narration("The vault was empty when they opened it.")
///     .suspense(SuspenseTag::Hook)
///     .build()
///     .unwrap();
///
/// assert_eq!(beat.word_count(), 8);
/// assert_eq!(*beat.suspense(), SuspenseTag::Hook);
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
pub struct ScriptBeat {
    /// Position in the script; unique and increasing.
    ordinal: u32,
    /// Text read by the narrator.
    narration: String,
    /// Dramatic role.
    #[builder(default)]
    #[serde(default)]
    suspense: SuspenseTag,
    /// Optional hint for the visuals of this beat.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    visual_seed: Option<String>,
    /// Optional hint for the soundscape of this beat.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio_mood: Option<String>,
}

impl ScriptBeat {
    /// Creates a builder.
    pub fn builder() -> ScriptBeatBuilder {
        ScriptBeatBuilder::default()
    }

    /// Creates a beat with no visual or audio hints.
    pub fn new(ordinal: u32, narration: impl Into<String>, suspense: SuspenseTag) -> Self {
        Self {
            ordinal,
            narration: narration.into(),
            suspense,
            visual_seed: None,
            audio_mood: None,
        }
    }

    /// Number of whitespace-separated words in the narration.
    pub fn word_count(&self) -> usize {
        self.narration.split_whitespace().count()
    }

    /// Estimated narration time at the given reading rate.
    pub fn estimated_seconds(&self, reading_rate_wps: f64) -> f64 {
        self.word_count() as f64 / reading_rate_wps
    }
}

impl ScriptBeatBuilder {
    /// Build the beat.
    ///
    /// # Errors
    ///
    /// Returns an error if the ordinal or narration is missing.
    pub fn build(&self) -> ReelsmithResult<ScriptBeat> {
        self.build_internal()
            .map_err(|e| BuilderError::new(BuilderErrorKind::MissingField(e.to_string())).into())
    }
}
