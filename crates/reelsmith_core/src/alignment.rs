//! Word-level narration timing.

use reelsmith_error::{AlignmentError, AlignmentErrorKind};
use serde::{Deserialize, Serialize};

/// One narrated word and the interval during which it is spoken.
///
/// Deserializes from either `{"word": "a", "start": 0.0, "end": 1.0}` or the
/// triple form `["a", 0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(from = "RawWordTiming")]
pub struct WordTiming {
    /// The word as spoken.
    word: String,
    /// Start of the word in seconds.
    start: f64,
    /// End of the word in seconds.
    end: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawWordTiming {
    Triple(String, f64, f64),
    Named { word: String, start: f64, end: f64 },
}

impl From<RawWordTiming> for WordTiming {
    fn from(raw: RawWordTiming) -> Self {
        match raw {
            RawWordTiming::Triple(word, start, end) | RawWordTiming::Named { word, start, end } => {
                Self { word, start, end }
            }
        }
    }
}

impl WordTiming {
    /// Creates a timing entry.
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }

    /// Whether the word is spoken at `t`, using the half-open `[start, end)`.
    pub fn is_active_at(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

/// Character-level timing as returned by narration providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterAlignment {
    /// Every character of the transcript, whitespace included
    pub characters: Vec<String>,
    /// Start of each character in seconds
    pub character_start_times_seconds: Vec<f64>,
    /// End of each character in seconds
    pub character_end_times_seconds: Vec<f64>,
}

/// Ordered word timings for a narration track.
///
/// Construction validates the track: every entry has `end >= start`, starts
/// never decrease, and no word starts before the previous one ends. Defects
/// are reported as [`AlignmentError`]; nothing is corrected.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{AlignmentTrack, WordTiming};
///
/// let track = AlignmentTrack::new(vec![
///     WordTiming::new("a", 0.0, 1.0),
///     WordTiming::new("b", 1.0, 2.0),
/// ])
/// .unwrap();
///
/// assert_eq!(track.highlighted_at(0.5).map(|w| w.word().as_str()), Some("a"));
/// assert_eq!(track.highlighted_at(1.5).map(|w| w.word().as_str()), Some("b"));
/// assert!(track.highlighted_at(2.5).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WordTiming>", into = "Vec<WordTiming>")]
pub struct AlignmentTrack {
    words: Vec<WordTiming>,
}

impl TryFrom<Vec<WordTiming>> for AlignmentTrack {
    type Error = AlignmentError;

    fn try_from(words: Vec<WordTiming>) -> Result<Self, Self::Error> {
        Self::new(words)
    }
}

impl From<AlignmentTrack> for Vec<WordTiming> {
    fn from(track: AlignmentTrack) -> Self {
        track.words
    }
}

impl AlignmentTrack {
    /// Validates and wraps word timings.
    pub fn new(words: Vec<WordTiming>) -> Result<Self, AlignmentError> {
        for (index, entry) in words.iter().enumerate() {
            if !entry.start.is_finite() || !entry.end.is_finite() || entry.start < 0.0 {
                return Err(AlignmentError::new(AlignmentErrorKind::InvalidTimestamp(
                    index,
                )));
            }
            if entry.end < entry.start {
                return Err(AlignmentError::new(AlignmentErrorKind::NegativeSpan {
                    index,
                    word: entry.word.clone(),
                }));
            }
            if index == 0 {
                continue;
            }
            let previous = &words[index - 1];
            if entry.start < previous.start {
                return Err(AlignmentError::new(AlignmentErrorKind::OutOfOrder {
                    index,
                    word: entry.word.clone(),
                }));
            }
            if entry.start < previous.end {
                return Err(AlignmentError::new(AlignmentErrorKind::Overlap {
                    index,
                    word: entry.word.clone(),
                }));
            }
        }
        Ok(Self { words })
    }

    /// Builds word timings from character timings.
    ///
    /// A word starts at its first character's start and ends at its last
    /// character's end. Whitespace separates words.
    pub fn from_characters(alignment: &CharacterAlignment) -> Result<Self, AlignmentError> {
        let count = alignment.characters.len();
        if alignment.character_start_times_seconds.len() != count
            || alignment.character_end_times_seconds.len() != count
        {
            return Err(AlignmentError::new(AlignmentErrorKind::CharacterArrays(
                format!(
                    "{} characters, {} starts, {} ends",
                    count,
                    alignment.character_start_times_seconds.len(),
                    alignment.character_end_times_seconds.len()
                ),
            )));
        }

        let mut words = Vec::new();
        let mut current = String::new();
        let mut start = 0.0;
        let mut end = 0.0;
        for (i, ch) in alignment.characters.iter().enumerate() {
            if ch.trim().is_empty() {
                if !current.is_empty() {
                    words.push(WordTiming::new(std::mem::take(&mut current), start, end));
                }
                continue;
            }
            if current.is_empty() {
                start = alignment.character_start_times_seconds[i];
            }
            current.push_str(ch);
            end = alignment.character_end_times_seconds[i];
        }
        if !current.is_empty() {
            words.push(WordTiming::new(current, start, end));
        }

        Self::new(words)
    }

    /// The word timings in order.
    pub fn words(&self) -> &[WordTiming] {
        &self.words
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the track has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// End of the last word, or zero for an empty track.
    pub fn duration_seconds(&self) -> f64 {
        self.words.last().map(|w| w.end).unwrap_or(0.0)
    }

    /// Index of the word highlighted at `t`, if any.
    pub fn highlighted_index_at(&self, t: f64) -> Option<usize> {
        // Starts are non-decreasing, so the candidate is the last word
        // starting at or before t.
        let candidate = self.words.partition_point(|w| w.start <= t);
        if candidate == 0 {
            return None;
        }
        let index = candidate - 1;
        self.words[index].is_active_at(t).then_some(index)
    }

    /// The word highlighted at `t`, if any.
    pub fn highlighted_at(&self, t: f64) -> Option<&WordTiming> {
        self.highlighted_index_at(t).map(|i| &self.words[i])
    }

    /// Checks that the track has one entry per narration word.
    pub fn ensure_covers(&self, narration: &str) -> Result<(), AlignmentError> {
        let expected = narration.split_whitespace().count();
        if expected != self.words.len() {
            return Err(AlignmentError::new(AlignmentErrorKind::Coverage {
                aligned: self.words.len(),
                expected,
            }));
        }
        Ok(())
    }
}

/// A caption line with explicit timing, used when no word alignment exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    /// Text shown
    pub text: String,
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
}
