//! Narration time for ranges of script words.

use reelsmith_core::AlignmentTrack;
use reelsmith_error::{AlignmentError, AlignmentErrorKind};
use std::ops::Range;

/// Maps a range of script words (global word indices) to narration seconds.
#[derive(Debug, Clone)]
pub(crate) enum WordClock {
    /// Every word takes `1 / reading_rate_wps` seconds.
    Estimated { reading_rate_wps: f64 },
    /// Word `i` lasts from its own start to the next word's start; the first
    /// word also absorbs leading silence so offsets line up with the audio.
    Measured { prefix: Vec<f64> },
}

impl WordClock {
    pub(crate) fn estimated(reading_rate_wps: f64) -> Self {
        WordClock::Estimated { reading_rate_wps }
    }

    pub(crate) fn measured(track: &AlignmentTrack, total_words: usize) -> Result<Self, AlignmentError> {
        if track.len() != total_words {
            return Err(AlignmentError::new(AlignmentErrorKind::Coverage {
                aligned: track.len(),
                expected: total_words,
            }));
        }

        let words = track.words();
        let mut prefix = Vec::with_capacity(words.len() + 1);
        prefix.push(0.0);
        for i in 0..words.len() {
            let boundary = match words.get(i + 1) {
                Some(next) => *next.start(),
                None => *words[i].end(),
            };
            prefix.push(boundary);
        }
        Ok(WordClock::Measured { prefix })
    }

    /// Seconds spent narrating `words`.
    pub(crate) fn span(&self, words: &Range<usize>) -> f64 {
        match self {
            WordClock::Estimated { reading_rate_wps } => words.len() as f64 / reading_rate_wps,
            WordClock::Measured { prefix } => prefix[words.end] - prefix[words.start],
        }
    }

    /// Whether planned pauses should be added on top of narration time.
    pub(crate) fn adds_pauses(&self) -> bool {
        matches!(self, WordClock::Estimated { .. })
    }
}
