//! Narration windows and clip fitting.

use reelsmith_core::{AlignmentTrack, ClipSegment};
use reelsmith_error::{AssemblyError, AssemblyErrorKind, ReelsmithResult};
use reelsmith_interface::ClipFit;

/// Shortest window a segment is given, one frame at 25 fps.
pub const MIN_WINDOW_SECONDS: f64 = 0.04;

/// Computes how long each segment's clip must play.
///
/// With an alignment track a segment's window runs from its first spoken
/// word to the first spoken word of the next segment (the first segment
/// starts at zero, the last one ends with the narration), so pauses between
/// segments belong to the segment before them. Without one the planned
/// durations are scaled to the measured narration length.
///
/// # Errors
///
/// - [`AssemblyErrorKind::NoSegments`] for an empty plan
/// - [`AssemblyErrorKind::Narration`] for a non-positive narration length
/// - an alignment error if the track does not cover the planned narration
pub fn narration_windows(
    segments: &[ClipSegment],
    alignment: Option<&AlignmentTrack>,
    narration_seconds: f64,
) -> ReelsmithResult<Vec<f64>> {
    if segments.is_empty() {
        return Err(AssemblyError::new(AssemblyErrorKind::NoSegments).into());
    }
    if !(narration_seconds.is_finite() && narration_seconds > 0.0) {
        return Err(AssemblyError::new(AssemblyErrorKind::Narration(format!(
            "length must be positive, got {}",
            narration_seconds
        )))
        .into());
    }

    let windows = match alignment {
        Some(track) => aligned_windows(segments, track, narration_seconds)?,
        None => scaled_windows(segments, narration_seconds),
    };
    Ok(windows
        .into_iter()
        .map(|w| w.max(MIN_WINDOW_SECONDS))
        .collect())
}

fn aligned_windows(
    segments: &[ClipSegment],
    track: &AlignmentTrack,
    narration_seconds: f64,
) -> ReelsmithResult<Vec<f64>> {
    let script = segments
        .iter()
        .map(|s| s.narration().as_str())
        .collect::<Vec<_>>()
        .join(" ");
    track.ensure_covers(&script)?;

    let end = narration_seconds.max(track.duration_seconds());
    let words = track.words();
    let mut starts = Vec::with_capacity(segments.len());
    let mut cursor = 0;
    for (index, segment) in segments.iter().enumerate() {
        let start = if index == 0 {
            0.0
        } else {
            words.get(cursor).map(|w| *w.start()).unwrap_or(end)
        };
        starts.push(start);
        cursor += segment.word_count();
    }

    let windows = starts
        .iter()
        .enumerate()
        .map(|(i, start)| starts.get(i + 1).copied().unwrap_or(end) - start)
        .collect();
    Ok(windows)
}

fn scaled_windows(segments: &[ClipSegment], narration_seconds: f64) -> Vec<f64> {
    let planned: f64 = segments.iter().map(|s| s.target_duration_seconds()).sum();
    let scale = narration_seconds / planned;
    segments
        .iter()
        .map(|s| s.target_duration_seconds() * scale)
        .collect()
}

/// Decides how a clip of `source_seconds` fills a `window_seconds` window.
///
/// Differences within `tolerance_seconds` are left alone. Longer clips are
/// cut at their end; shorter ones are slowed down.
///
/// # Examples
///
/// ```
/// use reelsmith_assembly::fit_clip;
/// use reelsmith_interface::ClipFit;
///
/// assert_eq!(fit_clip(8.0, 8.02, 0.05), ClipFit::AsIs);
/// assert_eq!(fit_clip(8.0, 6.5, 0.05), ClipFit::Trim { seconds: 6.5 });
/// assert_eq!(fit_clip(4.0, 5.0, 0.05), ClipFit::Stretch { factor: 1.25 });
/// ```
pub fn fit_clip(source_seconds: f64, window_seconds: f64, tolerance_seconds: f64) -> ClipFit {
    let difference = source_seconds - window_seconds;
    if difference.abs() <= tolerance_seconds {
        ClipFit::AsIs
    } else if difference > 0.0 {
        ClipFit::Trim {
            seconds: window_seconds,
        }
    } else {
        ClipFit::Stretch {
            factor: window_seconds / source_seconds.max(MIN_WINDOW_SECONDS),
        }
    }
}
