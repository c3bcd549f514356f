//! JSON input files accepted by the CLI.

use reelsmith_core::{AlignmentTrack, CharacterAlignment, ScriptBeat, WordTiming};
use reelsmith_error::{JsonError, ReelsmithResult, StorageError, StorageErrorKind};
use std::path::Path;
use tracing::debug;

async fn read_text(path: &Path) -> ReelsmithResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e))).into()
    })
}

/// Reads script beats from a JSON array.
///
/// # Errors
///
/// Returns a storage error if the file cannot be read and a [`JsonError`] if
/// it is not a beat array.
pub async fn read_beats(path: impl AsRef<Path>) -> ReelsmithResult<Vec<ScriptBeat>> {
    let path = path.as_ref();
    let text = read_text(path).await?;
    let beats: Vec<ScriptBeat> = serde_json::from_str(&text)
        .map_err(|e| JsonError::new(format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), beats = beats.len(), "Read script beats");
    Ok(beats)
}

/// Reads word timings.
///
/// Accepts an array of `[word, start, end]` triples or
/// `{"word", "start", "end"}` objects, or a character alignment with
/// `characters`, `character_start_times_seconds` and
/// `character_end_times_seconds`.
///
/// # Errors
///
/// Returns a [`JsonError`] for unreadable JSON and an alignment error for
/// overlapping or unordered timings.
pub async fn read_alignment(path: impl AsRef<Path>) -> ReelsmithResult<AlignmentTrack> {
    let path = path.as_ref();
    let text = read_text(path).await?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| JsonError::new(format!("{}: {}", path.display(), e)))?;

    let track = if value.is_object() {
        let characters: CharacterAlignment = serde_json::from_value(value)
            .map_err(|e| JsonError::new(format!("{}: {}", path.display(), e)))?;
        AlignmentTrack::from_characters(&characters)?
    } else {
        let words: Vec<WordTiming> = serde_json::from_value(value)
            .map_err(|e| JsonError::new(format!("{}: {}", path.display(), e)))?;
        AlignmentTrack::new(words)?
    };
    debug!(path = %path.display(), words = track.len(), "Read word timings");
    Ok(track)
}
