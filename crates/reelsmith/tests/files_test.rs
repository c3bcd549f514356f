//! Tests for reading CLI input files.

use reelsmith::{SuspenseTag, read_alignment, read_beats};
use std::path::PathBuf;

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_reads_beats() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "beats.json",
        r#"[
            {"ordinal": 1, "narration": "The vault was empty.", "suspense": "hook"},
            {"ordinal": 2, "narration": "Nobody had a key.", "visual_seed": "old brass lock"}
        ]"#,
    );

    let beats = read_beats(&path).await.unwrap();

    assert_eq!(beats.len(), 2);
    assert_eq!(*beats[0].suspense(), SuspenseTag::Hook);
    assert_eq!(*beats[1].suspense(), SuspenseTag::Build);
    assert_eq!(beats[1].visual_seed().as_deref(), Some("old brass lock"));
}

#[tokio::test]
async fn test_reads_alignment_triples_and_objects() {
    let dir = tempfile::tempdir().unwrap();
    let triples = write(&dir, "triples.json", r#"[["a", 0.0, 1.0], ["b", 1.0, 2.0]]"#);
    let objects = write(
        &dir,
        "objects.json",
        r#"[{"word": "a", "start": 0.0, "end": 1.0}, {"word": "b", "start": 1.0, "end": 2.0}]"#,
    );

    let from_triples = read_alignment(&triples).await.unwrap();
    let from_objects = read_alignment(&objects).await.unwrap();

    assert_eq!(from_triples, from_objects);
    assert_eq!(from_triples.len(), 2);
    assert_eq!(
        from_triples.highlighted_at(1.5).map(|w| w.word().as_str()),
        Some("b")
    );
}

#[tokio::test]
async fn test_reads_character_alignment() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "chars.json",
        r#"{
            "characters": ["h", "i", " ", "y", "o"],
            "character_start_times_seconds": [0.0, 0.1, 0.2, 0.3, 0.4],
            "character_end_times_seconds": [0.1, 0.2, 0.3, 0.4, 0.5]
        }"#,
    );

    let track = read_alignment(&path).await.unwrap();

    assert_eq!(track.len(), 2);
    assert_eq!(track.words()[0].word(), "hi");
    assert_eq!(track.words()[1].word(), "yo");
}

#[tokio::test]
async fn test_overlapping_alignment_is_a_defect() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "bad.json", r#"[["a", 0.0, 1.5], ["b", 1.0, 2.0]]"#);

    let err = read_alignment(&path).await.unwrap_err();

    assert_eq!(err.reason_code(), "alignment_defect");
}

#[tokio::test]
async fn test_unreadable_files_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let garbage = write(&dir, "garbage.json", "not json");

    assert_eq!(read_beats(&garbage).await.unwrap_err().reason_code(), "json");
    assert_eq!(
        read_beats(dir.path().join("missing.json"))
            .await
            .unwrap_err()
            .reason_code(),
        "storage"
    );
}
