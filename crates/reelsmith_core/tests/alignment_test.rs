//! Tests for alignment track validation and highlight queries.

use reelsmith_core::{AlignmentTrack, CharacterAlignment, WordTiming};
use reelsmith_error::AlignmentErrorKind;

fn two_words() -> AlignmentTrack {
    AlignmentTrack::new(vec![
        WordTiming::new("a", 0.0, 1.0),
        WordTiming::new("b", 1.0, 2.0),
    ])
    .unwrap()
}

#[test]
fn test_highlight_follows_half_open_intervals() {
    let track = two_words();

    let at = |t: f64| track.highlighted_at(t).map(|w| w.word().clone());
    assert_eq!(at(0.5), Some("a".to_string()));
    assert_eq!(at(1.5), Some("b".to_string()));
    assert_eq!(at(2.5), None);

    // Boundaries belong to the word that starts there.
    assert_eq!(at(0.0), Some("a".to_string()));
    assert_eq!(at(1.0), Some("b".to_string()));
    assert_eq!(at(2.0), None);
}

#[test]
fn test_gap_between_words_highlights_nothing() {
    let track = AlignmentTrack::new(vec![
        WordTiming::new("slow", 0.0, 0.4),
        WordTiming::new("down", 0.9, 1.3),
    ])
    .unwrap();
    assert!(track.highlighted_at(0.6).is_none());
    assert_eq!(track.highlighted_index_at(1.0), Some(1));
}

#[test]
fn test_overlap_is_a_defect() {
    let err = AlignmentTrack::new(vec![
        WordTiming::new("a", 0.0, 1.2),
        WordTiming::new("b", 1.0, 2.0),
    ])
    .unwrap_err();
    assert!(matches!(err.kind, AlignmentErrorKind::Overlap { index: 1, .. }));
}

#[test]
fn test_out_of_order_is_a_defect() {
    let err = AlignmentTrack::new(vec![
        WordTiming::new("a", 1.0, 1.0),
        WordTiming::new("b", 0.5, 0.8),
    ])
    .unwrap_err();
    assert!(matches!(err.kind, AlignmentErrorKind::OutOfOrder { index: 1, .. }));
}

#[test]
fn test_negative_span_is_a_defect() {
    let err = AlignmentTrack::new(vec![WordTiming::new("a", 1.0, 0.5)]).unwrap_err();
    assert!(matches!(err.kind, AlignmentErrorKind::NegativeSpan { index: 0, .. }));
}

#[test]
fn test_deserialize_validates_and_accepts_triples() {
    let track: AlignmentTrack =
        serde_json::from_str(r#"[["a", 0.0, 1.0], {"word": "b", "start": 1.0, "end": 2.0}]"#)
            .unwrap();
    assert_eq!(track.len(), 2);
    assert_eq!(track.duration_seconds(), 2.0);

    let overlapping = serde_json::from_str::<AlignmentTrack>(r#"[["a", 0.0, 1.5], ["b", 1.0, 2.0]]"#);
    assert!(overlapping.is_err());
}

#[test]
fn test_coverage_against_narration() {
    let track = two_words();
    assert!(track.ensure_covers("a b").is_ok());
    let err = track.ensure_covers("a b c").unwrap_err();
    assert!(matches!(
        err.kind,
        AlignmentErrorKind::Coverage { aligned: 2, expected: 3 }
    ));
}

#[test]
fn test_words_from_character_timing() {
    let text = "Hi you";
    let alignment = CharacterAlignment {
        characters: text.chars().map(|c| c.to_string()).collect(),
        character_start_times_seconds: vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5],
        character_end_times_seconds: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
    };

    let track = AlignmentTrack::from_characters(&alignment).unwrap();
    let words: Vec<_> = track
        .words()
        .iter()
        .map(|w| (w.word().as_str(), *w.start(), *w.end()))
        .collect();
    assert_eq!(words, vec![("Hi", 0.0, 0.2), ("you", 0.3, 0.6)]);
}

#[test]
fn test_character_arrays_must_match() {
    let alignment = CharacterAlignment {
        characters: vec!["a".to_string()],
        character_start_times_seconds: vec![],
        character_end_times_seconds: vec![0.1],
    };
    let err = AlignmentTrack::from_characters(&alignment).unwrap_err();
    assert!(matches!(err.kind, AlignmentErrorKind::CharacterArrays(_)));
}
