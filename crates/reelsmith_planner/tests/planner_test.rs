//! Tests for the chunk planner.

use reelsmith_core::{
    AlignmentTrack, ClipSegment, PlanningConfig, ScriptBeat, SplitPart, SuspenseTag, WordTiming,
};
use reelsmith_error::{PlanningErrorKind, ReelsmithError, ReelsmithErrorKind};
use reelsmith_planner::ChunkPlanner;

fn words(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn beat(ordinal: u32, word_count: usize, suspense: SuspenseTag) -> ScriptBeat {
    ScriptBeat::new(ordinal, words(word_count), suspense)
}

fn planner(max_clip_seconds: f64) -> ChunkPlanner {
    let config = PlanningConfig::builder()
        .max_clip_seconds(max_clip_seconds)
        .build()
        .unwrap();
    ChunkPlanner::new(config).unwrap()
}

fn planning_kind(err: &ReelsmithError) -> PlanningErrorKind {
    match err.kind() {
        ReelsmithErrorKind::Planning(e) => e.kind.clone(),
        other => panic!("expected planning error, got {}", other),
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Checks ordering, contiguity, the ceiling, and word coverage.
fn assert_well_formed(beats: &[ScriptBeat], segments: &[ClipSegment], max: f64) {
    let mut offset = 0.0;
    for (i, segment) in segments.iter().enumerate() {
        assert_eq!(*segment.index(), i);
        assert_eq!(segment.id(), &format!("seg-{:03}", i + 1));
        assert!(
            approx(*segment.start_offset_seconds(), offset),
            "segment {} starts at {} instead of {}",
            i,
            segment.start_offset_seconds(),
            offset
        );
        assert!(*segment.target_duration_seconds() <= max + 1e-6);
        assert!(*segment.target_duration_seconds() > 0.0);
        offset = segment.end_offset_seconds();
    }

    let planned: Vec<&str> = segments
        .iter()
        .flat_map(|s| s.narration().split_whitespace())
        .collect();
    let scripted: Vec<&str> = beats
        .iter()
        .flat_map(|b| b.narration().split_whitespace())
        .collect();
    assert_eq!(planned, scripted);

    for window in segments.windows(2) {
        assert!(window[0].beats().last <= window[1].beats().first);
    }
}

#[test]
fn test_packs_beats_up_to_ceiling() {
    // 20 words at 2.5 wps is 8 seconds per beat.
    let beats: Vec<_> = (1..=3).map(|i| beat(i, 20, SuspenseTag::Build)).collect();
    let segments = planner(20.0).plan(&beats).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].beats().first, 1);
    assert_eq!(segments[0].beats().last, 2);
    assert!(approx(*segments[0].target_duration_seconds(), 16.0));
    assert_eq!(segments[1].beats().first, 3);
    assert_eq!(segments[1].beats().last, 3);
    assert!(approx(*segments[1].target_duration_seconds(), 8.0));
    assert!(approx(*segments[0].start_offset_seconds(), 0.0));
    assert!(approx(*segments[1].start_offset_seconds(), 16.0));
}

#[test]
fn test_plans_are_well_formed() {
    let scripts: Vec<Vec<ScriptBeat>> = vec![
        vec![beat(1, 3, SuspenseTag::Hook)],
        (1..=7).map(|i| beat(i, 4 + i as usize, SuspenseTag::Build)).collect(),
        vec![
            beat(1, 12, SuspenseTag::Hook),
            beat(2, 45, SuspenseTag::Build),
            beat(3, 2, SuspenseTag::Tension),
            beat(4, 9, SuspenseTag::Reveal),
            beat(5, 18, SuspenseTag::Resolution),
        ],
        vec![beat(2, 19, SuspenseTag::Build), beat(5, 21, SuspenseTag::Build)],
    ];

    for beats in &scripts {
        let segments = planner(8.0).plan(beats).unwrap();
        assert!(!segments.is_empty());
        assert_well_formed(beats, &segments, 8.0);
    }
}

#[test]
fn test_planning_is_deterministic() {
    let beats: Vec<_> = (1..=5).map(|i| beat(i, 7, SuspenseTag::Build)).collect();
    let planner = planner(8.0);
    assert_eq!(planner.plan(&beats).unwrap(), planner.plan(&beats).unwrap());
}

#[test]
fn test_respects_max_beats_per_clip() {
    let config = PlanningConfig::builder()
        .max_clip_seconds(20.0)
        .max_beats_per_clip(2usize)
        .build()
        .unwrap();
    let beats: Vec<_> = (1..=5).map(|i| beat(i, 2, SuspenseTag::Build)).collect();
    let segments = ChunkPlanner::new(config).unwrap().plan(&beats).unwrap();

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[2].beats().first, 5);
}

#[test]
fn test_force_splits_long_beat_near_midpoint() {
    // 30 words is 12 seconds, split into two 6 second pieces.
    let beats = vec![beat(1, 30, SuspenseTag::Build), beat(2, 5, SuspenseTag::Build)];
    let segments = planner(8.0).plan(&beats).unwrap();

    assert_eq!(segments.len(), 3);
    assert_eq!(*segments[0].part(), Some(SplitPart { index: 1, count: 2 }));
    assert_eq!(*segments[1].part(), Some(SplitPart { index: 2, count: 2 }));
    assert_eq!(segments[0].word_count(), 15);
    assert_eq!(segments[1].word_count(), 15);
    assert!(approx(*segments[0].target_duration_seconds(), 6.0));
    assert!(segments[0].beats().contains(1));
    assert!(segments[1].beats().contains(1));

    // The piece after a split never absorbs the next beat.
    assert!(segments[2].part().is_none());
    assert_eq!(segments[2].beats().first, 2);
    assert_well_formed(&beats, &segments, 8.0);
}

#[test]
fn test_split_pieces_cover_every_word() {
    let beats = vec![beat(1, 101, SuspenseTag::Tension)];
    let segments = planner(8.0).plan(&beats).unwrap();

    assert!(segments.len() >= 6);
    let count = segments.len() as u16;
    for (i, segment) in segments.iter().enumerate() {
        assert_eq!(
            *segment.part(),
            Some(SplitPart {
                index: i as u16 + 1,
                count
            })
        );
    }
    assert_well_formed(&beats, &segments, 8.0);
}

#[test]
fn test_unsplittable_word_is_error() {
    let config = PlanningConfig::builder()
        .reading_rate_wps(0.1)
        .build()
        .unwrap();
    let beats = vec![ScriptBeat::new(4, "Antidisestablishmentarianism", SuspenseTag::Hook)];
    let err = ChunkPlanner::new(config).unwrap().plan(&beats).unwrap_err();

    match planning_kind(&err) {
        PlanningErrorKind::Unsplittable { ordinal, word, .. } => {
            assert_eq!(ordinal, 4);
            assert_eq!(word, "Antidisestablishmentarianism");
        }
        other => panic!("unexpected kind {}", other),
    }
    assert_eq!(err.reason_code(), "planning");
}

#[test]
fn test_empty_beat_is_error() {
    let beats = vec![beat(1, 4, SuspenseTag::Hook), ScriptBeat::new(2, "   ", SuspenseTag::Build)];
    let err = planner(8.0).plan(&beats).unwrap_err();
    assert_eq!(planning_kind(&err), PlanningErrorKind::EmptyBeat(2));
}

#[test]
fn test_no_beats_is_error() {
    let err = planner(8.0).plan(&[]).unwrap_err();
    assert_eq!(planning_kind(&err), PlanningErrorKind::NoBeats);
}

#[test]
fn test_ordinals_must_increase() {
    let beats = vec![beat(2, 4, SuspenseTag::Hook), beat(2, 4, SuspenseTag::Build)];
    let err = planner(8.0).plan(&beats).unwrap_err();
    assert_eq!(
        planning_kind(&err),
        PlanningErrorKind::OrdinalOrder {
            previous: 2,
            current: 2
        }
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = PlanningConfig::builder()
        .max_clip_seconds(0.0)
        .build()
        .unwrap();
    let err = ChunkPlanner::new(config).unwrap_err();
    assert!(matches!(
        planning_kind(&err),
        PlanningErrorKind::InvalidConfig(_)
    ));
}

#[test]
fn test_reveal_starts_new_segment_after_tension() {
    // Each beat is 2 seconds; all three would fit one 8 second clip.
    let beats = vec![
        beat(1, 5, SuspenseTag::Build),
        beat(2, 5, SuspenseTag::Tension),
        beat(3, 5, SuspenseTag::Reveal),
    ];
    let segments = planner(8.0).plan(&beats).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].beats().last, 2);
    assert_eq!(segments[1].beats().first, 3);
    assert!(approx(*segments[0].pause_after_seconds(), 0.5));
    assert!(approx(*segments[0].target_duration_seconds(), 4.5));
    assert!(approx(*segments[1].start_offset_seconds(), 4.5));
    assert_well_formed(&beats, &segments, 8.0);
}

#[test]
fn test_reveal_pause_clamped_to_ceiling() {
    // The tension clip already fills the ceiling, leaving no room for silence.
    let beats = vec![beat(1, 20, SuspenseTag::Tension), beat(2, 5, SuspenseTag::Reveal)];
    let segments = planner(8.0).plan(&beats).unwrap();

    assert_eq!(segments.len(), 2);
    assert!(approx(*segments[0].pause_after_seconds(), 0.0));
    assert!(approx(*segments[0].target_duration_seconds(), 8.0));
}

#[test]
fn test_rebalances_short_segment() {
    let config = PlanningConfig::builder()
        .min_beats_per_clip(2usize)
        .build()
        .unwrap();
    let beats = vec![
        beat(1, 5, SuspenseTag::Build),
        beat(2, 5, SuspenseTag::Build),
        beat(3, 5, SuspenseTag::Build),
        beat(4, 10, SuspenseTag::Build),
    ];
    let segments = ChunkPlanner::new(config).unwrap().plan(&beats).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].beats().last, 2);
    assert_eq!(segments[1].beats().first, 3);
    assert_eq!(segments[1].beats().last, 4);
    assert!(approx(*segments[1].start_offset_seconds(), 4.0));
    assert!(approx(*segments[1].target_duration_seconds(), 6.0));
}

#[test]
fn test_directives_come_from_beat_hints() {
    let first = ScriptBeat::builder()
        .ordinal(1u32)
        .narration("The door creaks open.")
        .suspense(SuspenseTag::Hook)
        .visual_seed(Some("a dark hallway".to_string()))
        .audio_mood(Some("creaking wood".to_string()))
        .build()
        .unwrap();
    let second = ScriptBeat::builder()
        .ordinal(2u32)
        .narration("Nobody is there.")
        .suspense(SuspenseTag::Build)
        .visual_seed(Some("an empty room".to_string()))
        .build()
        .unwrap();
    let third = ScriptBeat::new(3, "Silence follows.", SuspenseTag::Build);

    let segments = planner(8.0).plan(&[first, second, third]).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].visual_directive(), "a dark hallway; an empty room");
    assert_eq!(segments[0].audio_directive(), "creaking wood");

    let bare = planner(8.0)
        .plan(&[beat(1, 3, SuspenseTag::Tension)])
        .unwrap();
    assert_eq!(bare[0].visual_directive(), bare[0].narration());
    assert_eq!(bare[0].audio_directive(), "tension");
}

#[test]
fn test_plans_from_measured_alignment() {
    let beats = vec![
        ScriptBeat::new(1, "one two", SuspenseTag::Tension),
        ScriptBeat::new(2, "three four", SuspenseTag::Reveal),
    ];
    let track = AlignmentTrack::new(vec![
        WordTiming::new("one", 0.2, 1.0),
        WordTiming::new("two", 1.0, 2.5),
        WordTiming::new("three", 3.0, 4.0),
        WordTiming::new("four", 4.0, 5.0),
    ])
    .unwrap();

    let segments = planner(8.0).plan_with_alignment(&beats, &track).unwrap();

    assert_eq!(segments.len(), 2);
    // The first segment absorbs leading silence and the gap before "three".
    assert!(approx(*segments[0].target_duration_seconds(), 3.0));
    assert!(approx(*segments[0].pause_after_seconds(), 0.0));
    assert!(approx(*segments[1].start_offset_seconds(), 3.0));
    assert!(approx(segments[1].end_offset_seconds(), 5.0));
}

#[test]
fn test_alignment_must_cover_script() {
    let beats = vec![ScriptBeat::new(1, "one two three", SuspenseTag::Hook)];
    let track = AlignmentTrack::new(vec![WordTiming::new("one", 0.0, 0.5)]).unwrap();

    let err = planner(8.0).plan_with_alignment(&beats, &track).unwrap_err();
    assert_eq!(err.reason_code(), "alignment_defect");
}

#[test]
fn test_silent_segment_is_planning_error() {
    let beats = vec![
        ScriptBeat::new(1, "a", SuspenseTag::Tension),
        ScriptBeat::new(2, "b", SuspenseTag::Reveal),
    ];
    let track = AlignmentTrack::new(vec![
        WordTiming::new("a", 0.0, 0.0),
        WordTiming::new("b", 0.0, 1.0),
    ])
    .unwrap();

    let err = planner(8.0).plan_with_alignment(&beats, &track).unwrap_err();

    assert_eq!(err.reason_code(), "planning");
    assert_eq!(planning_kind(&err), PlanningErrorKind::Silent(1));
}

#[test]
fn test_zero_length_word_joins_its_segment() {
    let beats = vec![
        ScriptBeat::new(1, "a", SuspenseTag::Build),
        ScriptBeat::new(2, "b", SuspenseTag::Build),
    ];
    let track = AlignmentTrack::new(vec![
        WordTiming::new("a", 0.0, 0.0),
        WordTiming::new("b", 0.0, 1.0),
    ])
    .unwrap();

    let segments = planner(8.0).plan_with_alignment(&beats, &track).unwrap();

    assert_eq!(segments.len(), 1);
    assert!(approx(*segments[0].target_duration_seconds(), 1.0));
}
