//! Greedy chunk planner.

use crate::clock::WordClock;
use reelsmith_core::{
    AlignmentTrack, BeatSpan, ClipSegment, PlanningConfig, ScriptBeat, SplitPart, SuspenseTag,
};
use reelsmith_error::{PlanningError, PlanningErrorKind, ReelsmithResult};
use std::ops::Range;
use tracing::{debug, instrument, warn};

/// Slack for floating point sums compared against the clip ceiling.
const EPSILON: f64 = 1e-9;

/// A whole beat, or one piece of a force-split beat.
#[derive(Debug)]
struct Unit<'a> {
    beat: &'a ScriptBeat,
    part: Option<SplitPart>,
    text: String,
    seconds: f64,
}

/// Units that will become one segment.
#[derive(Debug, Default)]
struct Group {
    units: Vec<usize>,
    seconds: f64,
    pause: f64,
}

impl Group {
    fn is_split(&self, units: &[Unit<'_>]) -> bool {
        self.units.iter().any(|&u| units[u].part.is_some())
    }
}

/// Plans script beats into provider-sized clip segments.
///
/// Planning is pure: the same beats and configuration always produce the same
/// segments, and nothing outside the inputs is read.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{PlanningConfig, ScriptBeat, SuspenseTag};
/// use reelsmith_planner::ChunkPlanner;
///
/// let twenty_words = "one two three four five six seven eight nine ten \
///                     one two three four five six seven eight nine ten";
/// let beats: Vec<_> = (1..=3)
///     .map(|i| ScriptBeat::new(i, twenty_words, SuspenseTag::Build))
///     .collect();
///
/// let config = PlanningConfig::builder().max_clip_seconds(20.0).build().unwrap();
/// let segments = ChunkPlanner::new(config).unwrap().plan(&beats).unwrap();
///
/// assert_eq!(segments.len(), 2);
/// assert_eq!(*segments[0].target_duration_seconds(), 16.0);
/// assert_eq!(*segments[1].start_offset_seconds(), 16.0);
/// ```
#[derive(Debug, Clone)]
pub struct ChunkPlanner {
    config: PlanningConfig,
}

impl ChunkPlanner {
    /// Creates a planner after validating its configuration.
    pub fn new(config: PlanningConfig) -> ReelsmithResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in force.
    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    /// Plans segments using the estimated reading rate.
    ///
    /// # Errors
    ///
    /// Returns a [`PlanningError`] for empty scripts, empty beats, unordered
    /// ordinals, or a word that alone exceeds the clip ceiling.
    #[instrument(skip(self, beats), fields(beats = beats.len(), max_clip_seconds = *self.config.max_clip_seconds()))]
    pub fn plan(&self, beats: &[ScriptBeat]) -> ReelsmithResult<Vec<ClipSegment>> {
        validate_beats(beats)?;
        let clock = WordClock::estimated(*self.config.reading_rate_wps());
        self.plan_with_clock(beats, &clock)
    }

    /// Plans segments using measured narration timing instead of estimates.
    ///
    /// The track must hold exactly one entry per script word. Measured gaps
    /// already carry the narrator's pauses, so no extra pause is added.
    ///
    /// # Errors
    ///
    /// Returns an alignment error when the track does not match the script,
    /// and [`PlanningErrorKind::Silent`] when a segment would get no
    /// narration time because its words all have zero length.
    #[instrument(skip(self, beats, track), fields(beats = beats.len(), words = track.len()))]
    pub fn plan_with_alignment(
        &self,
        beats: &[ScriptBeat],
        track: &AlignmentTrack,
    ) -> ReelsmithResult<Vec<ClipSegment>> {
        validate_beats(beats)?;
        let total_words = beats.iter().map(ScriptBeat::word_count).sum();
        let clock = WordClock::measured(track, total_words)?;
        self.plan_with_clock(beats, &clock)
    }

    fn plan_with_clock(
        &self,
        beats: &[ScriptBeat],
        clock: &WordClock,
    ) -> ReelsmithResult<Vec<ClipSegment>> {
        let units = self.units(beats, clock)?;
        let mut groups = self.pack(&units);
        self.rebalance(&units, &mut groups);
        if clock.adds_pauses() {
            self.add_reveal_pauses(&units, &mut groups);
        }
        ensure_audible(&units, &groups)?;
        let segments = build_segments(&units, &groups)?;
        debug!(segments = segments.len(), "Planned clip segments");
        Ok(segments)
    }

    /// Turns beats into units, force-splitting beats longer than the ceiling.
    fn units<'a>(
        &self,
        beats: &'a [ScriptBeat],
        clock: &WordClock,
    ) -> ReelsmithResult<Vec<Unit<'a>>> {
        let max = *self.config.max_clip_seconds();
        let mut units = Vec::with_capacity(beats.len());
        let mut offset = 0;

        for beat in beats {
            let words: Vec<&str> = beat.narration().split_whitespace().collect();
            let range = offset..offset + words.len();
            offset = range.end;

            let seconds = clock.span(&range);
            if seconds <= max + EPSILON {
                units.push(Unit {
                    beat,
                    part: None,
                    text: beat.narration().trim().to_string(),
                    seconds,
                });
                continue;
            }

            let pieces = split_range(range.clone(), clock, max).map_err(|word_index| {
                PlanningError::new(PlanningErrorKind::Unsplittable {
                    ordinal: *beat.ordinal(),
                    word: words[word_index - range.start].to_string(),
                    max_clip_seconds: max.to_string(),
                })
            })?;
            debug!(
                ordinal = *beat.ordinal(),
                seconds,
                pieces = pieces.len(),
                "Force-split beat longer than the clip ceiling"
            );

            let count = pieces.len() as u16;
            for (i, piece) in pieces.into_iter().enumerate() {
                let local = (piece.start - range.start)..(piece.end - range.start);
                units.push(Unit {
                    beat,
                    part: Some(SplitPart {
                        index: i as u16 + 1,
                        count,
                    }),
                    text: words[local].join(" "),
                    seconds: clock.span(&piece),
                });
            }
        }
        Ok(units)
    }

    /// Greedily fills segments in beat order.
    fn pack(&self, units: &[Unit<'_>]) -> Vec<Group> {
        let max = *self.config.max_clip_seconds();
        let max_beats = *self.config.max_beats_per_clip();
        let mut groups: Vec<Group> = Vec::new();

        for (i, unit) in units.iter().enumerate() {
            let joins = match groups.last() {
                Some(open) => {
                    unit.part.is_none()
                        && !open.is_split(units)
                        && !mandatory_boundary(&units[i - 1], unit)
                        && open.units.len() < max_beats
                        && open.seconds + unit.seconds <= max + EPSILON
                }
                None => false,
            };

            if joins {
                if let Some(open) = groups.last_mut() {
                    open.units.push(i);
                    open.seconds += unit.seconds;
                    continue;
                }
            }
            groups.push(Group {
                units: vec![i],
                seconds: unit.seconds,
                pause: 0.0,
            });
        }
        groups
    }

    /// Moves beats from a predecessor into segments short of the minimum.
    fn rebalance(&self, units: &[Unit<'_>], groups: &mut [Group]) {
        let max = *self.config.max_clip_seconds();
        let min_beats = *self.config.min_beats_per_clip();
        let max_beats = *self.config.max_beats_per_clip();

        for gi in 1..groups.len() {
            let (before, after) = groups.split_at_mut(gi);
            let previous = &mut before[gi - 1];
            let current = &mut after[0];
            if current.is_split(units) || previous.is_split(units) {
                continue;
            }

            while current.units.len() < min_beats && previous.units.len() > min_beats {
                let candidate = previous.units[previous.units.len() - 1];
                let first = current.units[0];
                let fits = current.units.len() < max_beats
                    && current.seconds + units[candidate].seconds <= max + EPSILON;
                if !fits || mandatory_boundary(&units[candidate], &units[first]) {
                    break;
                }
                previous.units.pop();
                previous.seconds -= units[candidate].seconds;
                current.units.insert(0, candidate);
                current.seconds += units[candidate].seconds;
            }
        }

        for group in groups.iter() {
            if group.units.len() < min_beats && !group.is_split(units) && groups.len() > 1 {
                let unit = &units[group.units[0]];
                warn!(
                    ordinal = *unit.beat.ordinal(),
                    beats = group.units.len(),
                    min_beats,
                    "Segment carries fewer beats than the pacing minimum"
                );
            }
        }
    }

    /// Holds a short silence after a tension beat that precedes a reveal.
    fn add_reveal_pauses(&self, units: &[Unit<'_>], groups: &mut [Group]) {
        let max = *self.config.max_clip_seconds();
        let pause = *self.config.reveal_pause_seconds();
        for gi in 0..groups.len().saturating_sub(1) {
            let last = &units[groups[gi].units[groups[gi].units.len() - 1]];
            let next = &units[groups[gi + 1].units[0]];
            if mandatory_boundary(last, next) {
                let room = (max - groups[gi].seconds).max(0.0);
                groups[gi].pause = pause.min(room);
            }
        }
    }
}

/// A reveal directly after a tension beat always starts a new segment.
fn mandatory_boundary(previous: &Unit<'_>, next: &Unit<'_>) -> bool {
    previous.beat.ordinal() != next.beat.ordinal()
        && *previous.beat.suspense() == SuspenseTag::Tension
        && *next.beat.suspense() == SuspenseTag::Reveal
}

fn validate_beats(beats: &[ScriptBeat]) -> Result<(), PlanningError> {
    if beats.is_empty() {
        return Err(PlanningError::new(PlanningErrorKind::NoBeats));
    }
    let mut previous: Option<u32> = None;
    for beat in beats {
        if beat.word_count() == 0 {
            return Err(PlanningError::new(PlanningErrorKind::EmptyBeat(
                *beat.ordinal(),
            )));
        }
        if let Some(previous) = previous {
            if *beat.ordinal() <= previous {
                return Err(PlanningError::new(PlanningErrorKind::OrdinalOrder {
                    previous,
                    current: *beat.ordinal(),
                }));
            }
        }
        previous = Some(*beat.ordinal());
    }
    Ok(())
}

/// Splits a word range at the boundary nearest its time midpoint until every
/// piece fits. On failure returns the global index of a word that alone
/// exceeds the ceiling.
fn split_range(
    range: Range<usize>,
    clock: &WordClock,
    max: f64,
) -> Result<Vec<Range<usize>>, usize> {
    let seconds = clock.span(&range);
    if seconds <= max + EPSILON {
        return Ok(vec![range]);
    }
    if range.len() <= 1 {
        return Err(range.start);
    }

    let half = seconds / 2.0;
    let cut = (range.start + 1..range.end)
        .min_by(|&a, &b| {
            let da = (clock.span(&(range.start..a)) - half).abs();
            let db = (clock.span(&(range.start..b)) - half).abs();
            da.total_cmp(&db)
        })
        .unwrap_or(range.start + range.len() / 2);

    let mut pieces = split_range(range.start..cut, clock, max)?;
    pieces.extend(split_range(cut..range.end, clock, max)?);
    Ok(pieces)
}

/// Measured timing can give words zero length. A segment made only of such
/// words cannot be generated, and it only forms where a split, a reveal
/// boundary or the beat limit keeps it apart from its neighbours.
fn ensure_audible(units: &[Unit<'_>], groups: &[Group]) -> Result<(), PlanningError> {
    match groups.iter().find(|g| g.seconds + g.pause <= EPSILON) {
        Some(group) => Err(PlanningError::new(PlanningErrorKind::Silent(
            *units[group.units[0]].beat.ordinal(),
        ))),
        None => Ok(()),
    }
}

fn build_segments(units: &[Unit<'_>], groups: &[Group]) -> ReelsmithResult<Vec<ClipSegment>> {
    let mut segments = Vec::with_capacity(groups.len());
    let mut offset = 0.0;

    for (index, group) in groups.iter().enumerate() {
        let members: Vec<&Unit<'_>> = group.units.iter().map(|&u| &units[u]).collect();
        let first = members[0];
        let last = members[members.len() - 1];

        let narration = members
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let duration = group.seconds + group.pause;

        let segment = ClipSegment::builder()
            .id(format!("seg-{:03}", index + 1))
            .index(index)
            .beats(BeatSpan {
                first: *first.beat.ordinal(),
                last: *last.beat.ordinal(),
            })
            .part(first.part)
            .narration(narration)
            .start_offset_seconds(offset)
            .target_duration_seconds(duration)
            .pause_after_seconds(group.pause)
            .visual_directive(visual_directive(&members))
            .audio_directive(audio_directive(&members))
            .build()?;

        offset += duration;
        segments.push(segment);
    }
    Ok(segments)
}

fn visual_directive(members: &[&Unit<'_>]) -> String {
    let seeds = distinct(members.iter().filter_map(|u| u.beat.visual_seed().as_deref()));
    if seeds.is_empty() {
        members
            .iter()
            .map(|u| u.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        seeds.join("; ")
    }
}

fn audio_directive(members: &[&Unit<'_>]) -> String {
    let moods = distinct(members.iter().filter_map(|u| u.beat.audio_mood().as_deref()));
    if moods.is_empty() {
        let tags: Vec<String> = members.iter().map(|u| u.beat.suspense().to_string()).collect();
        distinct(tags.iter().map(String::as_str)).join(", ")
    } else {
        moods.join("; ")
    }
}

/// Keeps the first occurrence of each value, in order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}
