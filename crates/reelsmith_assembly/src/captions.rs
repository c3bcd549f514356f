//! ASS karaoke captions.

use reelsmith_core::{AlignmentTrack, CaptionCue, CaptionStyle, ClipSegment, WordTiming};
use reelsmith_error::ReelsmithResult;
use std::fmt::Write;
use std::ops::Range;

const STYLE_NAME: &str = "Karaoke";
/// Length given to zero-length entries so the renderer still shows them.
const MIN_EVENT_SECONDS: f64 = 0.01;
const HIDDEN: &str = r"{\alpha&HFF&}";

/// Formats seconds as an ASS timestamp (`h:mm:ss.cc`).
///
/// Negative values clamp to zero.
///
/// # Examples
///
/// ```
/// use reelsmith_assembly::format_ass_time;
///
/// assert_eq!(format_ass_time(0.0), "0:00:00.00");
/// assert_eq!(format_ass_time(83.456), "0:01:23.46");
/// assert_eq!(format_ass_time(3725.0), "1:02:05.00");
/// assert_eq!(format_ass_time(-2.0), "0:00:00.00");
/// ```
pub fn format_ass_time(seconds: f64) -> String {
    let centis = (seconds.max(0.0) * 100.0).round() as u64;
    let cs = centis % 100;
    let total_seconds = centis / 100;
    let s = total_seconds % 60;
    let m = (total_seconds / 60) % 60;
    let h = total_seconds / 3600;
    format!("{}:{:02}:{:02}.{:02}", h, m, s, cs)
}

/// Renders caption scripts in a fixed karaoke style.
///
/// Each caption line produces one base event showing the whole line for its
/// duration, plus one event per word that draws that word in the highlight
/// colour for exactly its spoken interval. Lines never span two segments and
/// break before exceeding the style's character or duration limit.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionRenderer {
    style: CaptionStyle,
}

impl CaptionRenderer {
    /// Creates a renderer.
    pub fn new(style: CaptionStyle) -> Self {
        Self { style }
    }

    /// Style in use.
    pub fn style(&self) -> &CaptionStyle {
        &self.style
    }

    /// Renders word-highlighted captions from an alignment track.
    ///
    /// When `segments` is non-empty their narration decides where caption
    /// groups start; the track must then cover that narration word for word.
    ///
    /// # Errors
    ///
    /// Returns an alignment error when the track does not cover the segments.
    #[tracing::instrument(skip_all, fields(words = track.len(), segments = segments.len()))]
    pub fn render_alignment(
        &self,
        track: &AlignmentTrack,
        segments: &[ClipSegment],
    ) -> ReelsmithResult<String> {
        let words = track.words();
        let groups: Vec<Range<usize>> = if segments.is_empty() {
            vec![0..words.len()]
        } else {
            let script = segments
                .iter()
                .map(|s| s.narration().as_str())
                .collect::<Vec<_>>()
                .join(" ");
            track.ensure_covers(&script)?;
            let mut start = 0;
            segments
                .iter()
                .map(|s| {
                    let range = start..start + s.word_count();
                    start = range.end;
                    range
                })
                .collect()
        };

        let mut script = self.header();
        let mut lines = 0;
        for group in groups {
            let group_words = &words[group];
            for line in self.line_breaks(group_words) {
                self.push_line(&mut script, &group_words[line]);
                lines += 1;
            }
        }
        tracing::debug!(lines, "Rendered karaoke captions");
        Ok(script)
    }

    /// Renders plain captions from explicit cues, with no word highlight.
    ///
    /// # Errors
    ///
    /// Returns an alignment error for cues that overlap, run backwards or go
    /// out of order.
    pub fn render_cues(&self, cues: &[CaptionCue]) -> ReelsmithResult<String> {
        AlignmentTrack::new(
            cues.iter()
                .map(|c| WordTiming::new(c.text.clone(), c.start, c.end))
                .collect(),
        )?;

        let mut script = self.header();
        for cue in cues {
            let end = cue.end.max(cue.start + MIN_EVENT_SECONDS);
            self.push_event(&mut script, cue.start, end, &escape_text(&cue.text));
        }
        Ok(script)
    }

    /// Splits words into caption lines.
    ///
    /// A line closes before the word that would push it past
    /// `max_chars_per_line` characters (spaces included) or whose end would
    /// keep it on screen longer than `max_line_seconds`. A line always takes
    /// at least one word.
    pub fn line_breaks(&self, words: &[WordTiming]) -> Vec<Range<usize>> {
        let max_chars = *self.style.max_chars_per_line();
        let max_seconds = *self.style.max_line_seconds();

        let mut lines = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let line_start = *words[start].start();
            let mut chars = 0;
            let mut end = start;
            while end < words.len() {
                let word = &words[end];
                let added = word.word().chars().count() + usize::from(end > start);
                let too_long = chars + added > max_chars;
                let too_slow = word.end() - line_start > max_seconds;
                if end > start && (too_long || too_slow) {
                    break;
                }
                chars += added;
                end += 1;
            }
            lines.push(start..end);
            start = end;
        }
        lines
    }

    fn header(&self) -> String {
        let s = &self.style;
        let mut header = String::new();
        header.push_str("[Script Info]\n");
        header.push_str("ScriptType: v4.00+\n");
        let _ = writeln!(header, "PlayResX: {}", s.play_res_x());
        let _ = writeln!(header, "PlayResY: {}", s.play_res_y());
        header.push_str("ScaledBorderAndShadow: yes\n\n");
        header.push_str("[V4+ Styles]\n");
        header.push_str(
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
             BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
             BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
        );
        let _ = writeln!(
            header,
            "Style: {},{},{},{},&H0000FFFF,&H00000000,&H64000000,-1,0,0,0,100,100,0,0,1,{},0,5,40,40,60,1",
            STYLE_NAME,
            s.font(),
            s.font_size(),
            s.primary_colour(),
            s.outline()
        );
        header.push_str("\n[Events]\n");
        header.push_str(
            "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
        );
        header
    }

    fn position_tag(&self) -> String {
        let x = self.style.play_res_x() / 2;
        let y = (f64::from(*self.style.play_res_y()) * self.style.vertical_position()).round();
        format!(r"{{\pos({},{})\q2}}", x, y)
    }

    fn push_event(&self, script: &mut String, start: f64, end: f64, text: &str) {
        let _ = writeln!(
            script,
            "Dialogue: 0,{},{},{},,0,0,0,,{}{}",
            format_ass_time(start),
            format_ass_time(end),
            STYLE_NAME,
            self.position_tag(),
            text
        );
    }

    fn push_line(&self, script: &mut String, line: &[WordTiming]) {
        let (Some(first), Some(last)) = (line.first(), line.last()) else {
            return;
        };
        let start = *first.start();
        let end = last.end().max(start + MIN_EVENT_SECONDS);
        let texts: Vec<String> = line.iter().map(|w| escape_text(w.word())).collect();
        self.push_event(script, start, end, &texts.join(" "));

        // The highlight layer hides every word but the spoken one, so it sits
        // exactly on top of the base line.
        let highlight = format!(
            r"{{\alpha&H00&\1c{}}}",
            self.style.highlight_colour()
        );
        for (index, word) in line.iter().enumerate() {
            let mut text = String::from(HIDDEN);
            for (j, part) in texts.iter().enumerate() {
                if j > 0 {
                    text.push(' ');
                }
                if j == index {
                    text.push_str(&highlight);
                    text.push_str(part);
                    text.push_str(HIDDEN);
                } else {
                    text.push_str(part);
                }
            }
            let word_start = *word.start();
            let word_end = word.end().max(word_start + MIN_EVENT_SECONDS);
            self.push_event(script, word_start, word_end, &text);
        }
    }
}

/// Removes characters ASS would read as override blocks or line breaks.
fn escape_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '{' | '}' | '\\' | '\n' | '\r'))
        .collect()
}
