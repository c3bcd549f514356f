//! `ffmpeg` and `ffprobe` adapters.

use async_trait::async_trait;
use reelsmith_error::{AssemblyError, AssemblyErrorKind, ReelsmithResult};
use reelsmith_interface::{ClipFit, MediaProbe, MuxPlan, Muxer};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Characters of tool stderr kept in error messages.
const STDERR_TAIL_CHARS: usize = 1200;

/// Measures media length with `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: PathBuf,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeProbe {
    /// Uses the given `ffprobe` executable.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Reads the container duration from `ffprobe -of json -show_entries format=duration` output.
///
/// # Examples
///
/// ```
/// use reelsmith_assembly::parse_probe_duration;
///
/// let seconds = parse_probe_duration(r#"{"format": {"duration": "8.041000"}}"#).unwrap();
/// assert!((seconds - 8.041).abs() < 1e-9);
/// assert!(parse_probe_duration(r#"{"format": {}}"#).is_err());
/// ```
pub fn parse_probe_duration(stdout: &str) -> ReelsmithResult<f64> {
    let parsed: ProbeOutput = serde_json::from_str(stdout)
        .map_err(|e| AssemblyError::new(AssemblyErrorKind::Probe(e.to_string())))?;
    let raw = parsed
        .format
        .duration
        .ok_or_else(|| AssemblyError::new(AssemblyErrorKind::Probe("no duration".to_string())))?;
    let seconds: f64 = raw.trim().parse().map_err(|_| {
        AssemblyError::new(AssemblyErrorKind::Probe(format!("unreadable duration {:?}", raw)))
    })?;
    if !(seconds.is_finite() && seconds >= 0.0) {
        return Err(AssemblyError::new(AssemblyErrorKind::Probe(format!(
            "invalid duration {}",
            seconds
        )))
        .into());
    }
    Ok(seconds)
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    async fn duration_seconds(&self, path: &Path) -> ReelsmithResult<f64> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "json",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                AssemblyError::new(AssemblyErrorKind::Launch {
                    tool: self.binary.display().to_string(),
                    message: e.to_string(),
                })
            })?;

        if !output.status.success() {
            return Err(AssemblyError::new(AssemblyErrorKind::ToolFailed {
                tool: self.binary.display().to_string(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            })
            .into());
        }

        let seconds = parse_probe_duration(&String::from_utf8_lossy(&output.stdout))?;
        debug!(seconds, "Probed media duration");
        Ok(seconds)
    }
}

/// Renders the final video with `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    binary: PathBuf,
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegMuxer {
    /// Uses the given `ffmpeg` executable.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    #[tracing::instrument(skip(self, plan), fields(clips = plan.clips.len(), output = %plan.output.display()))]
    async fn mux(&self, plan: &MuxPlan) -> ReelsmithResult<PathBuf> {
        if let Some(parent) = plan.output.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AssemblyError::new(AssemblyErrorKind::Launch {
                    tool: self.binary.display().to_string(),
                    message: format!("cannot create {}: {}", parent.display(), e),
                })
            })?;
        }

        let args = mux_args(plan);
        debug!(args = ?args, "Running ffmpeg");
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                AssemblyError::new(AssemblyErrorKind::Launch {
                    tool: self.binary.display().to_string(),
                    message: e.to_string(),
                })
            })?;

        if !output.status.success() {
            return Err(AssemblyError::new(AssemblyErrorKind::ToolFailed {
                tool: self.binary.display().to_string(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            })
            .into());
        }

        info!(output = %plan.output.display(), "Rendered final video");
        Ok(plan.output.clone())
    }
}

/// Builds the `ffmpeg` argument list for a mux plan.
///
/// Inputs are the clips in order, then the narration, then the music looped
/// indefinitely. Clips are fitted to their windows, concatenated, and
/// optionally overlaid with subtitles. Narration enters the mix at unity and
/// `amix` runs with `normalize=0`, so adding music never lowers it. The output
/// is cut to the narration length.
pub fn mux_args(plan: &MuxPlan) -> Vec<String> {
    let mut args: Vec<String> = vec!["-hide_banner".into(), "-y".into()];
    for clip in &plan.clips {
        args.push("-i".into());
        args.push(clip.source.display().to_string());
    }
    let narration_input = plan.clips.len();
    args.push("-i".into());
    args.push(plan.narration.display().to_string());
    if let Some(music) = &plan.music {
        args.extend(["-stream_loop".into(), "-1".into(), "-i".into()]);
        args.push(music.display().to_string());
    }

    let mut filters: Vec<String> = plan
        .clips
        .iter()
        .enumerate()
        .map(|(i, clip)| {
            let fit = match clip.fit {
                ClipFit::AsIs => "setpts=PTS-STARTPTS".to_string(),
                ClipFit::Trim { seconds } => {
                    format!("trim=duration={:.3},setpts=PTS-STARTPTS", seconds)
                }
                ClipFit::Stretch { factor } => format!(
                    "setpts={:.6}*(PTS-STARTPTS),trim=duration={:.3}",
                    factor, clip.window_seconds
                ),
            };
            format!("[{}:v]{},setsar=1[v{}]", i, fit, i)
        })
        .collect();

    let inputs: String = (0..plan.clips.len()).map(|i| format!("[v{}]", i)).collect();
    filters.push(format!(
        "{}concat=n={}:v=1:a=0[vcat]",
        inputs,
        plan.clips.len()
    ));

    let video_label = match &plan.subtitles {
        Some(subtitles) => {
            let mut filter = format!("[vcat]subtitles=filename={}", escape_filter_value(subtitles));
            if let Some(fonts) = &plan.fonts_dir {
                filter.push_str(&format!(":fontsdir={}", escape_filter_value(fonts)));
            }
            filter.push_str("[vout]");
            filters.push(filter);
            "[vout]"
        }
        None => "[vcat]",
    };

    let audio_label = match &plan.music {
        Some(_) => {
            filters.push(format!("[{}:a]volume=1.0[narr]", narration_input));
            filters.push(format!(
                "[{}:a]volume={:.3}[music]",
                narration_input + 1,
                plan.music_level
            ));
            filters.push(
                "[narr][music]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[aout]"
                    .to_string(),
            );
            "[aout]".to_string()
        }
        None => format!("{}:a", narration_input),
    };

    args.push("-filter_complex".into());
    args.push(filters.join(";"));
    args.extend(["-map".into(), video_label.into(), "-map".into(), audio_label]);

    let encoder = &plan.encoder;
    args.extend([
        "-c:v".into(),
        encoder.video_codec().clone(),
        "-crf".into(),
        encoder.crf().to_string(),
        "-preset".into(),
        encoder.preset().clone(),
        "-c:a".into(),
        encoder.audio_codec().clone(),
        "-b:a".into(),
        encoder.audio_bitrate().clone(),
        "-movflags".into(),
        "+faststart".into(),
        "-t".into(),
        format!("{:.3}", plan.narration_seconds),
    ]);
    args.push(plan.output.display().to_string());
    args
}

/// Escapes a path for use as a filter option value.
fn escape_filter_value(path: &Path) -> String {
    let raw = path.display().to_string();
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | ':' | '\'' | '[' | ']' | ',' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    trimmed
        .chars()
        .skip(count.saturating_sub(STDERR_TAIL_CHARS))
        .collect()
}
