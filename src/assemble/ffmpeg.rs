use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{Compositor, MediaProbe, RenderJob, SegmentSource};
use crate::config::RenderConfig;

/// Duration lookup through ffprobe
pub struct FfprobeProbe;

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .args([
                "-v", "quiet",
                "-print_format", "json",
                "-show_format",
                &path.to_string_lossy(),
            ])
            .output()
            .await
            .context("Failed to launch ffprobe")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to analyze {} with ffprobe: {}", path.display(), error);
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        info["format"]["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .ok_or_else(|| anyhow::anyhow!("ffprobe reported no duration for {}", path.display()))
    }
}

/// Encodes a timeline with a single ffmpeg invocation
pub struct FfmpegCompositor {
    settings: RenderConfig,
}

impl FfmpegCompositor {
    pub fn new(settings: RenderConfig) -> Self {
        Self { settings }
    }

    /// Build the full ffmpeg argument list for a job
    pub fn build_args(&self, job: &RenderJob) -> Vec<String> {
        let s = &self.settings;
        let duration = seconds(job.timeline.duration);
        let mut args: Vec<String> = vec!["-y".into()];

        // Inputs 0..n-1: one per segment
        for segment in &job.timeline.segments {
            match &segment.source {
                SegmentSource::Clip(path) => {
                    args.extend(["-t".into(), seconds(segment.length)]);
                    args.extend(["-i".into(), path.to_string_lossy().into_owned()]);
                }
                SegmentSource::Still(path) => {
                    args.extend(["-loop".into(), "1".into()]);
                    args.extend(["-framerate".into(), s.fps.to_string()]);
                    args.extend(["-t".into(), seconds(segment.length)]);
                    args.extend(["-i".into(), path.to_string_lossy().into_owned()]);
                }
            }
        }

        let segment_count = job.timeline.segments.len();
        let narration_idx = segment_count;
        args.extend(["-i".into(), job.narration.to_string_lossy().into_owned()]);

        if let Some(music) = &job.music {
            args.extend(["-stream_loop".into(), "-1".into()]);
            args.extend(["-i".into(), music.to_string_lossy().into_owned()]);
        }

        let mut filter = String::new();
        for i in 0..segment_count {
            filter.push_str(&format!(
                "[{i}:v]scale=w={w}:h={h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p[v{i}];",
                i = i,
                w = s.width,
                h = s.height,
                fps = s.fps,
            ));
        }
        for i in 0..segment_count {
            filter.push_str(&format!("[v{}]", i));
        }
        // Hold the last frame if the clips run out before the narration does
        filter.push_str(&format!(
            "concat=n={}:v=1:a=0[vcat];[vcat]tpad=stop_mode=clone:stop_duration={}[vout]",
            segment_count, duration
        ));

        let audio_map = if job.music.is_some() {
            filter.push_str(&format!(
                ";[{m}:a]volume={gain},atrim=0:{d},asetpts=PTS-STARTPTS[bg];[{n}:a][bg]amix=inputs=2:duration=first:normalize=0[aout]",
                m = narration_idx + 1,
                gain = s.music_gain,
                d = duration,
                n = narration_idx,
            ));
            "[aout]".to_string()
        } else {
            format!("{}:a", narration_idx)
        };

        args.extend(["-filter_complex".into(), filter]);
        args.extend(["-map".into(), "[vout]".into()]);
        args.extend(["-map".into(), audio_map]);
        args.extend(["-t".into(), duration]);
        args.extend(["-r".into(), s.fps.to_string()]);
        args.extend(["-c:v".into(), s.video_codec.clone()]);
        args.extend(["-pix_fmt".into(), "yuv420p".into()]);
        args.extend(["-c:a".into(), s.audio_codec.clone()]);
        args.extend(["-threads".into(), s.threads.to_string()]);
        args.push(job.output.to_string_lossy().into_owned());

        args
    }
}

#[async_trait]
impl Compositor for FfmpegCompositor {
    async fn render(&self, job: &RenderJob) -> Result<()> {
        let args = self.build_args(job);
        tracing::debug!("ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to launch ffmpeg")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = error.lines().rev().take(10).collect();
            anyhow::bail!(
                "ffmpeg failed to render {}: {}",
                job.output.display(),
                tail.into_iter().rev().collect::<Vec<_>>().join("\n")
            );
        }

        Ok(())
    }
}

/// Seconds with millisecond precision, as ffmpeg expects them
fn seconds(value: f64) -> String {
    format!("{:.3}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{plan_timeline, ClipInfo};
    use std::path::PathBuf;

    fn job(clips: &[ClipInfo], music: Option<&str>) -> RenderJob {
        RenderJob {
            timeline: plan_timeline(12.0, clips, Path::new("thumbnails/fallback.jpg"), 2.0),
            narration: PathBuf::from("outputs/voice_long.mp3"),
            music: music.map(PathBuf::from),
            output: PathBuf::from("outputs/out.mp4"),
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
        args.windows(2)
            .filter(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
            .collect()
    }

    #[test]
    fn test_fallback_still_loops_for_full_duration() {
        let compositor = FfmpegCompositor::new(RenderConfig::default());
        let args = compositor.build_args(&job(&[], None));

        assert_eq!(args[0], "-y");
        assert!(args.contains(&"-loop".to_string()));
        assert_eq!(
            value_after(&args, "-i"),
            vec!["thumbnails/fallback.jpg", "outputs/voice_long.mp3"]
        );
        assert_eq!(value_after(&args, "-map"), vec!["[vout]", "1:a"]);
        assert_eq!(value_after(&args, "-t"), vec!["12.000", "12.000"]);
        assert_eq!(args.last().unwrap(), "outputs/out.mp4");
    }

    #[test]
    fn test_music_is_mixed_under_narration() {
        let compositor = FfmpegCompositor::new(RenderConfig::default());
        let clips = vec![
            ClipInfo { path: PathBuf::from("clips/a.mp4"), duration: Some(30.0) },
            ClipInfo { path: PathBuf::from("clips/b.mp4"), duration: Some(30.0) },
        ];
        let args = compositor.build_args(&job(&clips, Some("music/pix_music_1.mp3")));

        let filter = value_after(&args, "-filter_complex")[0];
        assert!(filter.contains("concat=n=2:v=1:a=0"));
        assert!(filter.contains("[3:a]volume=0.12"));
        assert!(filter.contains("[2:a][bg]amix=inputs=2:duration=first"));
        assert!(filter.contains("scale=w=1280:h=720"));
        assert_eq!(value_after(&args, "-map"), vec!["[vout]", "[aout]"]);
        assert_eq!(value_after(&args, "-c:v"), vec!["libx264"]);
        assert_eq!(value_after(&args, "-c:a"), vec!["aac"]);
        assert_eq!(value_after(&args, "-r"), vec!["24"]);
        assert_eq!(value_after(&args, "-threads"), vec!["2"]);
    }
}
