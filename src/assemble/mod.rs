use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod ffmpeg;

pub use ffmpeg::{FfmpegCompositor, FfprobeProbe};

use crate::media::is_image_path;

/// Where a segment's pictures come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SegmentSource {
    /// A video clip played from its start
    Clip(PathBuf),

    /// A still image held for the whole segment
    Still(PathBuf),
}

/// One entry of the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub source: SegmentSource,

    /// Time the partition gave this segment
    pub allotted: f64,

    /// Time actually used; shorter than `allotted` when a clip runs out
    pub length: f64,
}

/// Ordered plan for one video, computed before anything is encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Narration length; the rendered video is exactly this long
    pub duration: f64,
    pub segments: Vec<Segment>,
}

impl Timeline {
    pub fn is_fallback(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment { source: SegmentSource::Still(_), .. }])
    }

    pub fn total_allotted(&self) -> f64 {
        self.segments.iter().map(|s| s.allotted).sum()
    }
}

/// Probe result for one candidate clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipInfo {
    pub path: PathBuf,

    /// Playable length, or `None` when the file could not be opened as video
    pub duration: Option<f64>,
}

/// Split the narration evenly across clips, never giving a clip less than `min_span`
pub fn plan_timeline(
    narration: f64,
    clips: &[ClipInfo],
    fallback_image: &Path,
    min_span: f64,
) -> Timeline {
    if clips.is_empty() {
        return Timeline {
            duration: narration,
            segments: vec![Segment {
                source: SegmentSource::Still(fallback_image.to_path_buf()),
                allotted: narration,
                length: narration,
            }],
        };
    }

    let per_clip = min_span.max(narration / clips.len() as f64);
    let segments = clips
        .iter()
        .map(|clip| match clip.duration {
            Some(available) => Segment {
                source: SegmentSource::Clip(clip.path.clone()),
                allotted: per_clip,
                length: per_clip.min(available),
            },
            None => {
                let still = if is_image_path(&clip.path) {
                    clip.path.clone()
                } else {
                    fallback_image.to_path_buf()
                };
                Segment {
                    source: SegmentSource::Still(still),
                    allotted: per_clip,
                    length: per_clip,
                }
            }
        })
        .collect();

    Timeline {
        duration: narration,
        segments,
    }
}

/// Trait for measuring media length
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Duration in seconds of the file at `path`
    async fn duration(&self, path: &Path) -> Result<f64>;
}

/// Everything needed to encode one video
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub timeline: Timeline,
    pub narration: PathBuf,
    pub music: Option<PathBuf>,
    pub output: PathBuf,
}

/// Trait for the encoder that turns a timeline into a file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Compositor: Send + Sync {
    async fn render(&self, job: &RenderJob) -> Result<()>;
}

/// A finished video and the plan it was built from
#[derive(Debug, Clone)]
pub struct AssembledVideo {
    pub path: PathBuf,
    pub timeline: Timeline,
}

/// Times clips to narration and hands the plan to a compositor
pub struct VideoAssembler {
    probe: Box<dyn MediaProbe>,
    compositor: Box<dyn Compositor>,
    fallback_image: PathBuf,
    min_clip_seconds: f64,
}

impl VideoAssembler {
    pub fn new(
        probe: Box<dyn MediaProbe>,
        compositor: Box<dyn Compositor>,
        fallback_image: impl Into<PathBuf>,
        min_clip_seconds: f64,
    ) -> Self {
        Self {
            probe,
            compositor,
            fallback_image: fallback_image.into(),
            min_clip_seconds,
        }
    }

    pub fn fallback_image(&self) -> &Path {
        &self.fallback_image
    }

    /// Build and render a video covering the whole narration
    pub async fn assemble(
        &self,
        narration: &Path,
        clips: &[PathBuf],
        music: Option<&Path>,
        output: &Path,
    ) -> Result<AssembledVideo> {
        let duration = self
            .probe
            .duration(narration)
            .await
            .with_context(|| format!("Failed to measure narration {}", narration.display()))?;

        let mut infos = Vec::with_capacity(clips.len());
        for clip in clips {
            let duration = if is_image_path(clip) {
                None
            } else {
                match self.probe.duration(clip).await {
                    Ok(duration) if duration > 0.0 => Some(duration),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!(
                            "Could not open clip {} ({:#}), using a still",
                            clip.display(),
                            e
                        );
                        None
                    }
                }
            };
            infos.push(ClipInfo {
                path: clip.clone(),
                duration,
            });
        }

        let timeline = plan_timeline(duration, &infos, &self.fallback_image, self.min_clip_seconds);
        if clips.is_empty() {
            tracing::info!(
                "No clips available, using {} for the whole video",
                self.fallback_image.display()
            );
        }

        let job = RenderJob {
            timeline,
            narration: narration.to_path_buf(),
            music: music.map(Path::to_path_buf),
            output: output.to_path_buf(),
        };

        self.compositor.render(&job).await?;

        Ok(AssembledVideo {
            path: job.output,
            timeline: job.timeline,
        })
    }
}
