use anyhow::{Context, Result};
use console::style;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::assemble::{Compositor, FfmpegCompositor, FfprobeProbe, MediaProbe, VideoAssembler};
use crate::config::{Config, Credentials};
use crate::media::{
    Downloader, FetchOutcome, HttpDownloader, MediaKind, MediaLibrary, PexelsSource, PixabaySource,
    StockSource,
};
use crate::script::{generate_script_bundle, OpenAiChat, ScriptBundle, TextGenerator};
use crate::speech::{EspeakSpeech, FallbackSpeech, OpenAiSpeech, SpeechProvider};
use crate::thumbnail::ThumbnailRenderer;
use crate::upload::{UploadOutcome, UploadRequest, Uploader, YoutubeUploader};
use crate::utils::{cycle_stamp, format_duration};
use crate::MoneyMindError;

/// Topics a cycle picks from when none is given
pub const TOPICS: [&str; 4] = [
    "5 passive income ideas for teens",
    "How to save and invest your first $100",
    "The brutal truth about working a 9-5",
    "How the rich think about money",
];

/// Pick a topic from the rotation at random
pub fn choose_topic() -> &'static str {
    TOPICS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(TOPICS[0])
}

/// Steps of a cycle, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    GenerateScript,
    Synthesize,
    FetchMedia,
    FetchMusic,
    RenderThumbnail,
    AssembleLong,
    AssembleShort,
    Upload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::GenerateScript => "Generating scripts",
            Stage::Synthesize => "Synthesizing narration",
            Stage::FetchMedia => "Fetching stock clips",
            Stage::FetchMusic => "Fetching music",
            Stage::RenderThumbnail => "Rendering thumbnail",
            Stage::AssembleLong => "Assembling long video",
            Stage::AssembleShort => "Assembling short video",
            Stage::Upload => "Uploading",
        };
        write!(f, "{}", label)
    }
}

/// Everything one cycle produced
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub stamp: String,
    pub topic: String,
    pub title: String,
    pub long_narration: PathBuf,
    pub short_narration: PathBuf,
    pub clips: Vec<PathBuf>,
    pub music: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
    pub long_video: PathBuf,
    pub short_video: PathBuf,
    pub uploads: Vec<UploadOutcome>,
}

/// Collaborators a pipeline is built from
pub struct Components {
    pub generator: Box<dyn TextGenerator>,
    pub speech: Box<dyn SpeechProvider>,
    pub downloader: Box<dyn Downloader>,
    /// Video sources with the number of clips to take from each, queried in order
    pub video_sources: Vec<(Box<dyn StockSource>, usize)>,
    pub music_source: Option<Box<dyn StockSource>>,
    pub thumbnails: ThumbnailRenderer,
    pub probe: Box<dyn MediaProbe>,
    pub compositor: Box<dyn Compositor>,
    pub uploader: Box<dyn Uploader>,
}

/// Runs one topic through script, narration, media, thumbnail, assembly and upload
pub struct CyclePipeline {
    config: Config,
    generator: Box<dyn TextGenerator>,
    speech: Box<dyn SpeechProvider>,
    library: MediaLibrary,
    video_sources: Vec<(Box<dyn StockSource>, usize)>,
    music_source: Option<Box<dyn StockSource>>,
    thumbnails: ThumbnailRenderer,
    assembler: VideoAssembler,
    uploader: Box<dyn Uploader>,
    announce: bool,
}

impl CyclePipeline {
    pub fn new(config: Config, components: Components) -> Self {
        let library =
            MediaLibrary::new(&config.paths.clips, &config.paths.music, components.downloader);
        let assembler = VideoAssembler::new(
            components.probe,
            components.compositor,
            config.fallback_image_path(),
            config.render.min_clip_seconds,
        );

        Self {
            generator: components.generator,
            speech: components.speech,
            library,
            video_sources: components.video_sources,
            music_source: components.music_source,
            thumbnails: components.thumbnails,
            assembler,
            uploader: components.uploader,
            announce: true,
            config,
        }
    }

    /// Wire up the real HTTP, ffmpeg and font backed collaborators
    pub fn from_config(
        config: Config,
        credentials: &Credentials,
        show_progress: bool,
    ) -> Result<Self> {
        let openai_key = credentials
            .openai_key
            .clone()
            .ok_or(MoneyMindError::MissingCredential("CHATGPT_KEY"))?;

        let speech = FallbackSpeech::new(
            Box::new(OpenAiSpeech::new(&config.openai, openai_key.clone())),
            Box::new(EspeakSpeech::new(config.openai.fallback_language.clone())),
        );

        let mut video_sources: Vec<(Box<dyn StockSource>, usize)> = Vec::new();
        match &credentials.pexels_key {
            Some(key) => video_sources.push((
                Box::new(PexelsSource::new(key.clone())),
                config.media.pexels_videos,
            )),
            None => tracing::warn!("PEXELS_API_KEY not set, Pexels clips disabled"),
        }
        let music_source: Option<Box<dyn StockSource>> = match &credentials.pixabay_key {
            Some(key) => {
                video_sources.push((
                    Box::new(PixabaySource::new(key.clone())),
                    config.media.pixabay_videos,
                ));
                Some(Box::new(PixabaySource::new(key.clone())))
            }
            None => {
                tracing::warn!("PIXABAY_API_KEY not set, Pixabay clips and music disabled");
                None
            }
        };

        let components = Components {
            generator: Box::new(OpenAiChat::new(&config.openai, openai_key)),
            speech: Box::new(speech),
            downloader: Box::new(HttpDownloader::new(show_progress)),
            video_sources,
            music_source,
            thumbnails: ThumbnailRenderer::new(&config.render.font_path),
            probe: Box::new(FfprobeProbe),
            compositor: Box::new(FfmpegCompositor::new(config.render.clone())),
            uploader: Box::new(YoutubeUploader::from_credentials(credentials)),
        };

        Ok(Self::new(config, components).with_announce(show_progress))
    }

    /// Print progress lines to stdout
    pub fn with_announce(mut self, announce: bool) -> Self {
        self.announce = announce;
        self
    }

    fn enter(&self, stage: Stage) {
        tracing::info!(stage = ?stage, "{}", stage);
        if self.announce {
            println!("{} {}...", style("▶").cyan(), style(stage).bold());
        }
    }

    fn output_path(&self, prefix: &str, stamp: &str, extension: &str) -> PathBuf {
        self.config.paths.outputs.join(format!("{}_{}.{}", prefix, stamp, extension))
    }

    /// Run one full cycle for `topic`
    pub async fn run_cycle(&self, topic: &str) -> Result<CycleReport> {
        self.config.ensure_directories()?;
        let stamp = cycle_stamp(chrono::Utc::now());
        tracing::info!("Starting cycle {} for topic: {}", stamp, topic);

        self.enter(Stage::GenerateScript);
        let long_minutes = self.config.cycle.long_minutes;
        let bundle = generate_script_bundle(self.generator.as_ref(), topic, long_minutes)
            .await
            .context(MoneyMindError::ScriptGenerationFailed(topic.to_string()))?;

        self.enter(Stage::Synthesize);
        let (long_narration, short_narration) = self.synthesize(&bundle, &stamp).await?;

        self.enter(Stage::FetchMedia);
        let clips = self.fetch_clips(topic).await;

        self.enter(Stage::FetchMusic);
        let music = self.fetch_music().await;

        self.enter(Stage::RenderThumbnail);
        let thumbnail = self.render_thumbnail(&bundle.metadata.title, &stamp);

        self.ensure_fallback_image();

        self.enter(Stage::AssembleLong);
        let long_video = self.output_path("money_mind_long", &stamp, "mp4");
        let long = self
            .assembler
            .assemble(&long_narration, &clips, music.as_deref(), &long_video)
            .await
            .context(MoneyMindError::AssemblyFailed(long_video.display().to_string()))?;
        tracing::info!(
            "Long video: {} ({} segments, {})",
            long.path.display(),
            long.timeline.segments.len(),
            format_duration(long.timeline.duration)
        );

        self.enter(Stage::AssembleShort);
        let short_video = self.output_path("money_mind_short", &stamp, "mp4");
        let short_clips = &clips[..clips.len().min(self.config.cycle.short_clip_limit)];
        let short = self
            .assembler
            .assemble(&short_narration, short_clips, music.as_deref(), &short_video)
            .await
            .context(MoneyMindError::AssemblyFailed(short_video.display().to_string()))?;
        tracing::info!(
            "Short video: {} ({})",
            short.path.display(),
            format_duration(short.timeline.duration)
        );

        self.enter(Stage::Upload);
        let mut uploads = Vec::with_capacity(2);
        for video in [&long.path, &short.path] {
            let request = UploadRequest {
                video: video.clone(),
                title: bundle.metadata.title.clone(),
                description: bundle.metadata.description.clone(),
                tags: bundle.metadata.tags.clone(),
                thumbnail: thumbnail.clone(),
            };
            uploads.push(self.upload(&request).await);
        }

        tracing::info!("Cycle {} complete", stamp);
        Ok(CycleReport {
            stamp,
            topic: topic.to_string(),
            title: bundle.metadata.title,
            long_narration,
            short_narration,
            clips,
            music,
            thumbnail,
            long_video: long.path,
            short_video: short.path,
            uploads,
        })
    }

    async fn synthesize(&self, bundle: &ScriptBundle, stamp: &str) -> Result<(PathBuf, PathBuf)> {
        let voice = &self.config.openai.voice;
        let long_path = self.output_path("voice_long", stamp, "mp3");
        let short_path = self.output_path("voice_short", stamp, "mp3");

        let scripts = [
            (&bundle.script_long, &long_path),
            (&bundle.script_short, &short_path),
        ];
        for (text, path) in scripts {
            self.speech
                .synthesize(text, path, voice)
                .await
                .context(MoneyMindError::SpeechSynthesisFailed(path.display().to_string()))?;
        }

        Ok((long_path, short_path))
    }

    async fn fetch_clips(&self, topic: &str) -> Vec<PathBuf> {
        let mut clips = Vec::new();
        for (source, count) in &self.video_sources {
            let outcome = self
                .library
                .fetch(source.as_ref(), topic, *count, MediaKind::Video)
                .await;
            log_outcome(source.provider_name(), &outcome);
            clips.extend(outcome.into_value().unwrap_or_default());
        }
        clips
    }

    async fn fetch_music(&self) -> Option<PathBuf> {
        let source = self.music_source.as_ref()?;
        let outcome = self
            .library
            .fetch_music(
                source.as_ref(),
                &self.config.media.music_query,
                self.config.media.music_candidates,
            )
            .await;
        log_outcome(source.provider_name(), &outcome);
        let music = outcome.into_value();
        if self.announce {
            match &music {
                Some(path) => println!("  Music: {}", path.display()),
                None => println!("  Music: none"),
            }
        }
        music
    }

    fn render_thumbnail(&self, title: &str, stamp: &str) -> Option<PathBuf> {
        let path = self.config.paths.thumbnails.join(format!("thumb_{}.jpg", stamp));
        match self.thumbnails.render(title, &path) {
            Ok(report) => {
                tracing::debug!(
                    "Thumbnail drew {} lines with {:?}",
                    report.lines_rendered,
                    report.font
                );
                Some(report.path)
            }
            Err(e) => {
                tracing::warn!("Thumbnail render failed: {:#}", e);
                None
            }
        }
    }

    /// Make sure the still used for clip-less videos exists
    fn ensure_fallback_image(&self) {
        let path = self.assembler.fallback_image();
        if path.exists() {
            return;
        }
        if let Err(e) = self.thumbnails.render_fallback(path) {
            tracing::warn!("Could not create fallback image {}: {:#}", path.display(), e);
        }
    }

    async fn upload(&self, request: &UploadRequest) -> UploadOutcome {
        match self.uploader.upload(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    "{} upload of {} failed: {:#}",
                    self.uploader.platform_name(),
                    request.video.display(),
                    e
                );
                UploadOutcome::Skipped {
                    reason: format!("upload failed: {:#}", e),
                }
            }
        }
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.config.paths.outputs
    }
}

fn log_outcome<T>(provider: &str, outcome: &FetchOutcome<T>) {
    match outcome.error() {
        Some(error) => tracing::warn!("{} fetch {}: {:#}", provider, outcome.label(), error),
        None => tracing::info!("{} fetch {}", provider, outcome.label()),
    }
}
