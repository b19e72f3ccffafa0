use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::MoneyMindError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output and cache directories
    pub paths: PathsConfig,

    /// Text generation and speech settings
    pub openai: OpenAiConfig,

    /// Stock media search settings
    pub media: MediaConfig,

    /// Rendering and encoding settings
    pub render: RenderConfig,

    /// Per-cycle settings
    pub cycle: CycleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Rendered videos and narration tracks
    pub outputs: PathBuf,

    /// Cached stock clips and images
    pub clips: PathBuf,

    /// Cached music tracks
    pub music: PathBuf,

    /// Rendered thumbnails
    pub thumbnails: PathBuf,

    /// Still image used when no clips are available (relative to `thumbnails`)
    pub fallback_image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL
    pub base_url: String,

    /// Chat completion model
    pub chat_model: String,

    /// Speech model
    pub tts_model: String,

    /// Narration voice
    pub voice: String,

    /// Sampling temperature for every prompt
    pub temperature: f32,

    /// Language passed to the local fallback synthesizer
    pub fallback_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Videos requested from Pexels
    pub pexels_videos: usize,

    /// Videos requested from Pixabay
    pub pixabay_videos: usize,

    /// Music search keyword
    pub music_query: String,

    /// Music candidates to choose from
    pub music_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub threads: u32,

    /// Gain applied to background music under the narration
    pub music_gain: f64,

    /// Lower bound for the time allotted to each clip, in seconds
    pub min_clip_seconds: f64,

    /// TrueType font for the thumbnail title
    pub font_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Target length of the long script in minutes
    pub long_minutes: u32,

    /// Clips reused for the short video
    pub short_clip_limit: usize,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            outputs: PathBuf::from("outputs"),
            clips: PathBuf::from("clips"),
            music: PathBuf::from("music"),
            thumbnails: PathBuf::from("thumbnails"),
            fallback_image: "fallback.jpg".to_string(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            tts_model: "gpt-4o-mini-tts".to_string(),
            voice: "alloy".to_string(),
            temperature: 0.7,
            fallback_language: "en".to_string(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            pexels_videos: 3,
            pixabay_videos: 3,
            music_query: "motivational".to_string(),
            music_candidates: 5,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 24,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            threads: 2,
            music_gain: 0.12,
            min_clip_seconds: 2.0,
            font_path: PathBuf::from("arialbd.ttf"),
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            long_minutes: 10,
            short_clip_limit: 2,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            openai: OpenAiConfig::default(),
            media: MediaConfig::default(),
            render: RenderConfig::default(),
            cycle: CycleConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, a discovered file, or defaults
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover_path(),
        };

        let config = match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                let content = fs_err::read_to_string(&path)
                    .context("Failed to read config file")?;
                serde_yaml::from_str::<Config>(&content)
                    .context("Failed to parse config file")?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Find a configuration file, if one exists
    fn discover_path() -> Option<PathBuf> {
        // Current directory first so a checkout can carry its own settings
        let local_config = PathBuf::from("money-mind.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("money-mind").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.render.width == 0 || self.render.height == 0 {
            let message = "render dimensions must be non-zero";
            return Err(MoneyMindError::ConfigError(message.into()).into());
        }

        if self.render.fps == 0 {
            return Err(MoneyMindError::ConfigError("render fps must be non-zero".into()).into());
        }

        if self.render.music_gain <= 0.0 || self.render.music_gain.is_nan() {
            return Err(MoneyMindError::ConfigError("music gain must be positive".into()).into());
        }

        if self.render.min_clip_seconds < 0.0 {
            let message = "minimum clip span cannot be negative";
            return Err(MoneyMindError::ConfigError(message.into()).into());
        }

        Ok(())
    }

    /// Create the four working directories if they are missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.paths.outputs,
            &self.paths.clips,
            &self.paths.music,
            &self.paths.thumbnails,
        ] {
            fs_err::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    /// Path of the still image used when a video has no clips
    pub fn fallback_image_path(&self) -> PathBuf {
        self.paths.thumbnails.join(&self.paths.fallback_image)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Outputs: {}", self.paths.outputs.display());
        println!("  Clips: {}", self.paths.clips.display());
        println!("  Music: {}", self.paths.music.display());
        println!("  Thumbnails: {}", self.paths.thumbnails.display());
        println!("  Chat Model: {}", self.openai.chat_model);
        println!("  Speech Model: {} ({})", self.openai.tts_model, self.openai.voice);
        println!(
            "  Render: {}x{} @ {} fps ({}/{})",
            self.render.width,
            self.render.height,
            self.render.fps,
            self.render.video_codec,
            self.render.audio_codec
        );
        println!("  Music Gain: {}", self.render.music_gain);
        println!("  Long Script: {} minutes", self.cycle.long_minutes);
    }
}

/// Secrets read from the environment
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_key: Option<String>,
    pub pexels_key: Option<String>,
    pub pixabay_key: Option<String>,
    pub youtube_api_key: Option<String>,
    pub youtube_client_id: Option<String>,
    pub youtube_client_secret: Option<String>,
    pub youtube_refresh_token: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            openai_key: env_value("CHATGPT_KEY"),
            pexels_key: env_value("PEXELS_API_KEY"),
            pixabay_key: env_value("PIXABAY_API_KEY"),
            youtube_api_key: env_value("YOUTUBE_API_KEY"),
            youtube_client_id: env_value("YT_CLIENT_ID"),
            youtube_client_secret: env_value("YT_CLIENT_SECRET"),
            youtube_refresh_token: env_value("YT_REFRESH_TOKEN"),
        }
    }

    /// Names of the expected variables that are unset
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openai_key.is_none() {
            missing.push("CHATGPT_KEY");
        }
        if self.pexels_key.is_none() {
            missing.push("PEXELS_API_KEY");
        }
        if self.pixabay_key.is_none() {
            missing.push("PIXABAY_API_KEY");
        }
        missing
    }
}

/// Read an environment variable, treating empty values as unset
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
