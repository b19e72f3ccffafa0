use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use super::SpeechProvider;

/// Local synthesizer: espeak-ng renders WAV, ffmpeg converts it to MP3
pub struct EspeakSpeech {
    espeak_path: String,
    language: String,
}

impl EspeakSpeech {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            espeak_path: "espeak-ng".to_string(),
            language: language.into(),
        }
    }

    /// Convert file to MP3 using ffmpeg
    async fn convert_to_mp3(&self, source_path: &Path, target_path: &Path) -> Result<()> {
        tracing::debug!("Converting {} to MP3", source_path.display());

        let output = Command::new("ffmpeg")
            .args([
                "-i", &source_path.to_string_lossy(),
                "-vn",
                "-acodec", "libmp3lame",
                "-ab", "128k",
                "-ar", "44100",
                "-y",
                &target_path.to_string_lossy(),
            ])
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to convert narration with ffmpeg: {}", error);
        }

        Ok(())
    }
}

#[async_trait]
impl SpeechProvider for EspeakSpeech {
    async fn synthesize(&self, text: &str, output_path: &Path, _voice: &str) -> Result<()> {
        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let text_path = scratch.path().join("narration.txt");
        let wav_path = scratch.path().join("narration.wav");

        fs_err::write(&text_path, text)?;

        let output = Command::new(&self.espeak_path)
            .args([
                "-v", &self.language,
                "-f", &text_path.to_string_lossy(),
                "-w", &wav_path.to_string_lossy(),
            ])
            .output()
            .await
            .context("Failed to launch espeak-ng")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("espeak-ng failed: {}", error);
        }

        self.convert_to_mp3(&wav_path, output_path).await
    }

    fn provider_name(&self) -> &'static str {
        "espeak-ng"
    }
}
