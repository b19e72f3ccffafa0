use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use super::SpeechProvider;
use crate::config::OpenAiConfig;

const SPEECH_TIMEOUT: Duration = Duration::from_secs(120);

/// Speech endpoint client
pub struct OpenAiSpeech {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
}

impl OpenAiSpeech {
    pub fn new(config: &OpenAiConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.tts_model.clone(),
        }
    }
}

/// Only a 200 carrying an audio body counts as synthesized speech
fn is_audio_response(status: reqwest::StatusCode, content_type: Option<&str>) -> bool {
    status == reqwest::StatusCode::OK
        && content_type.map(|ct| ct.starts_with("audio")).unwrap_or(false)
}

#[async_trait]
impl SpeechProvider for OpenAiSpeech {
    async fn synthesize(&self, text: &str, output_path: &Path, voice: &str) -> Result<()> {
        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(SPEECH_TIMEOUT)
            .json(&request)
            .send()
            .await
            .context("Failed to reach speech endpoint")?;

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|ct| ct.to_str().ok())
            .map(|s| s.to_string());

        if !is_audio_response(status, content_type.as_deref()) {
            anyhow::bail!(
                "Speech endpoint returned HTTP {} ({})",
                status,
                content_type.as_deref().unwrap_or("no content type")
            );
        }

        let audio = response.bytes().await?;
        tokio::fs::write(output_path, &audio)
            .await
            .with_context(|| format!("Failed to write narration to {}", output_path.display()))?;

        tracing::debug!("Wrote {} bytes of narration to {}", audio.len(), output_path.display());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "OpenAI speech"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_is_audio_response() {
        assert!(is_audio_response(StatusCode::OK, Some("audio/mpeg")));
        assert!(!is_audio_response(StatusCode::OK, Some("application/json")));
        assert!(!is_audio_response(StatusCode::OK, None));
        assert!(!is_audio_response(StatusCode::UNAUTHORIZED, Some("audio/mpeg")));
    }
}
