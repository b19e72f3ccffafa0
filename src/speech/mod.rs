use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

pub mod espeak;
pub mod openai;

pub use espeak::EspeakSpeech;
pub use openai::OpenAiSpeech;

/// Trait for turning narration text into an audio file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize `text` into `output_path` using `voice`
    async fn synthesize(&self, text: &str, output_path: &Path, voice: &str) -> Result<()>;

    /// Name of this synthesizer
    fn provider_name(&self) -> &'static str;
}

/// Tries a primary synthesizer once and falls back to a second one on any failure
pub struct FallbackSpeech {
    primary: Box<dyn SpeechProvider>,
    fallback: Box<dyn SpeechProvider>,
}

impl FallbackSpeech {
    pub fn new(primary: Box<dyn SpeechProvider>, fallback: Box<dyn SpeechProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl SpeechProvider for FallbackSpeech {
    async fn synthesize(&self, text: &str, output_path: &Path, voice: &str) -> Result<()> {
        match self.primary.synthesize(text, output_path, voice).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    "{} synthesis failed ({:#}), falling back to {}",
                    self.primary.provider_name(),
                    e,
                    self.fallback.provider_name()
                );
                self.fallback.synthesize(text, output_path, voice).await
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        self.primary.provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn provider(name: &'static str, succeed: bool, calls: usize) -> MockSpeechProvider {
        let mut mock = MockSpeechProvider::new();
        mock.expect_provider_name().return_const(name);
        mock.expect_synthesize().times(calls).returning(move |_, _, _| {
            if succeed {
                Ok(())
            } else {
                Err(anyhow::anyhow!("{} unavailable", name))
            }
        });
        mock
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let speech = FallbackSpeech::new(
            Box::new(provider("primary", true, 1)),
            Box::new(provider("fallback", true, 0)),
        );
        let path = PathBuf::from("voice.mp3");
        assert!(speech.synthesize("hello", &path, "alloy").await.is_ok());
    }

    #[tokio::test]
    async fn test_primary_failure_uses_fallback_once() {
        let speech = FallbackSpeech::new(
            Box::new(provider("primary", false, 1)),
            Box::new(provider("fallback", true, 1)),
        );
        let path = PathBuf::from("voice.mp3");
        assert!(speech.synthesize("hello", &path, "alloy").await.is_ok());
    }

    #[tokio::test]
    async fn test_both_failing_propagates() {
        let speech = FallbackSpeech::new(
            Box::new(provider("primary", false, 1)),
            Box::new(provider("fallback", false, 1)),
        );
        let path = PathBuf::from("voice.mp3");
        let err = speech.synthesize("hello", &path, "alloy").await.unwrap_err();
        assert!(err.to_string().contains("fallback unavailable"));
    }
}
