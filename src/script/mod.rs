use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod openai;
pub mod prompts;

pub use openai::OpenAiChat;

/// Everything a cycle needs from the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptBundle {
    /// Narration for the long-form video
    pub script_long: String,

    /// Narration for the short-form video
    pub script_short: String,

    /// Title, description and tags shared by both uploads
    pub metadata: VideoMetadata,
}

/// Publishing metadata returned by the metadata prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl VideoMetadata {
    /// Deterministic metadata derived only from the topic
    pub fn fallback(topic: &str) -> Self {
        let head = topic.split_whitespace().take(6).collect::<Vec<_>>().join(" ");
        Self {
            title: format!("{} - Money Mind", head),
            description: format!("{} - watch to learn.", topic),
            tags: vec!["finance".to_string(), "money".to_string(), "mindset".to_string()],
        }
    }
}

/// Trait for text generation backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete a single prompt, returning the trimmed reply
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Name of the backing provider
    fn provider_name(&self) -> &'static str;
}

/// Parse the metadata reply, substituting the topic fallback when it is not usable
pub fn parse_metadata(reply: &str, topic: &str) -> VideoMetadata {
    match serde_json::from_str::<VideoMetadata>(strip_code_fence(reply)) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!("Metadata reply was not valid JSON ({}), using fallback", e);
            VideoMetadata::fallback(topic)
        }
    }
}

/// Remove a surrounding Markdown code fence, if present
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening fence
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

/// Run the three prompts for a topic and assemble the bundle
pub async fn generate_script_bundle(
    generator: &dyn TextGenerator,
    topic: &str,
    long_minutes: u32,
) -> Result<ScriptBundle> {
    tracing::info!("Generating scripts with {} for topic: {}", generator.provider_name(), topic);

    let script_long = generator
        .generate(&prompts::long_script(topic, long_minutes), prompts::LONG_SCRIPT_TOKENS)
        .await
        .context("Failed to generate long script")?;

    let script_short = generator
        .generate(&prompts::short_script(topic), prompts::SHORT_SCRIPT_TOKENS)
        .await
        .context("Failed to generate short script")?;

    let metadata_reply = generator
        .generate(&prompts::metadata(topic), prompts::METADATA_TOKENS)
        .await
        .context("Failed to generate metadata")?;

    Ok(ScriptBundle {
        script_long,
        script_short,
        metadata: parse_metadata(&metadata_reply, topic),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    #[test]
    fn test_parse_valid_metadata() {
        let reply = r#"{"title":"T","description":"D","tags":["a","b"]}"#;
        let metadata = parse_metadata(reply, "test topic");
        assert_eq!(metadata.title, "T");
        assert_eq!(metadata.description, "D");
        assert_eq!(metadata.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_invalid_metadata_falls_back() {
        let metadata = parse_metadata(
            "Sure! Here is your title: Get Rich",
            "How the rich think about money",
        );
        assert_eq!(metadata, VideoMetadata::fallback("How the rich think about money"));
        assert_eq!(metadata.title, "How the rich think about money - Money Mind");
        assert_eq!(metadata.description, "How the rich think about money - watch to learn.");
        assert_eq!(metadata.tags, vec!["finance", "money", "mindset"]);
    }

    #[test]
    fn test_fallback_title_uses_first_six_words() {
        let metadata = VideoMetadata::fallback("one two three four five six seven eight");
        assert_eq!(metadata.title, "one two three four five six - Money Mind");
    }

    #[test]
    fn test_parse_metadata_missing_field_falls_back() {
        let metadata = parse_metadata(r#"{"title":"Only a title"}"#, "test topic");
        assert_eq!(metadata, VideoMetadata::fallback("test topic"));
    }

    #[test]
    fn test_parse_fenced_metadata() {
        let reply = "```json\n{\"title\":\"T\",\"description\":\"D\",\"tags\":[\"a\"]}\n```";
        let metadata = parse_metadata(reply, "test topic");
        assert_eq!(metadata.title, "T");
        assert_eq!(metadata.tags, vec!["a"]);
    }

    #[tokio::test]
    async fn test_bundle_uses_three_prompts() {
        let mut generator = MockTextGenerator::new();
        generator.expect_provider_name().return_const("mock");
        generator
            .expect_generate()
            .with(always(), eq(prompts::LONG_SCRIPT_TOKENS))
            .times(1)
            .returning(|_, _| Ok("script_long".to_string()));
        generator
            .expect_generate()
            .with(always(), eq(prompts::SHORT_SCRIPT_TOKENS))
            .times(1)
            .returning(|_, _| Ok("script_short".to_string()));
        generator
            .expect_generate()
            .with(always(), eq(prompts::METADATA_TOKENS))
            .times(1)
            .returning(|_, _| {
                Ok(r#"{"title":"T","description":"D","tags":["a","b"]}"#.to_string())
            });

        let bundle = generate_script_bundle(&generator, "test topic", 10).await.unwrap();
        assert_eq!(bundle.script_long, "script_long");
        assert_eq!(bundle.script_short, "script_short");
        assert_eq!(bundle.metadata.title, "T");
    }

    #[tokio::test]
    async fn test_transport_error_fails_bundle() {
        let mut generator = MockTextGenerator::new();
        generator.expect_provider_name().return_const("mock");
        generator
            .expect_generate()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("HTTP 500")));

        assert!(generate_script_bundle(&generator, "test topic", 10).await.is_err());
    }
}
