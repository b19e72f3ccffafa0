use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{MediaKind, Provider, RemoteAsset, StockSource};
use crate::Result;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Pexels video search
pub struct PexelsSource {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct VideoSearch {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    link: String,
}

impl PexelsSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.pexels.com".to_string(),
        }
    }

    /// Turn a search response into downloadable assets, last listed file per video
    fn resolve(search: VideoSearch, count: usize) -> Vec<RemoteAsset> {
        search
            .videos
            .into_iter()
            .take(count)
            .filter_map(|video| {
                let Some(file) = video.video_files.last() else {
                    tracing::debug!("Pexels video {} has no files, skipping", video.id);
                    return None;
                };
                Some(RemoteAsset {
                    provider: Provider::Pexels,
                    id: video.id,
                    url: file.link.clone(),
                    kind: MediaKind::Video,
                })
            })
            .collect()
    }
}

#[async_trait]
impl StockSource for PexelsSource {
    async fn search(&self, query: &str, count: usize, kind: MediaKind) -> Result<Vec<RemoteAsset>> {
        if kind != MediaKind::Video {
            anyhow::bail!("Pexels search only serves videos");
        }

        tracing::debug!("Searching Pexels videos for '{}' ({} results)", query, count);

        let count_param = count.to_string();
        let response = self
            .client
            .get(format!("{}/videos/search", self.base_url))
            .header("Authorization", &self.api_key)
            .query(&[("query", query), ("per_page", count_param.as_str())])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .context("Failed to reach Pexels")?
            .error_for_status()
            .context("Pexels search was rejected")?;

        let search: VideoSearch = response
            .json()
            .await
            .context("Failed to decode Pexels search response")?;

        Ok(Self::resolve(search, count))
    }

    fn supports(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Video
    }

    fn provider_name(&self) -> &'static str {
        "Pexels"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_takes_last_file_and_limits_count() {
        let body = r#"{
            "page": 1,
            "videos": [
                {"id": 1, "video_files": [{"link": "https://v/1-sd.mp4"}, {"link": "https://v/1-hd.mp4"}]},
                {"id": 2, "video_files": []},
                {"id": 3, "video_files": [{"link": "https://v/3.mp4"}]},
                {"id": 4, "video_files": [{"link": "https://v/4.mp4"}]}
            ]
        }"#;
        let search: VideoSearch = serde_json::from_str(body).unwrap();
        let assets = PexelsSource::resolve(search, 3);

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].url, "https://v/1-hd.mp4");
        assert_eq!(assets[0].file_name(), "pexels_1.mp4");
        assert_eq!(assets[1].id, 3);
    }

    #[test]
    fn test_supports_only_video() {
        let source = PexelsSource::new("key");
        assert!(source.supports(MediaKind::Video));
        assert!(!source.supports(MediaKind::Music));
    }
}
