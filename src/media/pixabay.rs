use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{MediaKind, Provider, RemoteAsset, StockSource};
use crate::Result;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Pixabay search for videos, images and music
pub struct PixabaySource {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct HitList {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    id: u64,
    videos: Option<VideoRenditions>,
    #[serde(rename = "largeImageURL")]
    large_image_url: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoRenditions {
    medium: Option<Rendition>,
}

#[derive(Debug, Deserialize)]
struct Rendition {
    url: Option<String>,
}

impl PixabaySource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://pixabay.com/api".to_string(),
        }
    }

    fn endpoint(&self, kind: MediaKind) -> String {
        match kind {
            MediaKind::Video => format!("{}/videos/", self.base_url),
            MediaKind::Image => format!("{}/", self.base_url),
            MediaKind::Music => format!("{}/music/", self.base_url),
        }
    }

    /// Pull the direct URL for `kind` out of each hit; hits without one are dropped
    fn resolve(list: HitList, count: usize, kind: MediaKind) -> Vec<RemoteAsset> {
        list.hits
            .into_iter()
            .take(count)
            .filter_map(|hit| {
                let url = match kind {
                    MediaKind::Video => hit.videos.and_then(|v| v.medium).and_then(|m| m.url),
                    MediaKind::Image => hit.large_image_url,
                    MediaKind::Music => hit.url,
                };
                let url = url.filter(|u| !u.is_empty())?;
                Some(RemoteAsset {
                    provider: Provider::Pixabay,
                    id: hit.id,
                    url,
                    kind,
                })
            })
            .collect()
    }
}

#[async_trait]
impl StockSource for PixabaySource {
    async fn search(&self, query: &str, count: usize, kind: MediaKind) -> Result<Vec<RemoteAsset>> {
        tracing::debug!("Searching Pixabay {} for '{}' ({} results)", kind.as_str(), query, count);

        let count_param = count.to_string();
        let response = self
            .client
            .get(self.endpoint(kind))
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("per_page", count_param.as_str()),
            ])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .context("Failed to reach Pixabay")?
            .error_for_status()
            .context("Pixabay search was rejected")?;

        let list: HitList = response
            .json()
            .await
            .context("Failed to decode Pixabay search response")?;

        Ok(Self::resolve(list, count, kind))
    }

    fn supports(&self, _kind: MediaKind) -> bool {
        true
    }

    fn provider_name(&self) -> &'static str {
        "Pixabay"
    }
}
