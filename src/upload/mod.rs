use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Credentials;

/// What to publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub video: PathBuf,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub thumbnail: Option<PathBuf>,
}

/// How an upload request was handled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UploadOutcome {
    /// Nothing was sent
    Skipped { reason: String },

    /// Credentials were present and an upload was attempted
    Attempted { video: PathBuf, note: String },
}

impl UploadOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, UploadOutcome::Skipped { .. })
    }
}

/// Trait for video platforms
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome>;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}

/// OAuth triple needed to publish to YouTube
#[derive(Debug, Clone)]
struct OAuthCredentials {
    client_id: String,
    #[allow(dead_code)]
    client_secret: String,
    #[allow(dead_code)]
    refresh_token: String,
}

/// YouTube publisher; only enabled when the full OAuth triple is configured
pub struct YoutubeUploader {
    oauth: Option<OAuthCredentials>,
}

impl YoutubeUploader {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        let oauth = match (present(client_id), present(client_secret), present(refresh_token)) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(OAuthCredentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            _ => None,
        };
        Self { oauth }
    }

    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::new(
            credentials.youtube_client_id.clone(),
            credentials.youtube_client_secret.clone(),
            credentials.youtube_refresh_token.clone(),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.oauth.is_some()
    }
}

#[async_trait]
impl Uploader for YoutubeUploader {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome> {
        let Some(oauth) = &self.oauth else {
            tracing::info!(
                "YouTube OAuth credentials not provided, skipping upload of {}",
                request.video.display()
            );
            return Ok(UploadOutcome::Skipped {
                reason: "YouTube OAuth credentials not provided".to_string(),
            });
        };

        // TODO: exchange the refresh token and send a resumable upload to the YouTube Data API
        tracing::info!(
            "Would upload {} as '{}' ({} tags) with client {}",
            request.video.display(),
            request.title,
            request.tags.len(),
            oauth.client_id
        );

        Ok(UploadOutcome::Attempted {
            video: request.video.clone(),
            note: "upload not implemented".to_string(),
        })
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}
