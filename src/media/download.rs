use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::utils::format_file_size;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for fetching a URL to a local file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` to `dest`, returning the number of bytes written
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Streaming HTTP downloader with a progress bar
pub struct HttpDownloader {
    client: Client,
    show_progress: bool,
}

impl HttpDownloader {
    pub fn new(show_progress: bool) -> Self {
        Self {
            client: Client::new(),
            show_progress,
        }
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new(total);
        progress.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress
    }

    async fn stream_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("Failed to request {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to download {}: HTTP {}", url, response.status());
        }

        let progress = self.progress_bar(response.content_length().unwrap_or(0));
        progress.set_message("Downloading...");

        let mut file = fs_err::File::create(dest)?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            progress.set_position(downloaded);
        }

        progress.finish_with_message("Download complete");
        Ok(downloaded)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        match self.stream_to(url, dest).await {
            Ok(bytes) => {
                tracing::debug!("Saved {} to {}", format_file_size(bytes), dest.display());
                Ok(bytes)
            }
            Err(e) => {
                // A truncated file would be treated as a cache hit next cycle
                if dest.exists() {
                    let _ = fs_err::remove_file(dest);
                }
                Err(e)
            }
        }
    }
}
