use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub mod download;
pub mod pexels;
pub mod pixabay;

pub use download::{Downloader, HttpDownloader};
pub use pexels::PexelsSource;
pub use pixabay::PixabaySource;

use crate::Result;

/// Kinds of stock media a cycle pulls in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Image,
    Music,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
            MediaKind::Music => "music",
        }
    }

    /// File extension used for cached assets of this kind
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Image => "jpg",
            MediaKind::Music => "mp3",
        }
    }
}

/// Stock media providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    Pexels,
    Pixabay,
}

impl Provider {
    fn file_prefix(&self) -> &'static str {
        match self {
            Provider::Pexels => "pexels",
            Provider::Pixabay => "pix",
        }
    }
}

/// A search hit resolved to a direct download URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAsset {
    pub provider: Provider,

    /// Provider's numeric id; the cache key
    pub id: u64,

    pub url: String,

    pub kind: MediaKind,
}

impl RemoteAsset {
    /// Cache filename, stable for a given provider, kind and id
    pub fn file_name(&self) -> String {
        let prefix = self.provider.file_prefix();
        match self.kind {
            MediaKind::Video => format!("{}_{}.{}", prefix, self.id, self.kind.extension()),
            MediaKind::Image => format!("{}_img_{}.{}", prefix, self.id, self.kind.extension()),
            MediaKind::Music => format!("{}_music_{}.{}", prefix, self.id, self.kind.extension()),
        }
    }
}

/// Result of a best-effort fetch step
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// Everything requested was stored
    Fetched(T),

    /// The provider answered but had nothing usable
    NothingFound,

    /// Some items were stored before an error cut the step short
    Partial { items: T, error: anyhow::Error },

    /// The provider failed before anything was stored
    ProviderError(anyhow::Error),
}

impl<T> FetchOutcome<T> {
    /// Whatever was stored, if anything
    pub fn into_value(self) -> Option<T> {
        match self {
            FetchOutcome::Fetched(value) | FetchOutcome::Partial { items: value, .. } => {
                Some(value)
            }
            FetchOutcome::NothingFound | FetchOutcome::ProviderError(_) => None,
        }
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            FetchOutcome::Partial { error, .. } | FetchOutcome::ProviderError(error) => Some(error),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Fetched(_) => "fetched",
            FetchOutcome::NothingFound => "nothing found",
            FetchOutcome::Partial { .. } => "partial",
            FetchOutcome::ProviderError(_) => "provider error",
        }
    }
}

/// Trait for stock media search APIs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StockSource: Send + Sync {
    /// Search for up to `count` assets of `kind` matching `query`
    async fn search(&self, query: &str, count: usize, kind: MediaKind) -> Result<Vec<RemoteAsset>>;

    /// Check if this source serves the given kind
    fn supports(&self, kind: MediaKind) -> bool;

    /// Get the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// On-disk store of downloaded assets, keyed by provider id and never evicted
pub struct MediaLibrary {
    clips_dir: PathBuf,
    music_dir: PathBuf,
    downloader: Box<dyn Downloader>,
}

impl MediaLibrary {
    pub fn new(
        clips_dir: impl Into<PathBuf>,
        music_dir: impl Into<PathBuf>,
        downloader: Box<dyn Downloader>,
    ) -> Self {
        Self {
            clips_dir: clips_dir.into(),
            music_dir: music_dir.into(),
            downloader,
        }
    }

    /// Where an asset lives once downloaded
    pub fn path_for(&self, asset: &RemoteAsset) -> PathBuf {
        let dir = match asset.kind {
            MediaKind::Music => &self.music_dir,
            MediaKind::Video | MediaKind::Image => &self.clips_dir,
        };
        dir.join(asset.file_name())
    }

    /// Download an asset unless a file with its id is already cached
    pub async fn store(&self, asset: &RemoteAsset) -> Result<PathBuf> {
        let dest = self.path_for(asset);
        if dest.exists() {
            tracing::debug!("Cache hit for {}", dest.display());
            return Ok(dest);
        }

        validate_url(&asset.url)?;
        tracing::info!("Downloading {} {} to {}", asset.kind.as_str(), asset.id, dest.display());
        self.downloader.download(&asset.url, &dest).await?;
        Ok(dest)
    }

    /// Search a source and store the top hits, keeping whatever was stored before a failure
    pub async fn fetch(
        &self,
        source: &dyn StockSource,
        query: &str,
        count: usize,
        kind: MediaKind,
    ) -> FetchOutcome<Vec<PathBuf>> {
        let mut stored = Vec::new();
        match self.fetch_into(source, query, count, kind, &mut stored).await {
            Ok(()) if stored.is_empty() => FetchOutcome::NothingFound,
            Ok(()) => FetchOutcome::Fetched(stored),
            Err(error) if stored.is_empty() => FetchOutcome::ProviderError(error),
            Err(error) => FetchOutcome::Partial { items: stored, error },
        }
    }

    async fn fetch_into(
        &self,
        source: &dyn StockSource,
        query: &str,
        count: usize,
        kind: MediaKind,
        stored: &mut Vec<PathBuf>,
    ) -> Result<()> {
        if !source.supports(kind) {
            anyhow::bail!("{} does not serve {} assets", source.provider_name(), kind.as_str());
        }

        let assets = source.search(query, count, kind).await?;
        for asset in assets.iter().take(count) {
            stored.push(self.store(asset).await?);
        }
        Ok(())
    }

    /// Pick one music track at random from the top hits and store it
    pub async fn fetch_music(
        &self,
        source: &dyn StockSource,
        query: &str,
        candidates: usize,
    ) -> FetchOutcome<PathBuf> {
        let hits = match source.search(query, candidates, MediaKind::Music).await {
            Ok(hits) => hits,
            Err(error) => return FetchOutcome::ProviderError(error),
        };

        let track = {
            let mut rng = rand::thread_rng();
            hits[..hits.len().min(candidates)].choose(&mut rng).cloned()
        };
        let Some(track) = track else {
            return FetchOutcome::NothingFound;
        };

        match self.store(&track).await {
            Ok(path) => FetchOutcome::Fetched(path),
            Err(error) => FetchOutcome::ProviderError(error),
        }
    }
}

/// Validate that an asset URL is something we are willing to download
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}

/// Check whether a path looks like a still image by extension
pub fn is_image_path(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref(),
        Some("jpg") | Some("jpeg") | Some("png") | Some("webp") | Some("bmp")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use download::MockDownloader;
    use mockall::predicate::*;

    fn video(provider: Provider, id: u64) -> RemoteAsset {
        RemoteAsset {
            provider,
            id,
            url: format!("https://cdn.example.com/{}.mp4", id),
            kind: MediaKind::Video,
        }
    }

    fn writing_downloader(times: usize) -> MockDownloader {
        let mut downloader = MockDownloader::new();
        downloader.expect_download().times(times).returning(|_, dest| {
            fs_err::write(dest, b"data")?;
            Ok(4)
        });
        downloader
    }

    #[test]
    fn test_cache_file_names() {
        assert_eq!(video(Provider::Pexels, 42).file_name(), "pexels_42.mp4");
        assert_eq!(video(Provider::Pixabay, 7).file_name(), "pix_7.mp4");

        let image = RemoteAsset { kind: MediaKind::Image, ..video(Provider::Pixabay, 9) };
        assert_eq!(image.file_name(), "pix_img_9.jpg");

        let music = RemoteAsset { kind: MediaKind::Music, ..video(Provider::Pixabay, 3) };
        assert_eq!(music.file_name(), "pix_music_3.mp3");
    }

    #[tokio::test]
    async fn test_existing_file_is_not_downloaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path(), dir.path(), Box::new(writing_downloader(0)));
        let asset = video(Provider::Pexels, 42);
        fs_err::write(dir.path().join("pexels_42.mp4"), b"cached").unwrap();

        let path = library.store(&asset).await.unwrap();
        assert_eq!(path, dir.path().join("pexels_42.mp4"));
        assert_eq!(fs_err::read(&path).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn test_repeat_store_downloads_once() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path(), dir.path(), Box::new(writing_downloader(1)));
        let asset = video(Provider::Pixabay, 11);

        let first = library.store(&asset).await.unwrap();
        let second = library.store(&asset).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_music_goes_to_music_dir() {
        let clips = tempfile::tempdir().unwrap();
        let music = tempfile::tempdir().unwrap();
        let library =
            MediaLibrary::new(clips.path(), music.path(), Box::new(writing_downloader(0)));
        let asset = RemoteAsset { kind: MediaKind::Music, ..video(Provider::Pixabay, 5) };
        assert_eq!(library.path_for(&asset), music.path().join("pix_music_5.mp3"));
    }

    #[tokio::test]
    async fn test_fetch_reports_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path(), dir.path(), Box::new(writing_downloader(0)));

        let mut source = MockStockSource::new();
        source.expect_supports().return_const(true);
        source.expect_provider_name().return_const("mock");
        source.expect_search().returning(|_, _, _| Ok(Vec::new()));

        let outcome = library.fetch(&source, "money", 3, MediaKind::Video).await;
        assert!(matches!(outcome, FetchOutcome::NothingFound));
        assert!(outcome.into_value().is_none());
    }

    #[tokio::test]
    async fn test_fetch_distinguishes_provider_error() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path(), dir.path(), Box::new(writing_downloader(0)));

        let mut source = MockStockSource::new();
        source.expect_supports().return_const(true);
        source.expect_provider_name().return_const("mock");
        source
            .expect_search()
            .with(eq("money"), eq(3), eq(MediaKind::Video))
            .returning(|_, _, _| Err(anyhow::anyhow!("HTTP 401")));

        let outcome = library.fetch(&source, "money", 3, MediaKind::Video).await;
        assert!(matches!(outcome, FetchOutcome::ProviderError(_)));
        assert_eq!(outcome.label(), "provider error");
    }

    #[tokio::test]
    async fn test_fetch_keeps_partial_results() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = MockDownloader::new();
        let mut calls = 0;
        downloader.expect_download().times(2).returning(move |_, dest| {
            calls += 1;
            if calls == 1 {
                fs_err::write(dest, b"data")?;
                Ok(4)
            } else {
                Err(anyhow::anyhow!("connection reset"))
            }
        });
        let library = MediaLibrary::new(dir.path(), dir.path(), Box::new(downloader));

        let mut source = MockStockSource::new();
        source.expect_supports().return_const(true);
        source.expect_provider_name().return_const("mock");
        source
            .expect_search()
            .returning(|_, _, _| Ok(vec![video(Provider::Pexels, 1), video(Provider::Pexels, 2)]));

        match library.fetch(&source, "money", 3, MediaKind::Video).await {
            FetchOutcome::Partial { items, error } => {
                assert_eq!(items, vec![dir.path().join("pexels_1.mp4")]);
                assert!(error.to_string().contains("connection reset"));
            }
            other => panic!("expected partial outcome, got {}", other.label()),
        }
    }

    #[tokio::test]
    async fn test_fetch_music_picks_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(dir.path(), dir.path(), Box::new(writing_downloader(1)));

        let mut source = MockStockSource::new();
        source.expect_search().returning(|_, _, _| {
            Ok(vec![RemoteAsset {
                provider: Provider::Pixabay,
                id: 77,
                url: "https://cdn.example.com/track.mp3".to_string(),
                kind: MediaKind::Music,
            }])
        });

        let outcome = library.fetch_music(&source, "motivational", 5).await;
        assert_eq!(outcome.into_value(), Some(dir.path().join("pix_music_77.mp3")));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a.mp4").is_ok());
        assert!(validate_url("ftp://example.com/a.mp4").is_err());
        assert!(validate_url("not-a-url").is_err());
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("clips/pix_img_1.jpg")));
        assert!(is_image_path(Path::new("clips/a.PNG")));
        assert!(!is_image_path(Path::new("clips/pexels_1.mp4")));
    }
}
