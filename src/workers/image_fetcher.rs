use async_trait::async_trait;
use futures::StreamExt;
use image::ImageReader;
use lru::LruCache;
use reqwest::Client;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::config::FetcherConfig;
use crate::core::ImageFetcher;
use crate::models::{ImageUrl, PreviewImage};
use crate::utils::errors::{AssetError, GalleryError, Result};

/// Downloads previews over HTTP and fully decodes them before reporting
/// success, so a truncated or corrupt file counts as a failed load.
///
/// Decoded dimensions are kept in an LRU so previews re-requested after a
/// tag switch skip the download.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: Client,
    metadata_cache: Arc<Mutex<LruCache<ImageUrl, PreviewImage>>>,
    max_preview_bytes: usize,
    stats: Arc<FetcherStats>,
}

#[derive(Default)]
struct FetcherStats {
    cache_hits: AtomicU64,
    downloads: AtomicU64,
    failures: AtomicU64,
}

impl HttpImageFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.metadata_cache_entries).ok_or_else(|| {
            GalleryError::Configuration("fetcher.metadata_cache_entries must be > 0".into())
        })?;

        // Per-image timeouts are enforced by the load controller
        let client = Client::builder()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            metadata_cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            max_preview_bytes: config.max_preview_bytes,
            stats: Arc::new(FetcherStats::default()),
        })
    }

    pub fn get_stats(&self) -> String {
        format!(
            "ImageFetcher Stats - Cache hits: {}, Downloads: {}, Failures: {}",
            self.stats.cache_hits.load(Ordering::Relaxed),
            self.stats.downloads.load(Ordering::Relaxed),
            self.stats.failures.load(Ordering::Relaxed)
        )
    }

    fn too_large(&self, url: &ImageUrl, len: usize) -> AssetError {
        AssetError::Decode(format!(
            "{} is {} bytes, over the {} byte preview limit",
            url, len, self.max_preview_bytes
        ))
    }

    async fn download(&self, url: &ImageUrl) -> std::result::Result<PreviewImage, AssetError> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let declared = response
            .content_length()
            .map(|len| usize::try_from(len).unwrap_or(usize::MAX));
        if let Some(len) = declared
            && len > self.max_preview_bytes
        {
            return Err(self.too_large(url, len));
        }

        let mut bytes = Vec::with_capacity(declared.unwrap_or(0));
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if bytes.len() + chunk.len() > self.max_preview_bytes {
                return Err(self.too_large(url, bytes.len() + chunk.len()));
            }
            bytes.extend_from_slice(&chunk);
        }
        self.stats.downloads.fetch_add(1, Ordering::Relaxed);
        trace!("Downloaded {} bytes from {}", bytes.len(), url);

        tokio::task::spawn_blocking(move || decode_preview(&bytes))
            .await
            .map_err(|e| AssetError::Decode(e.to_string()))?
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn preload(&self, url: &ImageUrl) -> std::result::Result<PreviewImage, AssetError> {
        {
            let mut cache = self.metadata_cache.lock().await;
            if let Some(preview) = cache.get(url) {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                trace!("Metadata cache hit for {}", url);
                return Ok(*preview);
            }
        }

        match self.download(url).await {
            Ok(preview) => {
                debug!(
                    "Preloaded {} ({}x{})",
                    url, preview.width, preview.height
                );
                self.metadata_cache.lock().await.put(url.clone(), preview);
                Ok(preview)
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }
}

fn decode_preview(bytes: &[u8]) -> std::result::Result<PreviewImage, AssetError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AssetError::Decode(e.to_string()))?;
    if reader.format().is_none() {
        return Err(AssetError::Decode("unrecognized image format".into()));
    }
    let image = reader
        .decode()
        .map_err(|e| AssetError::Decode(e.to_string()))?;
    Ok(PreviewImage {
        width: image.width(),
        height: image.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use mockito::Server;
    use std::io::Write;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut output = Vec::new();
        RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
            .unwrap();
        output
    }

    fn fetcher() -> HttpImageFetcher {
        HttpImageFetcher::new(&FetcherConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_preload_decodes_dimensions_and_caches() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/0_preview/street/tokyo.webp")
            .with_status(200)
            .with_body(png_bytes(6, 4))
            .expect(1)
            .create_async()
            .await;

        let fetcher = fetcher();
        let url = ImageUrl::new(format!("{}/0_preview/street/tokyo.webp", server.url()));

        let first = fetcher.preload(&url).await.unwrap();
        assert_eq!(first, PreviewImage { width: 6, height: 4 });
        let second = fetcher.preload(&url).await.unwrap();
        assert_eq!(second, first);

        mock.assert_async().await;
        assert!(fetcher.get_stats().contains("Cache hits: 1"));
    }

    #[tokio::test]
    async fn test_http_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.webp")
            .with_status(404)
            .create_async()
            .await;

        let url = ImageUrl::new(format!("{}/missing.webp", server.url()));
        let err = fetcher().preload(&url).await.unwrap_err();
        assert!(matches!(err, AssetError::Http { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken.webp")
            .with_status(200)
            .with_body("definitely not an image")
            .create_async()
            .await;

        let url = ImageUrl::new(format!("{}/broken.webp", server.url()));
        let err = fetcher().preload(&url).await.unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    fn small_fetcher() -> HttpImageFetcher {
        HttpImageFetcher::new(&FetcherConfig {
            max_preview_bytes: 1024,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_oversized_declared_length_is_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/huge.webp")
            .with_status(200)
            .with_body(vec![0u8; 4096])
            .create_async()
            .await;

        let url = ImageUrl::new(format!("{}/huge.webp", server.url()));
        let err = small_fetcher().preload(&url).await.unwrap_err();
        assert!(matches!(err, AssetError::Decode(ref msg) if msg.contains("preview limit")));
    }

    #[tokio::test]
    async fn test_oversized_chunked_body_is_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/stream.webp")
            .with_status(200)
            .with_chunked_body(|w| w.write_all(&[0u8; 4096]))
            .create_async()
            .await;

        let url = ImageUrl::new(format!("{}/stream.webp", server.url()));
        let fetcher = small_fetcher();
        let err = fetcher.preload(&url).await.unwrap_err();
        assert!(matches!(err, AssetError::Decode(ref msg) if msg.contains("preview limit")));
        assert!(fetcher.get_stats().contains("Failures: 1"));
    }

    #[test]
    fn test_decode_preview_rejects_truncated_png() {
        let bytes = png_bytes(8, 8);
        assert!(decode_preview(&bytes).is_ok());
        assert!(decode_preview(&bytes[..bytes.len() / 2]).is_err());
    }
}
