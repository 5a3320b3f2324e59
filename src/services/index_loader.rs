use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

use crate::config::IndexConfig;
use crate::models::GalleryIndex;
use crate::utils::errors::{GalleryError, Result};

/// Fetches the gallery index document once at startup.
///
/// Every failure maps to `GalleryError::IndexLoad` or
/// `GalleryError::InvalidIndex`; neither has a partial fallback.
pub struct IndexLoader {
    client: Client,
}

impl IndexLoader {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Load from a URL or a local path
    pub async fn load(&self, source: &str) -> Result<GalleryIndex> {
        let result = if source.starts_with("http://") || source.starts_with("https://") {
            self.load_url(source).await
        } else {
            self.load_file(Path::new(source)).await
        };

        match result {
            Ok(index) => {
                info!(
                    "Gallery index loaded from {}: {} images",
                    source,
                    index.total_images()
                );
                Ok(index)
            }
            Err(e) => {
                error!("Failed to load gallery index from {}: {}", source, e);
                Err(e)
            }
        }
    }

    pub async fn load_url(&self, url: &str) -> Result<GalleryIndex> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GalleryError::IndexLoad(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GalleryError::IndexLoad(format!(
                "HTTP {} fetching {}",
                status.as_u16(),
                url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GalleryError::IndexLoad(e.to_string()))?;
        parse(&body)
    }

    pub async fn load_file(&self, path: &Path) -> Result<GalleryIndex> {
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GalleryError::IndexLoad(format!("{}: {}", path.display(), e)))?;
        parse(&body)
    }
}

fn parse(body: &str) -> Result<GalleryIndex> {
    GalleryIndex::from_json(body).map_err(|e| match e {
        GalleryError::Serialization(e) => GalleryError::IndexLoad(format!("malformed index: {e}")),
        other => other,
    })
}
