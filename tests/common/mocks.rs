use async_trait::async_trait;
use photo_gallery::core::ImageFetcher;
use photo_gallery::models::{ImageUrl, PreviewImage};
use photo_gallery::utils::AssetError;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Resolves every preview instantly unless told to fail it
#[derive(Default)]
pub struct StubFetcher {
    failing: Mutex<HashSet<ImageUrl>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(ImageUrl::new(url));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for StubFetcher {
    async fn preload(&self, url: &ImageUrl) -> Result<PreviewImage, AssetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(url) {
            return Err(AssetError::Http {
                url: url.to_string(),
                status: 404,
            });
        }
        Ok(PreviewImage {
            width: 400,
            height: 300,
        })
    }
}
