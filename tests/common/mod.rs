pub mod mocks;

use mocks::StubFetcher;
use photo_gallery::app::{Gallery, Page};
use photo_gallery::config::Config;
use photo_gallery::models::GalleryIndex;
use photo_gallery::platforms::{MemoryHistory, MemoryOverlay, MemorySurface, SimulatedViewport};
use serde_json::json;
use std::sync::Arc;

/// Index document with `count` images per category
pub fn index_json(categories: &[(&str, usize)]) -> String {
    let gallery: serde_json::Map<String, serde_json::Value> = categories
        .iter()
        .map(|(category, count)| {
            let images: Vec<_> = (1..=*count)
                .map(|n| {
                    json!({
                        "name": format!("{category}-{n:02}"),
                        "original": format!("/originals/{category}/{category}-{n:02}.jpg"),
                        "preview": preview_url(category, n),
                        "category": category,
                    })
                })
                .collect();
            (
                category.to_string(),
                json!({ "name": category, "images": images, "count": count }),
            )
        })
        .collect();

    let total: usize = categories.iter().map(|(_, count)| count).sum();
    json!({ "gallery": gallery, "total_images": total }).to_string()
}

pub fn preview_url(category: &str, n: usize) -> String {
    format!("/previews/{category}/{category}-{n:02}.webp")
}

pub fn create_test_index(categories: &[(&str, usize)]) -> GalleryIndex {
    GalleryIndex::from_json(&index_json(categories)).expect("Failed to build test index")
}

/// Headless page with a stub fetcher, opened at a location path
pub struct TestContext {
    pub fetcher: Arc<StubFetcher>,
    pub surface: Arc<MemorySurface>,
    pub viewport: Arc<SimulatedViewport>,
    pub history: Arc<MemoryHistory>,
}

impl TestContext {
    pub fn new(path: &str) -> Self {
        let surface = Arc::new(MemorySurface::default());
        Self {
            fetcher: Arc::new(StubFetcher::new()),
            viewport: Arc::new(SimulatedViewport::new(surface.clone(), 500, 800)),
            history: Arc::new(MemoryHistory::new(path)),
            surface,
        }
    }

    pub fn page(&self) -> Page {
        Page {
            fetcher: self.fetcher.clone(),
            surface: self.surface.clone(),
            overlay: Arc::new(MemoryOverlay::new(self.surface.clone())),
            viewport: self.viewport.clone(),
            history: self.history.clone(),
        }
    }

    pub async fn gallery(&self, categories: &[(&str, usize)]) -> Gallery {
        Gallery::new(Config::default(), create_test_index(categories), self.page()).await
    }

    /// Categories of the placed images, in placement order
    pub fn placed_categories(&self) -> Vec<String> {
        self.surface
            .images()
            .iter()
            .map(|image| image.category.to_string())
            .collect()
    }
}
