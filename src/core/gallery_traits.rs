// Seams between the load controller and the page it drives.
// Platform modules provide the implementations.

use async_trait::async_trait;

use crate::models::{ImageUrl, PlacedImage, PreviewImage};
use crate::utils::errors::AssetError;

/// Preloads a preview image so it can be placed fully decoded
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn preload(&self, url: &ImageUrl) -> Result<PreviewImage, AssetError>;
}

/// Column/grid packing surface the images are appended into.
///
/// Packing is by shortest column, so append order determines placement.
pub trait LayoutSurface: Send + Sync {
    fn append(&self, image: PlacedImage);

    /// Mark the surface dirty and reflow
    fn layout(&self);

    /// Remove every placed image
    fn clear(&self);

    /// Rebuild packing state after a clear
    fn reinit(&self);
}

/// Full-screen viewer indexing images by their position on the surface
pub trait ViewerOverlay: Send + Sync {
    /// Re-scan the placed image set
    fn refresh(&self);

    fn destroy(&self);

    fn reinit(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportMetrics {
    pub width: u32,
    pub height: u32,
    pub scroll_y: f64,
    pub document_height: f64,
}

impl ViewportMetrics {
    /// Bottom edge of the visible area in document coordinates
    pub fn scroll_bottom(&self) -> f64 {
        self.scroll_y + self.height as f64
    }
}

pub trait Viewport: Send + Sync {
    fn metrics(&self) -> ViewportMetrics;
}

/// Browser-style location history holding the shareable path
pub trait History: Send + Sync {
    fn current_path(&self) -> String;

    fn push_path(&self, path: &str);

    fn replace_path(&self, path: &str);
}
