use serde::{Deserialize, Serialize};

use super::{CategoryId, ImageUrl};

/// One image from the gallery index. Identity is the preview URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub name: String,
    pub category: CategoryId,
    #[serde(rename = "original")]
    pub original_url: ImageUrl,
    #[serde(rename = "preview")]
    pub preview_url: ImageUrl,
}

/// Result of a successful preview preload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
}

/// An image element as handed to the layout surface and viewer overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedImage {
    pub src: ImageUrl,
    pub original_url: ImageUrl,
    pub thumbnail_url: ImageUrl,
    pub category: CategoryId,
    pub caption: String,
    /// Viewer sizing hint, "WxH". Absent when the decoder could not tell.
    pub size_hint: Option<String>,
}

impl PlacedImage {
    pub fn new(record: &ImageRecord, preview: PreviewImage) -> Self {
        let size_hint = (preview.width > 0 && preview.height > 0)
            .then(|| format!("{}x{}", preview.width, preview.height));

        let caption = if record.name.is_empty() {
            "Gallery Image".to_string()
        } else {
            record.name.clone()
        };

        Self {
            src: record.preview_url.clone(),
            original_url: record.original_url.clone(),
            thumbnail_url: record.preview_url.clone(),
            category: record.category.clone(),
            caption,
            size_hint,
        }
    }
}
