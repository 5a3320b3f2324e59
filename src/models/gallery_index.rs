use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use super::{CategoryId, ImageRecord, ImageUrl, Tag};
use crate::constants::RESERVED_PREVIEW_CATEGORY;
use crate::utils::errors::{GalleryError, Result};

/// Wire format written by the offline indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocument {
    pub gallery: BTreeMap<String, CategoryEntry>,
    #[serde(default)]
    pub total_images: usize,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    #[serde(default)]
    pub name: String,
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub name: String,
    pub original: String,
    pub preview: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Read-only image index, grouped by category, records sorted by name.
#[derive(Debug, Clone, Default)]
pub struct GalleryIndex {
    categories: Vec<(CategoryId, Vec<ImageRecord>)>,
    generated_at: Option<DateTime<Utc>>,
}

impl GalleryIndex {
    pub fn from_json(json: &str) -> Result<Self> {
        let document: IndexDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_document(document: IndexDocument) -> Result<Self> {
        let mut categories = Vec::with_capacity(document.gallery.len());
        let mut total = 0;

        for (key, entry) in document.gallery {
            if key == RESERVED_PREVIEW_CATEGORY {
                return Err(GalleryError::InvalidIndex(format!(
                    "reserved category '{}' must not be indexed",
                    RESERVED_PREVIEW_CATEGORY
                )));
            }
            if key.is_empty() {
                return Err(GalleryError::InvalidIndex("empty category name".into()));
            }

            let category = CategoryId::new(key.as_str());
            let mut records = Vec::with_capacity(entry.images.len());
            for raw in entry.images {
                if let Some(declared) = raw.category.as_deref()
                    && declared != key
                {
                    return Err(GalleryError::InvalidIndex(format!(
                        "image '{}' declares category '{}' but is listed under '{}'",
                        raw.name, declared, key
                    )));
                }
                if raw.preview.is_empty() {
                    return Err(GalleryError::InvalidIndex(format!(
                        "image '{}' in '{}' has no preview URL",
                        raw.name, key
                    )));
                }
                records.push(ImageRecord {
                    name: raw.name,
                    category: category.clone(),
                    original_url: ImageUrl::new(raw.original),
                    preview_url: ImageUrl::new(raw.preview),
                });
            }

            if entry.count != records.len() {
                warn!(
                    "Category {} declares {} images but lists {}",
                    key,
                    entry.count,
                    records.len()
                );
            }

            records.sort_by(|a, b| a.name.cmp(&b.name));
            warn_on_shared_originals(&category, &records);
            total += records.len();
            categories.push((category, records));
        }

        if document.total_images != total {
            warn!(
                "Index declares {} images but lists {}",
                document.total_images, total
            );
        }

        debug!(
            "Loaded gallery index: {} categories, {} images",
            categories.len(),
            total
        );

        Ok(Self {
            categories,
            generated_at: document.generated_at,
        })
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryId> {
        self.categories.iter().map(|(id, _)| id)
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|(id, _)| id.as_str() == name)
    }

    /// Whether a tag can be selected against this index.
    pub fn contains(&self, tag: &Tag) -> bool {
        match tag {
            Tag::All => true,
            Tag::Category(id) => self.has_category(id.as_str()),
        }
    }

    /// Records under a tag, in index order.
    pub fn records<'a>(&'a self, tag: &'a Tag) -> impl Iterator<Item = &'a ImageRecord> + 'a {
        self.categories
            .iter()
            .filter(move |(id, _)| tag.admits(id))
            .flat_map(|(_, records)| records.iter())
    }

    /// Number of distinct preview URLs under a tag.
    pub fn unique_count(&self, tag: &Tag) -> usize {
        self.records(tag)
            .map(|r| &r.preview_url)
            .collect::<HashSet<_>>()
            .len()
    }

    /// First `limit` records under `tag` whose preview is not yet settled,
    /// in index order, without repeating a preview URL.
    pub fn unseen<F>(&self, tag: &Tag, settled: F, limit: usize) -> Vec<ImageRecord>
    where
        F: Fn(&ImageUrl) -> bool,
    {
        let mut picked: HashSet<&ImageUrl> = HashSet::new();
        self.records(tag)
            .filter(|r| !settled(&r.preview_url))
            .filter(|r| picked.insert(&r.preview_url))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn total_images(&self) -> usize {
        self.categories.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }
}

fn warn_on_shared_originals(category: &CategoryId, records: &[ImageRecord]) {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(&record.original_url) {
            warn!(
                "Category {} lists original {} more than once",
                category, record.original_url
            );
        }
    }
}
