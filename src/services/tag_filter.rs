use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::models::{CategoryId, GalleryIndex, Tag};
use crate::utils::errors::{GalleryError, Result};

/// What caused a tag selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    /// The user picked a tag; the shareable URL should follow
    User,
    /// The location changed (initial load, back/forward); it already holds
    /// the path
    Location,
}

#[async_trait]
pub trait TagListener: Send + Sync {
    async fn on_tag_selected(&self, tag: &Tag, origin: SelectionOrigin);
}

/// Tracks the selected tag and notifies a single listener on selection
pub struct TagFilter {
    categories: Vec<CategoryId>,
    current: RwLock<Tag>,
    listener: RwLock<Option<Arc<dyn TagListener>>>,
    /// Serializes selections so `current` always matches the last tag the
    /// listener finished handling
    selecting: Mutex<()>,
}

impl TagFilter {
    pub fn new(index: &GalleryIndex) -> Self {
        Self {
            categories: index.categories().cloned().collect(),
            current: RwLock::new(Tag::All),
            listener: RwLock::new(None),
            selecting: Mutex::new(()),
        }
    }

    /// Register the listener, replacing any previous one
    pub async fn set_listener(&self, listener: Arc<dyn TagListener>) {
        *self.listener.write().await = Some(listener);
    }

    /// `all` followed by every category, for rendering filter buttons
    pub fn tags(&self) -> Vec<Tag> {
        std::iter::once(Tag::All)
            .chain(self.categories.iter().cloned().map(Tag::Category))
            .collect()
    }

    pub fn is_known(&self, tag: &Tag) -> bool {
        match tag {
            Tag::All => true,
            Tag::Category(id) => self.categories.contains(id),
        }
    }

    pub async fn current_tag(&self) -> Tag {
        self.current.read().await.clone()
    }

    pub async fn select_tag_by_value(&self, value: &str, origin: SelectionOrigin) -> Result<Tag> {
        self.select(Tag::parse(value), origin).await
    }

    pub async fn select(&self, tag: Tag, origin: SelectionOrigin) -> Result<Tag> {
        if !self.is_known(&tag) {
            debug!("Rejecting unknown tag {}", tag);
            return Err(GalleryError::UnknownTag(tag.to_string()));
        }

        let _selecting = self.selecting.lock().await;
        *self.current.write().await = tag.clone();
        info!("Selected tag {} ({:?})", tag, origin);

        let listener = self.listener.read().await.clone();
        if let Some(listener) = listener {
            listener.on_tag_selected(&tag, origin).await;
        }
        Ok(tag)
    }
}
