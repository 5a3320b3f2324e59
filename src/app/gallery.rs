use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{
    Collaborators, CompletenessOutcome, History, ImageFetcher, ImageLoadController, LayoutSurface,
    LoadTriggers, ViewerOverlay, Viewport,
};
use crate::events::EventBus;
use crate::models::{GalleryIndex, Tag};
use crate::services::{
    IndexLoader, SelectionOrigin, TagFilter, TagListener, path_for_tag, resolve_path,
};
use crate::utils::errors::Result;

/// Everything the hosting page provides
#[derive(Clone)]
pub struct Page {
    pub fetcher: Arc<dyn ImageFetcher>,
    pub surface: Arc<dyn LayoutSurface>,
    pub overlay: Arc<dyn ViewerOverlay>,
    pub viewport: Arc<dyn Viewport>,
    pub history: Arc<dyn History>,
}

/// Application context: constructed once, owns the loader and wires the
/// tag filter, location history and triggers to it.
pub struct Gallery {
    config: Config,
    index: Arc<GalleryIndex>,
    controller: ImageLoadController,
    tag_filter: Arc<TagFilter>,
    triggers: LoadTriggers,
    history: Arc<dyn History>,
    events: Arc<EventBus>,
    completeness: Mutex<Option<JoinHandle<CompletenessOutcome>>>,
}

/// Tag filter listener: reload for the new tag and keep the URL in step
struct FilterBinding {
    controller: ImageLoadController,
    history: Arc<dyn History>,
}

#[async_trait]
impl TagListener for FilterBinding {
    async fn on_tag_selected(&self, tag: &Tag, origin: SelectionOrigin) {
        self.controller.reset(tag.clone()).await;

        if origin == SelectionOrigin::User {
            let path = path_for_tag(tag);
            if self.history.current_path() != path {
                debug!("Updating location to {}", path);
                self.history.push_path(&path);
            }
        }

        self.controller.request_more(tag).await;
    }
}

impl Gallery {
    /// Fetch the index named in the config and build the gallery.
    ///
    /// An index failure is fatal: there is no partial gallery.
    pub async fn load(config: Config, page: Page) -> Result<Self> {
        let loader = IndexLoader::new(&config.index)?;
        let index = loader.load(&config.index.source).await?;
        Ok(Self::new(config, index, page).await)
    }

    pub async fn new(config: Config, index: GalleryIndex, page: Page) -> Self {
        let index = Arc::new(index);
        let events = Arc::new(EventBus::default());

        let controller = ImageLoadController::new(
            index.clone(),
            Collaborators {
                fetcher: page.fetcher,
                surface: page.surface.clone(),
                overlay: page.overlay,
                viewport: page.viewport,
            },
            events.clone(),
            &config.loader,
        );

        let tag_filter = Arc::new(TagFilter::new(&index));
        tag_filter
            .set_listener(Arc::new(FilterBinding {
                controller: controller.clone(),
                history: page.history.clone(),
            }))
            .await;

        let triggers = LoadTriggers::new(controller.clone(), page.surface, &config.triggers);

        Self {
            config,
            index,
            controller,
            tag_filter,
            triggers,
            history: page.history,
            events,
            completeness: Mutex::new(None),
        }
    }

    /// Select the tag named by the current location, load the first batch
    /// and start the completeness loop.
    pub async fn start(&self) -> Tag {
        let tag = self.apply_location().await;
        self.spawn_completeness_check().await;
        info!(
            "Gallery started on {} with {} categories",
            tag,
            self.index.categories().count()
        );
        tag
    }

    /// User picked a tag
    pub async fn select_tag(&self, value: &str) -> Result<Tag> {
        self.tag_filter
            .select_tag_by_value(value, SelectionOrigin::User)
            .await
    }

    /// History moved back or forward: re-derive the filter from the path
    pub async fn on_location_changed(&self) -> Tag {
        let route = resolve_path(&self.history.current_path(), &self.index);
        if route.tag == self.tag_filter.current_tag().await {
            debug!("Location change keeps tag {}", route.tag);
            if !route.canonical {
                self.history.replace_path(&path_for_tag(&route.tag));
            }
            return route.tag;
        }
        self.apply_location().await
    }

    async fn apply_location(&self) -> Tag {
        let path = self.history.current_path();
        let route = resolve_path(&path, &self.index);
        if !route.canonical {
            let canonical = path_for_tag(&route.tag);
            debug!("Location {} resolves to {}", path, canonical);
            self.history.replace_path(&canonical);
        }

        match self
            .tag_filter
            .select(route.tag.clone(), SelectionOrigin::Location)
            .await
        {
            Ok(tag) => tag,
            Err(e) => {
                warn!("Falling back to all images: {}", e);
                self.tag_filter
                    .select(Tag::All, SelectionOrigin::Location)
                    .await
                    .unwrap_or(Tag::All)
            }
        }
    }

    /// (Re)start the bounded completeness loop for the active tag
    pub async fn spawn_completeness_check(&self) {
        let controller = self.controller.clone();
        let config = self.config.completeness.clone();
        let handle = tokio::spawn(async move { controller.ensure_all_loaded(&config).await });

        if let Some(previous) = self.completeness.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Wait for the completeness loop started by `start`
    pub async fn wait_for_completeness(&self) -> Option<CompletenessOutcome> {
        let handle = self.completeness.lock().await.take()?;
        handle.await.ok()
    }

    /// Debounced scroll signal from the page
    pub fn scroll_event(&self) {
        self.triggers.scroll_event();
    }

    /// Debounced resize signal from the page
    pub fn resize_event(&self) {
        self.triggers.resize_event();
    }

    pub async fn shutdown(&self) {
        self.triggers.cancel_pending();
        if let Some(handle) = self.completeness.lock().await.take() {
            handle.abort();
        }
    }

    pub async fn current_tag(&self) -> Tag {
        self.tag_filter.current_tag().await
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tag_filter.tags()
    }

    pub fn controller(&self) -> &ImageLoadController {
        &self.controller
    }

    pub fn triggers(&self) -> &LoadTriggers {
        &self.triggers
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn index(&self) -> &Arc<GalleryIndex> {
        &self.index
    }
}
