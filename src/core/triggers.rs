use std::sync::Arc;
use tracing::{debug, trace};

use super::controller::{BatchReport, ImageLoadController, LoadProgress};
use super::gallery_traits::{LayoutSurface, ViewportMetrics};
use crate::config::TriggerConfig;
use crate::utils::Debouncer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    Idle,
    Loading,
}

/// When a scroll or resize signal should turn into a batch request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerPolicy {
    pub near_end_fraction: f64,
    pub min_loaded_fraction: f64,
    pub short_page_factor: f64,
}

impl TriggerPolicy {
    pub fn new(config: &TriggerConfig) -> Self {
        Self {
            near_end_fraction: config.near_end_fraction,
            min_loaded_fraction: config.min_loaded_fraction,
            short_page_factor: config.short_page_factor,
        }
    }

    pub fn should_load_more(&self, metrics: &ViewportMetrics, progress: &LoadProgress) -> bool {
        if progress.remaining() == 0 {
            return false;
        }

        let viewport_height = metrics.height as f64;
        let near_end = metrics.scroll_bottom()
            >= metrics.document_height - viewport_height * self.near_end_fraction;
        let under_filled = (progress.loaded as f64) < progress.total as f64 * self.min_loaded_fraction;
        // Pages this short never produce a scroll event
        let short_page = metrics.document_height < viewport_height * self.short_page_factor;

        trace!(
            "Trigger check: near_end={} under_filled={} short_page={}",
            near_end, under_filled, short_page
        );
        near_end || under_filled || short_page
    }
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self::new(&TriggerConfig::default())
    }
}

/// Debounced scroll and resize entry points into the controller.
///
/// Signals arriving while a batch is loading are dropped; the batch's own
/// completion is the back-pressure point.
#[derive(Clone)]
pub struct LoadTriggers {
    controller: ImageLoadController,
    surface: Arc<dyn LayoutSurface>,
    policy: TriggerPolicy,
    scroll: Arc<Debouncer>,
    resize: Arc<Debouncer>,
}

impl LoadTriggers {
    pub fn new(
        controller: ImageLoadController,
        surface: Arc<dyn LayoutSurface>,
        config: &TriggerConfig,
    ) -> Self {
        Self {
            controller,
            surface,
            policy: TriggerPolicy::new(config),
            scroll: Arc::new(Debouncer::new(config.scroll_debounce())),
            resize: Arc::new(Debouncer::new(config.resize_debounce())),
        }
    }

    pub fn policy(&self) -> &TriggerPolicy {
        &self.policy
    }

    pub async fn state(&self) -> LoaderState {
        if self.controller.is_loading().await {
            LoaderState::Loading
        } else {
            LoaderState::Idle
        }
    }

    /// Ask for more images if the page needs them. Not debounced.
    pub async fn on_scroll_near_end(&self) -> Option<BatchReport> {
        if self.state().await == LoaderState::Loading {
            trace!("Batch in flight, ignoring scroll signal");
            return None;
        }

        let tag = self.controller.current_tag().await;
        let progress = self.controller.progress().await;
        if progress.remaining() == 0 {
            trace!("All images for {} already loaded", tag);
            return None;
        }

        let metrics = self.controller.viewport_metrics();
        if !self.policy.should_load_more(&metrics, &progress) {
            return None;
        }

        debug!(
            "Requesting more images for {}: {} remaining",
            tag,
            progress.remaining()
        );
        Some(self.controller.request_more(&tag).await)
    }

    /// Reflow for new geometry, pick up the new batch size, then check
    /// whether more images are needed. Not debounced.
    pub async fn on_resize(&self) -> Option<BatchReport> {
        self.surface.layout();
        let batch_size = self.controller.refresh_batch_size();
        debug!("Viewport resized, batch size now {}", batch_size);
        self.on_scroll_near_end().await
    }

    /// Debounced scroll signal
    pub fn scroll_event(&self) {
        let triggers = self.clone();
        self.scroll.call(async move {
            triggers.on_scroll_near_end().await;
        });
    }

    /// Debounced resize signal
    pub fn resize_event(&self) {
        let triggers = self.clone();
        self.resize.call(async move {
            triggers.on_resize().await;
        });
    }

    /// Drop any signals still waiting out their debounce delay
    pub fn cancel_pending(&self) {
        if self.scroll.is_pending() || self.resize.is_pending() {
            debug!("Dropping debounced trigger signals");
        }
        self.scroll.cancel();
        self.resize.cancel();
    }
}
