use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, trace, warn};

use super::batch_policy::BatchPolicy;
use super::gallery_traits::{ImageFetcher, LayoutSurface, ViewerOverlay, Viewport};
use super::session::{LoadSession, Placement};
use crate::config::{CompletenessConfig, LoaderConfig};
use crate::events::{EventBus, LoaderEvent, LoaderEventKind};
use crate::models::{GalleryIndex, ImageRecord, PlacedImage, PreviewImage, Tag};
use crate::utils::errors::AssetError;

/// Page-side capabilities the controller drives
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn ImageFetcher>,
    pub surface: Arc<dyn LayoutSurface>,
    pub overlay: Arc<dyn ViewerOverlay>,
    pub viewport: Arc<dyn Viewport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every selected record was attempted
    Completed,
    /// Another batch holds the single-flight flag
    Busy,
    /// No unseen records remain for the tag
    Exhausted,
    /// The requested tag is not the active session's tag
    NotActive,
    /// A reset superseded the session mid-batch
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub requested: usize,
    pub appended: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub duplicates: usize,
}

impl BatchReport {
    fn idle(status: BatchStatus) -> Self {
        Self {
            status,
            requested: 0,
            appended: 0,
            failed: 0,
            timed_out: 0,
            duplicates: 0,
        }
    }

    pub fn skipped(&self) -> usize {
        self.failed + self.timed_out
    }

    /// Whether this call actually loaded anything
    pub fn ran(&self) -> bool {
        matches!(self.status, BatchStatus::Completed | BatchStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
    pub failed: usize,
    pub in_flight: bool,
}

impl LoadProgress {
    /// Records neither placed nor given up on
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.loaded + self.failed)
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Loaded share, 0.0..=1.0
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.loaded as f64 / self.total as f64).min(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletenessOutcome {
    Complete { attempts: u32 },
    Incomplete { attempts: u32, loaded: usize, total: usize },
}

struct Inner {
    index: Arc<GalleryIndex>,
    collaborators: Collaborators,
    events: Arc<EventBus>,
    policy: BatchPolicy,
    image_timeout: Duration,
    session: Mutex<LoadSession>,
    generations: AtomicU64,
    batch_size: AtomicUsize,
}

impl Inner {
    /// Never held across an await
    fn session(&self) -> MutexGuard<'_, LoadSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Decides which images to fetch next and places them on the layout surface
/// one at a time, in index order.
///
/// Cloning is cheap; clones share the same session.
#[derive(Clone)]
pub struct ImageLoadController {
    inner: Arc<Inner>,
}

impl ImageLoadController {
    pub fn new(
        index: Arc<GalleryIndex>,
        collaborators: Collaborators,
        events: Arc<EventBus>,
        config: &LoaderConfig,
    ) -> Self {
        let policy = BatchPolicy::new(config);
        let batch_size = policy.batch_size(collaborators.viewport.metrics().width);

        Self {
            inner: Arc::new(Inner {
                index,
                collaborators,
                events,
                policy,
                image_timeout: config.image_timeout(),
                session: Mutex::new(LoadSession::new(Tag::All, 0)),
                generations: AtomicU64::new(0),
                batch_size: AtomicUsize::new(batch_size),
            }),
        }
    }

    pub fn index(&self) -> &Arc<GalleryIndex> {
        &self.inner.index
    }

    pub fn viewport_metrics(&self) -> super::ViewportMetrics {
        self.inner.collaborators.viewport.metrics()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.inner.events
    }

    /// Batch size from the most recent viewport measurement
    pub fn batch_size(&self) -> usize {
        self.inner.batch_size.load(Ordering::Relaxed)
    }

    /// Re-measure the viewport and update the batch size
    pub fn refresh_batch_size(&self) -> usize {
        let width = self.inner.collaborators.viewport.metrics().width;
        let size = self.inner.policy.batch_size(width);
        let previous = self.inner.batch_size.swap(size, Ordering::Relaxed);
        if previous != size {
            debug!(
                "Batch size changed from {} to {} (viewport width {}px)",
                previous, size, width
            );
        }
        size
    }

    pub async fn current_tag(&self) -> Tag {
        self.inner.session().tag.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.session().in_flight
    }

    pub async fn progress(&self) -> LoadProgress {
        self.snapshot().await.1
    }

    async fn snapshot(&self) -> (Tag, LoadProgress) {
        let session = self.inner.session();
        let progress = LoadProgress {
            loaded: session.loaded_count,
            total: self.inner.index.unique_count(&session.tag),
            failed: session.failed_urls.len(),
            in_flight: session.in_flight,
        };
        (session.tag.clone(), progress)
    }

    /// Discard the current session and start a fresh one for `tag`.
    ///
    /// Any batch still running is cancelled; images it has not placed yet
    /// are dropped. Resetting an untouched session for the same tag only
    /// reflows.
    pub async fn reset(&self, tag: Tag) {
        let collaborators = &self.inner.collaborators;
        {
            let mut session = self.inner.session();
            if session.tag == tag && session.is_pristine() {
                debug!("Session for {} is already fresh, reflowing only", tag);
                collaborators.surface.layout();
                return;
            }

            session.cancel();
            let generation = self.inner.generations.fetch_add(1, Ordering::SeqCst) + 1;
            *session = LoadSession::new(tag.clone(), generation);

            collaborators.surface.clear();
            collaborators.surface.reinit();
            collaborators.overlay.destroy();
            collaborators.overlay.reinit();
        }

        info!("Reset image loader for tag {}", tag);
        self.publish(LoaderEventKind::SessionReset { tag }).await;
    }

    /// Load the next batch of unseen images for `tag`.
    ///
    /// Returns without loading when a batch is already in flight, when `tag`
    /// is not the active session's tag, or when nothing is left to load.
    pub async fn request_more(&self, tag: &Tag) -> BatchReport {
        let batch_size = self.refresh_batch_size();

        let (generation, cancel, records) = {
            let mut session = self.inner.session();
            if session.tag != *tag {
                debug!(
                    "Ignoring request for {} while {} is active",
                    tag, session.tag
                );
                return BatchReport::idle(BatchStatus::NotActive);
            }
            if session.in_flight {
                debug!("Batch already in flight for {}, skipping request", tag);
                return BatchReport::idle(BatchStatus::Busy);
            }

            let records = self
                .inner
                .index
                .unseen(tag, |url| session.is_settled(url), batch_size);
            if records.is_empty() {
                debug!("No more images to load for {}", tag);
                return BatchReport::idle(BatchStatus::Exhausted);
            }

            session.in_flight = true;
            (session.generation, session.cancel.clone(), records)
        };

        let mut guard = BatchGuard::new(self.inner.clone(), generation);
        let total = self.inner.index.unique_count(tag);
        let mut report = BatchReport::idle(BatchStatus::Completed);
        report.requested = records.len();

        info!(
            "Loading batch of {} images for {} (batch size {})",
            records.len(),
            tag,
            batch_size
        );
        self.publish(LoaderEventKind::BatchStarted {
            tag: tag.clone(),
            size: records.len(),
        })
        .await;

        for (position, record) in records.iter().enumerate() {
            trace!(
                "Loading image {}/{}: {}",
                position + 1,
                records.len(),
                record.name
            );

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = timeout(
                    self.inner.image_timeout,
                    self.inner.collaborators.fetcher.preload(&record.preview_url),
                ) => Some(result),
            };

            let Some(result) = result else {
                debug!("Batch for {} cancelled by reset", tag);
                report.status = BatchStatus::Cancelled;
                break;
            };

            let outcome =
                result.unwrap_or_else(|_| Err(AssetError::TimedOut(self.inner.image_timeout)));

            match outcome {
                Ok(preview) => match self.place(generation, tag, record, preview, total).await {
                    Placement::Appended => report.appended += 1,
                    Placement::Duplicate => report.duplicates += 1,
                    Placement::Stale => {
                        report.status = BatchStatus::Cancelled;
                        break;
                    }
                },
                Err(error) => {
                    if !self.skip(generation, tag, record, &error).await {
                        report.status = BatchStatus::Cancelled;
                        break;
                    }
                    match error {
                        AssetError::TimedOut(_) => report.timed_out += 1,
                        _ => report.failed += 1,
                    }
                }
            }
        }

        self.finish_batch(generation, tag, &mut report).await;
        guard.disarm();
        report
    }

    async fn place(
        &self,
        generation: u64,
        tag: &Tag,
        record: &ImageRecord,
        preview: PreviewImage,
        total: usize,
    ) -> Placement {
        let loaded = {
            let mut session = self.inner.session();
            if !session.is_current(generation) || !session.tag.admits(&record.category) {
                debug!("Discarding {} loaded for a superseded session", record.name);
                return Placement::Stale;
            }

            session.cursor += 1;
            if !session.loaded_urls.insert(record.preview_url.clone()) {
                debug!("Preview {} already placed", record.preview_url);
                return Placement::Duplicate;
            }

            let collaborators = &self.inner.collaborators;
            collaborators
                .surface
                .append(PlacedImage::new(record, preview));
            collaborators.surface.layout();
            collaborators.overlay.refresh();

            session.loaded_count += 1;
            session.loaded_count
        };

        debug!("Placed {} ({}/{})", record.name, loaded, total);
        self.publish(LoaderEventKind::ImageAppended {
            tag: tag.clone(),
            name: record.name.clone(),
            loaded,
            total,
        })
        .await;
        Placement::Appended
    }

    /// Record a failed preload; the record is not selected again this
    /// session. Returns false when the session is gone.
    async fn skip(
        &self,
        generation: u64,
        tag: &Tag,
        record: &ImageRecord,
        error: &AssetError,
    ) -> bool {
        {
            let mut session = self.inner.session();
            if !session.is_current(generation) {
                return false;
            }
            session.cursor += 1;
            session.failed_urls.insert(record.preview_url.clone());
        }

        warn!("Skipping image {}: {}", record.preview_url, error);
        self.publish(LoaderEventKind::ImageSkipped {
            tag: tag.clone(),
            preview_url: record.preview_url.clone(),
            reason: error.to_string(),
        })
        .await;
        true
    }

    async fn finish_batch(&self, generation: u64, tag: &Tag, report: &mut BatchReport) {
        let complete = {
            let mut session = self.inner.session();
            if !session.is_current(generation) {
                report.status = BatchStatus::Cancelled;
                info!(
                    "Batch for {} ended after reset: {} placed before the switch",
                    tag, report.appended
                );
                return;
            }
            session.in_flight = false;
            self.inner
                .index
                .unseen(tag, |url| session.is_settled(url), 1)
                .is_empty()
        };

        info!(
            "Batch for {} finished: {} placed, {} skipped",
            tag,
            report.appended,
            report.skipped()
        );
        self.publish(LoaderEventKind::BatchFinished {
            tag: tag.clone(),
            appended: report.appended,
            skipped: report.skipped(),
        })
        .await;

        if complete {
            let loaded = self.progress().await.loaded;
            info!("All images loaded for {} ({} total)", tag, loaded);
            self.publish(LoaderEventKind::CategoryComplete {
                tag: tag.clone(),
                loaded,
            })
            .await;
        }
    }

    /// Keep requesting batches until the active tag is fully loaded or the
    /// attempt ceiling is hit. Covers pages too short to ever scroll.
    pub async fn ensure_all_loaded(&self, config: &CompletenessConfig) -> CompletenessOutcome {
        sleep(config.initial_delay()).await;

        let mut attempts = 0;
        loop {
            let (tag, progress) = self.snapshot().await;
            debug!(
                "Completeness check for {}: {}/{} (attempt {}/{})",
                tag,
                progress.loaded,
                progress.total,
                attempts + 1,
                config.max_attempts
            );

            if progress.is_complete() {
                info!("All {} images loaded for {}", progress.total, tag);
                return CompletenessOutcome::Complete { attempts };
            }
            if attempts >= config.max_attempts {
                warn!(
                    "Giving up after {} attempts with {}/{} images loaded for {}",
                    attempts, progress.loaded, progress.total, tag
                );
                return CompletenessOutcome::Incomplete {
                    attempts,
                    loaded: progress.loaded,
                    total: progress.total,
                };
            }

            attempts += 1;
            self.request_more(&tag).await;
            sleep(config.interval()).await;
        }
    }

    async fn publish(&self, kind: LoaderEventKind) {
        self.inner.events.publish(LoaderEvent::new(kind)).await;
    }
}

/// Clears the single-flight flag if a batch future is dropped mid-way.
struct BatchGuard {
    inner: Arc<Inner>,
    generation: u64,
    armed: bool,
}

impl BatchGuard {
    fn new(inner: Arc<Inner>, generation: u64) -> Self {
        Self {
            inner,
            generation,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.inner.session();
        if session.is_current(self.generation) {
            debug!("Batch dropped before finishing, releasing in-flight flag");
            session.in_flight = false;
        }
    }
}
