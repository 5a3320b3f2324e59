use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

use crate::models::{ImageUrl, Tag};

/// Per-filter load state. Replaced wholesale on every reset, never mutated
/// across tags.
#[derive(Debug)]
pub struct LoadSession {
    /// Distinguishes this session from every earlier one
    pub(crate) generation: u64,
    pub(crate) tag: Tag,
    pub(crate) loaded_count: usize,
    pub(crate) loaded_urls: HashSet<ImageUrl>,
    /// Single-flight flag
    pub(crate) in_flight: bool,
    /// Previews that failed or timed out; never selected again this session
    pub(crate) failed_urls: HashSet<ImageUrl>,
    /// Records attempted so far (placed or skipped). Informational only.
    pub(crate) cursor: usize,
    pub(crate) cancel: CancellationToken,
}

/// Outcome of trying to place one preloaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Appended,
    Duplicate,
    Stale,
}

impl LoadSession {
    pub fn new(tag: Tag, generation: u64) -> Self {
        Self {
            generation,
            tag,
            loaded_count: 0,
            loaded_urls: HashSet::new(),
            in_flight: false,
            failed_urls: HashSet::new(),
            cursor: 0,
            cancel: CancellationToken::new(),
        }
    }

    /// Placed or given up on; either way not selected again
    pub fn is_settled(&self, url: &ImageUrl) -> bool {
        self.loaded_urls.contains(url) || self.failed_urls.contains(url)
    }

    /// Nothing requested, placed or attempted yet
    pub fn is_pristine(&self) -> bool {
        !self.in_flight && self.loaded_count == 0 && self.cursor == 0
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Invalidate any batch still running against this session
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}
