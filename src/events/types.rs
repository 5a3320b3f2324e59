use chrono::{DateTime, Utc};

use crate::models::{ImageUrl, Tag};

/// Progress event published by the image load controller
#[derive(Debug, Clone)]
pub struct LoaderEvent {
    pub kind: LoaderEventKind,
    pub timestamp: DateTime<Utc>,
}

impl LoaderEvent {
    pub fn new(kind: LoaderEventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEventKind {
    SessionReset {
        tag: Tag,
    },
    BatchStarted {
        tag: Tag,
        size: usize,
    },
    ImageAppended {
        tag: Tag,
        name: String,
        loaded: usize,
        total: usize,
    },
    ImageSkipped {
        tag: Tag,
        preview_url: ImageUrl,
        reason: String,
    },
    BatchFinished {
        tag: Tag,
        appended: usize,
        skipped: usize,
    },
    CategoryComplete {
        tag: Tag,
        loaded: usize,
    },
}

impl LoaderEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderEventKind::SessionReset { .. } => "session.reset",
            LoaderEventKind::BatchStarted { .. } => "batch.started",
            LoaderEventKind::ImageAppended { .. } => "image.appended",
            LoaderEventKind::ImageSkipped { .. } => "image.skipped",
            LoaderEventKind::BatchFinished { .. } => "batch.finished",
            LoaderEventKind::CategoryComplete { .. } => "category.complete",
        }
    }

    pub fn tag(&self) -> &Tag {
        match self {
            LoaderEventKind::SessionReset { tag }
            | LoaderEventKind::BatchStarted { tag, .. }
            | LoaderEventKind::ImageAppended { tag, .. }
            | LoaderEventKind::ImageSkipped { tag, .. }
            | LoaderEventKind::BatchFinished { tag, .. }
            | LoaderEventKind::CategoryComplete { tag, .. } => tag,
        }
    }
}
