pub mod batch_policy;
pub mod controller;
pub mod gallery_traits;
pub mod session;
pub mod triggers;

pub use batch_policy::BatchPolicy;
pub use controller::{
    BatchReport, BatchStatus, Collaborators, CompletenessOutcome, ImageLoadController,
    LoadProgress,
};
pub use gallery_traits::{
    History, ImageFetcher, LayoutSurface, ViewerOverlay, Viewport, ViewportMetrics,
};
pub use session::LoadSession;
pub use triggers::{LoadTriggers, LoaderState, TriggerPolicy};
