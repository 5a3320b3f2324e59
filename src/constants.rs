// Loader tuning defaults. Config values override all of these.

/// Tag value that selects every category.
pub const ALL_TAG: &str = "all";

/// Storage prefix holding generated previews; never a real category.
pub const RESERVED_PREVIEW_CATEGORY: &str = "0_preview";

// === Batch sizing ===
// (viewport width upper bound in px, batch size)
pub const DEFAULT_BREAKPOINTS: [(u32, usize); 4] = [(600, 8), (900, 12), (1200, 16), (1500, 20)];
pub const DEFAULT_MAX_BATCH_SIZE: usize = 24;

// === Timing (milliseconds) ===
pub const DEFAULT_IMAGE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SCROLL_DEBOUNCE_MS: u64 = 100;
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 250;
pub const DEFAULT_COMPLETENESS_DELAY_MS: u64 = 1_000;
pub const DEFAULT_COMPLETENESS_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_COMPLETENESS_ATTEMPTS: u32 = 10;

// === Trigger thresholds ===
pub const DEFAULT_NEAR_END_FRACTION: f64 = 0.5;
pub const DEFAULT_MIN_LOADED_FRACTION: f64 = 0.8;
pub const DEFAULT_SHORT_PAGE_FACTOR: f64 = 2.0;

// === Layout geometry used by the headless surface ===
pub const COLUMN_WIDTH_PX: u32 = 200;
pub const GUTTER_PX: u32 = 8;

// === Fetching ===
pub const DEFAULT_MAX_PREVIEW_BYTES: usize = 16 * 1024 * 1024;

pub const EVENT_BUS_CAPACITY: usize = 256;
