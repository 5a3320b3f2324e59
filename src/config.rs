use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::*;
use crate::utils::errors::{GalleryError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub triggers: TriggerConfig,

    #[serde(default)]
    pub completeness: CompletenessConfig,

    #[serde(default)]
    pub fetcher: FetcherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// URL or file path of the gallery index document
    #[serde(default = "default_index_source")]
    pub source: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Applies to viewports strictly narrower than this
    pub max_width: u32,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_image_timeout")]
    pub image_timeout_ms: u64,

    #[serde(default = "default_breakpoints")]
    pub breakpoints: Vec<Breakpoint>,

    /// Batch size for viewports wider than every breakpoint
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "default_scroll_debounce")]
    pub scroll_debounce_ms: u64,

    #[serde(default = "default_resize_debounce")]
    pub resize_debounce_ms: u64,

    /// Load when within this many viewport heights of the bottom
    #[serde(default = "default_near_end_fraction")]
    pub near_end_fraction: f64,

    /// Load while fewer than this share of the tag's images are placed
    #[serde(default = "default_min_loaded_fraction")]
    pub min_loaded_fraction: f64,

    /// Load while the document is shorter than this many viewport heights
    #[serde(default = "default_short_page_factor")]
    pub short_page_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessConfig {
    #[serde(default = "default_completeness_delay")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_completeness_interval")]
    pub interval_ms: u64,

    #[serde(default = "default_completeness_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    #[serde(default = "default_metadata_cache_entries")]
    pub metadata_cache_entries: usize,

    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Previews larger than this are rejected before decoding
    #[serde(default = "default_max_preview_bytes")]
    pub max_preview_bytes: usize,
}

impl Config {
    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                info!("No config file found, using defaults");
                Ok(Config::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        info!("Config loaded successfully");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| GalleryError::Configuration(e.to_string()))?;
        fs::write(path, contents)?;
        debug!("Config saved to {:?}", path);
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("photo-gallery").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(GalleryError::Configuration(msg.to_string()));

        if self.index.source.trim().is_empty() {
            return invalid("index.source must not be empty");
        }
        if self.index.request_timeout_secs == 0 {
            return invalid("index.request_timeout_secs must be greater than 0");
        }
        if self.loader.image_timeout_ms == 0 {
            return invalid("loader.image_timeout_ms must be greater than 0");
        }
        if self.loader.max_batch_size == 0
            || self.loader.breakpoints.iter().any(|b| b.batch_size == 0)
        {
            return invalid("batch sizes must be greater than 0");
        }
        if self
            .loader
            .breakpoints
            .windows(2)
            .any(|pair| pair[0].max_width >= pair[1].max_width)
        {
            return invalid("loader.breakpoints must be sorted by increasing max_width");
        }
        for fraction in [
            self.triggers.near_end_fraction,
            self.triggers.min_loaded_fraction,
        ] {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return invalid("trigger fractions must be within (0, 1]");
            }
        }
        if self.triggers.short_page_factor < 0.0 {
            return invalid("triggers.short_page_factor must not be negative");
        }
        if self.fetcher.metadata_cache_entries == 0 {
            return invalid("fetcher.metadata_cache_entries must be greater than 0");
        }
        if self.fetcher.max_preview_bytes == 0 {
            return invalid("fetcher.max_preview_bytes must be greater than 0");
        }

        Ok(())
    }
}

impl LoaderConfig {
    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }
}

impl TriggerConfig {
    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

impl CompletenessConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            source: default_index_source(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            image_timeout_ms: default_image_timeout(),
            breakpoints: default_breakpoints(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            scroll_debounce_ms: default_scroll_debounce(),
            resize_debounce_ms: default_resize_debounce(),
            near_end_fraction: default_near_end_fraction(),
            min_loaded_fraction: default_min_loaded_fraction(),
            short_page_factor: default_short_page_factor(),
        }
    }
}

impl Default for CompletenessConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_completeness_delay(),
            interval_ms: default_completeness_interval(),
            max_attempts: default_completeness_attempts(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            metadata_cache_entries: default_metadata_cache_entries(),
            max_idle_per_host: default_max_idle_per_host(),
            user_agent: default_user_agent(),
            max_preview_bytes: default_max_preview_bytes(),
        }
    }
}

// Default value functions
fn default_index_source() -> String { "gallery-index.json".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_image_timeout() -> u64 { DEFAULT_IMAGE_TIMEOUT_MS }
fn default_breakpoints() -> Vec<Breakpoint> {
    DEFAULT_BREAKPOINTS
        .iter()
        .map(|&(max_width, batch_size)| Breakpoint { max_width, batch_size })
        .collect()
}
fn default_max_batch_size() -> usize { DEFAULT_MAX_BATCH_SIZE }
fn default_scroll_debounce() -> u64 { DEFAULT_SCROLL_DEBOUNCE_MS }
fn default_resize_debounce() -> u64 { DEFAULT_RESIZE_DEBOUNCE_MS }
fn default_near_end_fraction() -> f64 { DEFAULT_NEAR_END_FRACTION }
fn default_min_loaded_fraction() -> f64 { DEFAULT_MIN_LOADED_FRACTION }
fn default_short_page_factor() -> f64 { DEFAULT_SHORT_PAGE_FACTOR }
fn default_completeness_delay() -> u64 { DEFAULT_COMPLETENESS_DELAY_MS }
fn default_completeness_interval() -> u64 { DEFAULT_COMPLETENESS_INTERVAL_MS }
fn default_completeness_attempts() -> u32 { DEFAULT_COMPLETENESS_ATTEMPTS }
fn default_metadata_cache_entries() -> usize { 500 }
fn default_max_idle_per_host() -> usize { 8 }
fn default_max_preview_bytes() -> usize { DEFAULT_MAX_PREVIEW_BYTES }
fn default_user_agent() -> String { concat!("photo-gallery/", env!("CARGO_PKG_VERSION")).to_string() }
