use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Failed to load gallery index: {0}")]
    IndexLoad(String),

    #[error("Invalid gallery index: {0}")]
    InvalidIndex(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GalleryError>;

/// Failure to preload a single image. Recovered locally by skipping the record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
}

impl From<reqwest::Error> for AssetError {
    fn from(e: reqwest::Error) -> Self {
        AssetError::Network(e.to_string())
    }
}
