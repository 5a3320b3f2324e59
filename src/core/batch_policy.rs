use crate::config::{Breakpoint, LoaderConfig};

/// Maps viewport width to the number of images requested per batch.
///
/// Narrow viewports get smaller batches so each one lands quickly on mobile
/// bandwidth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPolicy {
    breakpoints: Vec<Breakpoint>,
    max_batch_size: usize,
}

impl BatchPolicy {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            breakpoints: config.breakpoints.clone(),
            max_batch_size: config.max_batch_size,
        }
    }

    pub fn batch_size(&self, viewport_width: u32) -> usize {
        self.breakpoints
            .iter()
            .find(|b| viewport_width < b.max_width)
            .map(|b| b.batch_size)
            .unwrap_or(self.max_batch_size)
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::new(&LoaderConfig::default())
    }
}
