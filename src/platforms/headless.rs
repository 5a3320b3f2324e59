//! In-memory page for running the gallery without a browser: the CLI
//! driver and the test suites use it.

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

use crate::constants::{COLUMN_WIDTH_PX, GUTTER_PX};
use crate::core::{History, LayoutSurface, ViewerOverlay, Viewport, ViewportMetrics};
use crate::models::PlacedImage;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Shortest-column packing over fixed-width columns.
#[derive(Debug, Default)]
pub struct MemorySurface {
    state: Mutex<SurfaceState>,
}

#[derive(Debug, Default)]
struct SurfaceState {
    images: Vec<PlacedImage>,
    columns: Vec<f64>,
    width: u32,
    layouts: usize,
    reinits: usize,
}

impl MemorySurface {
    pub fn new(width: u32) -> Self {
        let surface = Self::default();
        surface.set_width(width);
        surface
    }

    pub fn set_width(&self, width: u32) {
        lock(&self.state).width = width;
    }

    pub fn images(&self) -> Vec<PlacedImage> {
        lock(&self.state).images.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn layout_count(&self) -> usize {
        lock(&self.state).layouts
    }

    pub fn reinit_count(&self) -> usize {
        lock(&self.state).reinits
    }

    /// Height of the tallest column after the last layout
    pub fn content_height(&self) -> f64 {
        lock(&self.state)
            .columns
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }

    pub fn column_count(width: u32) -> usize {
        ((width + GUTTER_PX) / (COLUMN_WIDTH_PX + GUTTER_PX)).max(1) as usize
    }
}

/// Tile height for a placed image scaled to the column width
fn tile_height(image: &PlacedImage) -> f64 {
    let aspect = image
        .size_hint
        .as_deref()
        .and_then(|hint| hint.split_once('x'))
        .and_then(|(w, h)| Some((w.parse::<f64>().ok()?, h.parse::<f64>().ok()?)))
        .filter(|(w, _)| *w > 0.0)
        .map(|(w, h)| h / w)
        .unwrap_or(1.0);
    COLUMN_WIDTH_PX as f64 * aspect + GUTTER_PX as f64
}

impl LayoutSurface for MemorySurface {
    fn append(&self, image: PlacedImage) {
        trace!("Surface append {}", image.src);
        lock(&self.state).images.push(image);
    }

    fn layout(&self) {
        let mut state = lock(&self.state);
        let mut columns = vec![0.0_f64; Self::column_count(state.width)];
        for image in &state.images {
            let shortest = columns
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            columns[shortest] += tile_height(image);
        }
        state.columns = columns;
        state.layouts += 1;
    }

    fn clear(&self) {
        let mut state = lock(&self.state);
        state.images.clear();
        state.columns.clear();
    }

    fn reinit(&self) {
        lock(&self.state).reinits += 1;
    }
}

/// Counts overlay calls and remembers how many images it indexed
#[derive(Debug, Default)]
pub struct MemoryOverlay {
    state: Mutex<OverlayState>,
    surface: Option<Arc<MemorySurface>>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OverlayState {
    pub refreshes: usize,
    pub destroys: usize,
    pub reinits: usize,
    pub indexed: usize,
}

impl MemoryOverlay {
    pub fn new(surface: Arc<MemorySurface>) -> Self {
        Self {
            state: Mutex::new(OverlayState::default()),
            surface: Some(surface),
        }
    }

    pub fn state(&self) -> OverlayState {
        *lock(&self.state)
    }
}

impl ViewerOverlay for MemoryOverlay {
    fn refresh(&self) {
        let indexed = self.surface.as_ref().map(|s| s.len()).unwrap_or(0);
        let mut state = lock(&self.state);
        state.refreshes += 1;
        state.indexed = indexed;
    }

    fn destroy(&self) {
        let mut state = lock(&self.state);
        state.destroys += 1;
        state.indexed = 0;
    }

    fn reinit(&self) {
        lock(&self.state).reinits += 1;
    }
}

/// Viewport whose document height follows the surface's packed columns
#[derive(Debug)]
pub struct SimulatedViewport {
    surface: Arc<MemorySurface>,
    state: Mutex<(u32, u32, f64)>,
    chrome_height: f64,
}

impl SimulatedViewport {
    pub fn new(surface: Arc<MemorySurface>, width: u32, height: u32) -> Self {
        surface.set_width(width);
        Self {
            surface,
            state: Mutex::new((width, height, 0.0)),
            chrome_height: 0.0,
        }
    }

    /// Fixed header/footer height added to the document
    pub fn with_chrome_height(mut self, height: f64) -> Self {
        self.chrome_height = height;
        self
    }

    pub fn resize(&self, width: u32, height: u32) {
        let mut state = lock(&self.state);
        state.0 = width;
        state.1 = height;
        self.surface.set_width(width);
    }

    pub fn scroll_to(&self, y: f64) {
        lock(&self.state).2 = y.max(0.0);
    }

    pub fn scroll_to_bottom(&self) {
        let metrics = self.metrics();
        self.scroll_to(metrics.document_height - metrics.height as f64);
    }
}

impl Viewport for SimulatedViewport {
    fn metrics(&self) -> ViewportMetrics {
        let (width, height, scroll_y) = *lock(&self.state);
        let document_height = (self.surface.content_height() + self.chrome_height).max(height as f64);
        ViewportMetrics {
            width,
            height,
            scroll_y: scroll_y.min((document_height - height as f64).max(0.0)),
            document_height,
        }
    }
}

/// Session history with back/forward navigation
#[derive(Debug)]
pub struct MemoryHistory {
    state: Mutex<(Vec<String>, usize)>,
}

impl MemoryHistory {
    pub fn new(initial_path: &str) -> Self {
        Self {
            state: Mutex::new((vec![initial_path.to_string()], 0)),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.state).0.clone()
    }

    /// Returns false at the oldest entry
    pub fn back(&self) -> bool {
        let mut state = lock(&self.state);
        if state.1 == 0 {
            return false;
        }
        state.1 -= 1;
        true
    }

    /// Returns false at the newest entry
    pub fn forward(&self) -> bool {
        let mut state = lock(&self.state);
        if state.1 + 1 >= state.0.len() {
            return false;
        }
        state.1 += 1;
        true
    }
}

impl History for MemoryHistory {
    fn current_path(&self) -> String {
        let state = lock(&self.state);
        state.0[state.1].clone()
    }

    fn push_path(&self, path: &str) {
        let mut state = lock(&self.state);
        let next = state.1 + 1;
        state.0.truncate(next);
        state.0.push(path.to_string());
        state.1 = next;
    }

    fn replace_path(&self, path: &str) {
        let mut state = lock(&self.state);
        let current = state.1;
        state.0[current] = path.to_string();
    }
}
