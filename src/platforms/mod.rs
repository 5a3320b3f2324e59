pub mod headless;

pub use headless::{MemoryHistory, MemoryOverlay, MemorySurface, SimulatedViewport};
