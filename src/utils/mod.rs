pub mod debounce;
pub mod errors;

pub use debounce::Debouncer;
pub use errors::{AssetError, GalleryError, Result};
