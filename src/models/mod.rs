pub mod gallery_index;
mod identifiers;
pub mod image;
mod tag;

pub use gallery_index::{GalleryIndex, IndexDocument};
pub use identifiers::{CategoryId, ImageUrl};
pub use image::{ImageRecord, PlacedImage, PreviewImage};
pub use tag::Tag;
