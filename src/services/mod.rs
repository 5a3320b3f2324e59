pub mod index_loader;
pub mod routing;
pub mod tag_filter;

pub use index_loader::IndexLoader;
pub use routing::{Route, path_for_tag, path_from_url, resolve_path};
pub use tag_filter::{SelectionOrigin, TagFilter, TagListener};
