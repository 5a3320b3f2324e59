//! Shareable URL convention: `/` selects every image, `/<category>` selects
//! one category. Unknown categories fall back to `/`.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use url::Url;

use crate::models::{GalleryIndex, Tag};
use crate::utils::errors::{GalleryError, Result};

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Tag a location path resolves to, and whether the path was already the
/// canonical one for that tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub tag: Tag,
    pub canonical: bool,
}

pub fn resolve_path(path: &str, index: &GalleryIndex) -> Route {
    let segment = path.trim_start_matches('/').trim_end_matches('/');
    if segment.is_empty() {
        return Route {
            tag: Tag::All,
            canonical: path == "/",
        };
    }

    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    let tag = Tag::parse(&decoded);
    if index.contains(&tag) {
        let canonical = path == path_for_tag(&tag);
        Route { tag, canonical }
    } else {
        Route {
            tag: Tag::All,
            canonical: false,
        }
    }
}

pub fn path_for_tag(tag: &Tag) -> String {
    match tag {
        Tag::All => "/".to_string(),
        Tag::Category(id) => format!("/{}", utf8_percent_encode(id.as_str(), PATH_SEGMENT)),
    }
}

/// Path component of a full page URL
pub fn path_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| GalleryError::Configuration(format!("invalid page URL {url}: {e}")))?;
    Ok(parsed.path().to_string())
}
