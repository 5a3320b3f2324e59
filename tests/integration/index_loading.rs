use crate::common::{TestContext, index_json};
use photo_gallery::app::Gallery;
use photo_gallery::config::Config;
use photo_gallery::models::Tag;
use photo_gallery::utils::GalleryError;

fn config_for(source: String) -> Config {
    let mut config = Config::default();
    config.index.source = source;
    config
}

#[tokio::test]
async fn test_gallery_loads_index_over_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/gallery-index.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(index_json(&[("landscape", 5), ("street", 3)]))
        .create_async()
        .await;

    let ctx = TestContext::new("/street");
    let source = format!("{}/gallery-index.json", server.url());
    let gallery = Gallery::load(config_for(source), ctx.page()).await.unwrap();
    mock.assert_async().await;

    assert_eq!(gallery.index().total_images(), 8);
    assert_eq!(gallery.start().await, Tag::parse("street"));
    assert_eq!(ctx.surface.len(), 3);
    gallery.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_index_is_fatal() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/gallery-index.json")
        .with_status(503)
        .create_async()
        .await;

    let ctx = TestContext::new("/");
    let source = format!("{}/gallery-index.json", server.url());
    let result = Gallery::load(config_for(source), ctx.page()).await;

    assert!(matches!(result, Err(GalleryError::IndexLoad(_))));
    assert!(ctx.surface.is_empty());
    assert_eq!(ctx.fetcher.calls(), 0);
}

#[tokio::test]
async fn test_gallery_loads_index_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gallery-index.json");
    std::fs::write(&path, index_json(&[("landscape", 2)])).unwrap();

    let ctx = TestContext::new("/");
    let source = path.to_string_lossy().into_owned();
    let gallery = Gallery::load(config_for(source), ctx.page()).await.unwrap();

    assert_eq!(gallery.start().await, Tag::All);
    assert_eq!(ctx.surface.len(), 2);
    gallery.shutdown().await;
}

#[tokio::test]
async fn test_reserved_preview_category_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gallery-index.json");
    std::fs::write(&path, index_json(&[("0_preview", 1)])).unwrap();

    let ctx = TestContext::new("/");
    let result = Gallery::load(config_for(path.to_string_lossy().into_owned()), ctx.page()).await;

    assert!(matches!(result, Err(GalleryError::InvalidIndex(_))));
}
