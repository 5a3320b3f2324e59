use crate::common::TestContext;
use photo_gallery::core::History;
use photo_gallery::models::Tag;

#[tokio::test]
async fn test_category_path_selects_category() {
    let ctx = TestContext::new("/landscape");
    let gallery = ctx.gallery(&[("landscape", 12), ("street", 8)]).await;

    let tag = gallery.start().await;

    assert_eq!(tag, Tag::parse("landscape"));
    assert!(ctx.placed_categories().iter().all(|c| c == "landscape"));
    // Location-driven selection never pushes
    assert_eq!(ctx.history.entries(), vec!["/landscape"]);
    gallery.shutdown().await;
}

#[tokio::test]
async fn test_unknown_path_falls_back_to_all() {
    let ctx = TestContext::new("/doesnotexist");
    let gallery = ctx.gallery(&[("landscape", 4), ("street", 4)]).await;

    let tag = gallery.start().await;

    assert_eq!(tag, Tag::All);
    assert_eq!(ctx.history.current_path(), "/");
    assert_eq!(ctx.history.entries().len(), 1);
    assert_eq!(ctx.surface.len(), 8);
    gallery.shutdown().await;
}

#[tokio::test]
async fn test_back_and_forward_rederive_the_filter() {
    let ctx = TestContext::new("/");
    let gallery = ctx.gallery(&[("landscape", 12), ("street", 8)]).await;
    gallery.start().await;
    gallery.select_tag("street").await.unwrap();

    assert!(ctx.history.back());
    let tag = gallery.on_location_changed().await;
    assert_eq!(tag, Tag::All);
    assert_eq!(gallery.current_tag().await, Tag::All);
    assert!(ctx.placed_categories().iter().all(|c| c == "landscape"));

    assert!(ctx.history.forward());
    let tag = gallery.on_location_changed().await;
    assert_eq!(tag, Tag::parse("street"));
    assert!(ctx.placed_categories().iter().all(|c| c == "street"));

    // Navigation never adds entries
    assert_eq!(ctx.history.entries(), vec!["/", "/street"]);
    gallery.shutdown().await;
}

#[tokio::test]
async fn test_category_with_space_round_trips_through_location() {
    let ctx = TestContext::new("/");
    let gallery = ctx.gallery(&[("night city", 3)]).await;
    gallery.start().await;

    gallery.select_tag("night city").await.unwrap();
    assert_eq!(ctx.history.current_path(), "/night%20city");
    gallery.shutdown().await;

    let reopened = TestContext::new("/night%20city");
    let gallery = reopened.gallery(&[("night city", 3)]).await;
    assert_eq!(gallery.start().await, Tag::parse("night city"));
    assert_eq!(reopened.history.current_path(), "/night%20city");
    assert_eq!(reopened.surface.len(), 3);
    gallery.shutdown().await;
}
