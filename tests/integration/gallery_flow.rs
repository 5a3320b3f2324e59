use crate::common::{TestContext, preview_url};
use photo_gallery::core::{BatchStatus, CompletenessOutcome};
use photo_gallery::events::LoaderEventKind;
use photo_gallery::models::Tag;
use photo_gallery::utils::GalleryError;

#[tokio::test]
async fn test_start_loads_first_batch_for_all() {
    let ctx = TestContext::new("/");
    let gallery = ctx.gallery(&[("landscape", 12), ("street", 8)]).await;

    let tag = gallery.start().await;

    assert_eq!(tag, Tag::All);
    // Narrow viewport: one batch of 8, in index order
    assert_eq!(ctx.surface.len(), 8);
    assert!(ctx.placed_categories().iter().all(|c| c == "landscape"));
    assert_eq!(ctx.history.entries(), vec!["/"]);
    assert_eq!(
        gallery.tags().iter().map(Tag::to_string).collect::<Vec<_>>(),
        vec!["all", "landscape", "street"]
    );
    gallery.shutdown().await;
}

#[tokio::test]
async fn test_user_selection_reloads_and_pushes_location() {
    let ctx = TestContext::new("/");
    let gallery = ctx.gallery(&[("landscape", 12), ("street", 8)]).await;
    gallery.start().await;

    let tag = gallery.select_tag("street").await.unwrap();

    assert_eq!(tag, Tag::parse("street"));
    assert_eq!(gallery.current_tag().await, tag);
    assert_eq!(ctx.surface.len(), 8);
    assert!(ctx.placed_categories().iter().all(|c| c == "street"));
    assert_eq!(ctx.history.entries(), vec!["/", "/street"]);

    // Re-selecting the same tag does not add another entry
    gallery.select_tag("street").await.unwrap();
    assert_eq!(ctx.history.entries(), vec!["/", "/street"]);
    gallery.shutdown().await;
}

#[tokio::test]
async fn test_unknown_user_tag_is_rejected() {
    let ctx = TestContext::new("/");
    let gallery = ctx.gallery(&[("landscape", 4)]).await;
    gallery.start().await;
    let calls = ctx.fetcher.calls();

    let result = gallery.select_tag("portraits").await;

    assert!(matches!(result, Err(GalleryError::UnknownTag(_))));
    assert_eq!(gallery.current_tag().await, Tag::All);
    assert_eq!(ctx.fetcher.calls(), calls);
    assert_eq!(ctx.history.entries(), vec!["/"]);
    gallery.shutdown().await;
}

#[tokio::test]
async fn test_failed_previews_are_skipped_without_stalling() {
    let ctx = TestContext::new("/");
    ctx.fetcher.fail(&preview_url("landscape", 2));
    let gallery = ctx.gallery(&[("landscape", 6)]).await;
    let mut skipped = gallery.events().subscribe_to(vec!["image.skipped"]);

    gallery.start().await;

    assert_eq!(ctx.surface.len(), 5);
    let event = skipped.try_recv().unwrap().expect("skip event");
    match event.kind {
        LoaderEventKind::ImageSkipped { preview_url, .. } => {
            assert_eq!(preview_url.as_str(), "/previews/landscape/landscape-02.webp")
        }
        other => panic!("unexpected event {other:?}"),
    }
    let progress = gallery.controller().progress().await;
    assert_eq!(progress.failed, 1);
    assert!(!progress.in_flight);
    gallery.shutdown().await;
}

#[tokio::test]
async fn test_scrolling_to_bottom_loads_remaining_images() {
    let ctx = TestContext::new("/");
    let gallery = ctx.gallery(&[("landscape", 30)]).await;
    gallery.start().await;

    let mut batches = 0;
    loop {
        ctx.viewport.scroll_to_bottom();
        match gallery.triggers().on_scroll_near_end().await {
            Some(report) if report.status == BatchStatus::Completed => batches += 1,
            _ => break,
        }
    }

    assert_eq!(batches, 3);
    assert_eq!(ctx.surface.len(), 30);
    assert!(gallery.controller().progress().await.is_complete());
    gallery.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_completeness_check_fills_short_page() {
    let ctx = TestContext::new("/");
    let gallery = ctx.gallery(&[("landscape", 20)]).await;
    gallery.start().await;
    assert_eq!(ctx.surface.len(), 8);

    // No scroll events at all: the bounded check loads the rest
    let outcome = gallery.wait_for_completeness().await;

    assert_eq!(outcome, Some(CompletenessOutcome::Complete { attempts: 2 }));
    assert_eq!(ctx.surface.len(), 20);
}
