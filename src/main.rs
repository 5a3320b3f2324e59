use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use photo_gallery::app::{Gallery, Page};
use photo_gallery::config::Config;
use photo_gallery::core::History;
use photo_gallery::events::LoaderEventKind;
use photo_gallery::platforms::{MemoryHistory, MemoryOverlay, MemorySurface, SimulatedViewport};
use photo_gallery::services::path_from_url;
use photo_gallery::workers::HttpImageFetcher;

/// Drive the gallery loader headlessly against a published index
#[derive(Parser, Debug)]
#[command(name = "photo-gallery", version, about)]
struct Cli {
    /// Index URL or file path, overriding the config
    index: Option<String>,

    /// Config file (defaults to the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Location to open: a path such as `/landscape` or a full page URL
    #[arg(short, long, default_value = "/")]
    path: String,

    /// Switch to this tag after the first batch
    #[arg(short, long)]
    tag: Option<String>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Stop after this many scrolls to the bottom
    #[arg(long, default_value_t = 100)]
    max_scrolls: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("photo_gallery=info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting photo gallery");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load()?,
    };
    if let Some(index) = cli.index.clone() {
        config.index.source = index;
    }
    config.validate()?;

    let surface = Arc::new(MemorySurface::default());
    let viewport = Arc::new(SimulatedViewport::new(
        surface.clone(),
        cli.width,
        cli.height,
    ));
    let path = if cli.path.contains("://") {
        path_from_url(&cli.path)?
    } else {
        cli.path.clone()
    };
    let history = Arc::new(MemoryHistory::new(&path));
    let fetcher = Arc::new(HttpImageFetcher::new(&config.fetcher)?);

    let page = Page {
        fetcher: fetcher.clone(),
        surface: surface.clone(),
        overlay: Arc::new(MemoryOverlay::new(surface.clone())),
        viewport: viewport.clone(),
        history: history.clone(),
    };

    let source = config.index.source.clone();
    let gallery = match Gallery::load(config, page).await {
        Ok(gallery) => gallery,
        Err(e) => {
            error!("Failed to load gallery index from {}: {}", source, e);
            eprintln!("Gallery unavailable: {e}");
            return Err(e).context("gallery index could not be loaded");
        }
    };

    let mut skipped = gallery.events().subscribe_to(vec!["image.skipped"]);
    let reporter = tokio::spawn(async move {
        while let Ok(event) = skipped.recv().await {
            if let LoaderEventKind::ImageSkipped {
                preview_url,
                reason,
                ..
            } = event.kind
            {
                eprintln!("skipped {preview_url}: {reason}");
            }
        }
    });

    gallery.start().await;
    if let Some(tag) = &cli.tag {
        gallery.select_tag(tag).await?;
        gallery.spawn_completeness_check().await;
    }

    for _ in 0..cli.max_scrolls {
        viewport.scroll_to_bottom();
        match gallery.triggers().on_scroll_near_end().await {
            Some(report) if report.ran() => continue,
            _ => break,
        }
    }

    let outcome = gallery.wait_for_completeness().await;
    gallery.shutdown().await;
    reporter.abort();

    let tag = gallery.current_tag().await;
    let progress = gallery.controller().progress().await;
    println!("location: {}", history.current_path());
    println!("tag:      {}", tag);
    println!(
        "loaded:   {}/{} ({} skipped)",
        progress.loaded, progress.total, progress.failed
    );
    println!("placed:   {} images", surface.len());
    if let Some(outcome) = outcome {
        println!("check:    {:?}", outcome);
    }
    println!("fetcher:  {}", fetcher.get_stats());

    Ok(())
}
