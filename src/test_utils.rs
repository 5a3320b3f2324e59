#![cfg(test)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::config::LoaderConfig;
use crate::core::{Collaborators, ImageFetcher, ImageLoadController};
use crate::events::EventBus;
use crate::models::gallery_index::{CategoryEntry, RawImage};
use crate::models::{GalleryIndex, ImageUrl, IndexDocument, PreviewImage};
use crate::platforms::{MemoryHistory, MemoryOverlay, MemorySurface, SimulatedViewport};
use crate::utils::errors::AssetError;

/// Preview URL the fixtures use for the `n`th (1-based) image of a category
pub fn preview_url(category: &str, n: usize) -> ImageUrl {
    ImageUrl::new(format!("/previews/{category}/{category}-{n:02}.webp"))
}

/// Index with `count` images per category, named `<category>-NN`
pub fn index_with(categories: &[(&str, usize)]) -> GalleryIndex {
    let gallery = categories
        .iter()
        .map(|(category, count)| {
            let images = (1..=*count)
                .map(|n| RawImage {
                    name: format!("{category}-{n:02}"),
                    original: format!("/originals/{category}/{category}-{n:02}.jpg"),
                    preview: preview_url(category, n).to_string(),
                    category: Some(category.to_string()),
                })
                .collect();
            (
                category.to_string(),
                CategoryEntry {
                    name: category.to_string(),
                    images,
                    count: *count,
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    let total_images = categories.iter().map(|(_, count)| count).sum();
    GalleryIndex::from_document(IndexDocument {
        gallery,
        total_images,
        generated_at: None,
    })
    .expect("fixture index is valid")
}

#[derive(Clone)]
enum Script {
    Fail,
    Hang,
    Gate(Arc<Notify>),
}

/// Fetcher that resolves instantly unless a URL is scripted otherwise
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<ImageUrl, Script>>,
    calls: Mutex<Vec<ImageUrl>>,
}

impl ScriptedFetcher {
    pub fn fail(&self, url: ImageUrl) {
        self.scripts.lock().unwrap().insert(url, Script::Fail);
    }

    /// The preload never settles; only a timeout or a reset ends it
    pub fn hang(&self, url: ImageUrl) {
        self.scripts.lock().unwrap().insert(url, Script::Hang);
    }

    /// The preload waits until the returned handle is notified
    pub fn gate(&self, url: ImageUrl) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.scripts
            .lock()
            .unwrap()
            .insert(url, Script::Gate(gate.clone()));
        gate
    }

    pub fn calls(&self) -> Vec<ImageUrl> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageFetcher for ScriptedFetcher {
    async fn preload(&self, url: &ImageUrl) -> Result<PreviewImage, AssetError> {
        self.calls.lock().unwrap().push(url.clone());
        let script = self.scripts.lock().unwrap().get(url).cloned();
        match script {
            Some(Script::Fail) => Err(AssetError::Http {
                url: url.to_string(),
                status: 404,
            }),
            Some(Script::Hang) => futures::future::pending().await,
            Some(Script::Gate(gate)) => {
                gate.notified().await;
                Ok(PreviewImage {
                    width: 300,
                    height: 200,
                })
            }
            None => Ok(PreviewImage {
                width: 300,
                height: 200,
            }),
        }
    }
}

/// Headless page plus a scripted fetcher
pub struct TestPage {
    pub fetcher: Arc<ScriptedFetcher>,
    pub surface: Arc<MemorySurface>,
    pub overlay: Arc<MemoryOverlay>,
    pub viewport: Arc<SimulatedViewport>,
    pub history: Arc<MemoryHistory>,
}

impl TestPage {
    pub fn new(width: u32, height: u32) -> Self {
        let surface = Arc::new(MemorySurface::default());
        Self {
            fetcher: Arc::new(ScriptedFetcher::default()),
            overlay: Arc::new(MemoryOverlay::new(surface.clone())),
            viewport: Arc::new(SimulatedViewport::new(surface.clone(), width, height)),
            history: Arc::new(MemoryHistory::new("/")),
            surface,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            fetcher: self.fetcher.clone(),
            surface: self.surface.clone(),
            overlay: self.overlay.clone(),
            viewport: self.viewport.clone(),
        }
    }

    pub fn controller(&self, index: GalleryIndex) -> ImageLoadController {
        ImageLoadController::new(
            Arc::new(index),
            self.collaborators(),
            Arc::new(EventBus::default()),
            &LoaderConfig::default(),
        )
    }
}

/// Yield until the controller reports a batch in flight
pub async fn wait_until_loading(controller: &ImageLoadController) {
    while !controller.is_loading().await {
        tokio::task::yield_now().await;
    }
}
