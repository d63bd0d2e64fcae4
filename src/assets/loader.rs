//! Batched asynchronous asset loading
//!
//! Requests are queued, then [`AssetLoader::load_all`] runs every request on
//! its own worker thread. Once all workers have joined, successful payloads
//! are registered on the calling thread. A failed request is logged and
//! skipped; it never aborts the batch.
//!
//! # Example
//!
//! ```ignore
//! let mut loader = AssetLoader::new("assets/data");
//! loader.queue_texture("assets/hero.png");
//! loader.queue_font("assets/ui.ttf", 24);
//! loader.queue_object("player");
//!
//! let report = loader.load_all_blocking(&mut assets, &mut templates);
//! for id in &report.ids {
//!     // ...
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rustc_hash::FxHashSet;

use super::handle::{AssetId, AssetKind};
use super::media::{AssetPayload, Font, LoadedAsset, Sound, Texture};
use super::storage::AssetRegistry;
use super::template::{DataAsset, TemplateRegistry};
use crate::task::{Deferred, TaskError, join_all};

/// A queued media load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Texture { path: PathBuf },
    Font { path: PathBuf, size: u32 },
    Sound { path: PathBuf },
}

impl LoadRequest {
    /// Type of asset requested
    #[must_use]
    pub fn kind(&self) -> AssetKind {
        match self {
            Self::Texture { .. } => AssetKind::Texture,
            Self::Font { .. } => AssetKind::Font,
            Self::Sound { .. } => AssetKind::Sound,
        }
    }

    /// Source path of the request
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Texture { path } | Self::Font { path, .. } | Self::Sound { path } => path,
        }
    }

    /// Perform the type-specific decode. Runs on a worker thread.
    #[must_use]
    pub fn load(&self) -> LoadedAsset {
        let result = match self {
            Self::Texture { path } => Texture::from_path(path).map(AssetPayload::Texture),
            Self::Font { path, size } => Font::from_path(path, *size).map(AssetPayload::Font),
            Self::Sound { path } => Sound::from_path(path).map(AssetPayload::Sound),
        };

        LoadedAsset {
            kind: self.kind(),
            path: self.path().to_path_buf(),
            result,
        }
    }
}

/// A request that did not produce an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub kind: AssetKind,
    /// Media path, or the template name for data templates
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a finished batch
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Identifiers of successfully registered media, in request order
    pub ids: Vec<AssetId>,
    /// Requests that were skipped
    pub failures: Vec<LoadFailure>,
    /// Template names newly added to the template registry
    pub templates: Vec<String>,
}

/// Shared completion counter for a batch in flight.
///
/// Cheap to clone; a loading screen can poll it from another thread while
/// the batch runs.
#[derive(Debug, Clone, Default)]
pub struct LoadProgress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl LoadProgress {
    fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn finish_one(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    /// Completed requests of the current batch
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Size of the current batch
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Fraction complete; 1.0 for an empty batch
    #[must_use]
    pub fn fraction(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            1.0
        } else {
            self.completed().min(total) as f32 / total as f32
        }
    }
}

/// Queues load requests and runs them as a concurrent batch
#[derive(Debug)]
pub struct AssetLoader {
    /// Media requests in queue order
    requests: Vec<LoadRequest>,
    /// Template names in queue order
    templates: Vec<String>,
    /// Deduplication set for `templates`
    template_set: FxHashSet<String>,
    /// Directory template files are resolved in
    template_root: PathBuf,
    progress: LoadProgress,
}

impl AssetLoader {
    /// Create a loader resolving templates under `template_root`
    pub fn new(template_root: impl Into<PathBuf>) -> Self {
        Self {
            requests: Vec::new(),
            templates: Vec::new(),
            template_set: FxHashSet::default(),
            template_root: template_root.into(),
            progress: LoadProgress::default(),
        }
    }

    /// Queue a texture load
    pub fn queue_texture(&mut self, path: impl Into<PathBuf>) {
        self.requests.push(LoadRequest::Texture { path: path.into() });
    }

    /// Queue a font load at the given point size
    pub fn queue_font(&mut self, path: impl Into<PathBuf>, size: u32) {
        self.requests.push(LoadRequest::Font {
            path: path.into(),
            size,
        });
    }

    /// Queue a sound load
    pub fn queue_sound(&mut self, path: impl Into<PathBuf>) {
        self.requests.push(LoadRequest::Sound { path: path.into() });
    }

    /// Mark a data template as needed (deduplicated)
    pub fn queue_object(&mut self, template: impl Into<String>) {
        let template = template.into();
        if self.template_set.insert(template.clone()) {
            self.templates.push(template);
        }
    }

    /// Discard all pending requests
    pub fn clear(&mut self) {
        self.requests.clear();
        self.templates.clear();
        self.template_set.clear();
        self.progress.reset(0);
    }

    /// Number of queued media requests
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.requests.len()
    }

    /// Queued template names
    #[must_use]
    pub fn queued_templates(&self) -> &[String] {
        &self.templates
    }

    /// Progress of the current or last batch.
    ///
    /// 0.0 while requests are queued but not started, 1.0 when nothing is
    /// queued.
    #[must_use]
    pub fn progress(&self) -> f32 {
        // A running batch has already drained the queue, so anything queued
        // here belongs to a batch that has not started.
        if !(self.requests.is_empty() && self.templates.is_empty()) {
            return 0.0;
        }
        self.progress.fraction()
    }

    /// Handle for observing progress from elsewhere
    #[must_use]
    pub fn progress_handle(&self) -> LoadProgress {
        self.progress.clone()
    }

    /// Path a template name resolves to: `<root>/<name>.json`, else `.ron`
    #[must_use]
    pub fn template_path(&self, name: &str) -> PathBuf {
        template_path(&self.template_root, name)
    }

    /// Run every queued request concurrently and register the results.
    ///
    /// Completes once all workers have joined. The queue is empty afterwards.
    pub async fn load_all(
        &mut self,
        assets: &mut AssetRegistry,
        templates: &mut TemplateRegistry,
    ) -> LoadReport {
        let requests = std::mem::take(&mut self.requests);
        let wanted = std::mem::take(&mut self.templates);
        self.template_set.clear();

        let missing: Vec<String> = wanted
            .into_iter()
            .filter(|name| !templates.contains(name))
            .collect();

        let started = Instant::now();
        self.progress.reset(requests.len() + missing.len());
        log::info!(
            "Loading {} assets and {} templates",
            requests.len(),
            missing.len()
        );

        // Paths already registered are still read; the registry drops the
        // duplicate payload and only bumps the count.
        let media_tasks: Vec<(LoadRequest, Deferred<LoadedAsset>)> = requests
            .into_iter()
            .map(|request| {
                let progress = self.progress.clone();
                let worker_request = request.clone();
                let task = Deferred::spawn(move || {
                    let loaded = worker_request.load();
                    progress.finish_one();
                    loaded
                });
                (request, task)
            })
            .collect();

        let template_tasks: Vec<Deferred<Result<DataAsset, String>>> = missing
            .iter()
            .map(|name| {
                let progress = self.progress.clone();
                let name = name.clone();
                let path = self.template_path(&name);
                Deferred::spawn(move || {
                    let result = DataAsset::from_path(&name, &path)
                        .map_err(|e| format!("{}: {e}", path.display()));
                    progress.finish_one();
                    result
                })
            })
            .collect();

        let mut report = LoadReport::default();

        // Join media workers, then register on this thread.
        for (request, task) in media_tasks {
            let loaded = task.await.unwrap_or_else(|e| worker_failure(&request, &e));
            register(assets, loaded, &mut report);
        }

        for (name, result) in missing.into_iter().zip(join_all(template_tasks).await) {
            match result {
                Ok(Ok(asset)) => {
                    templates.store(name.clone(), asset);
                    report.templates.push(name);
                }
                Ok(Err(reason)) => record_template_failure(&mut report, name, reason),
                Err(e) => record_template_failure(&mut report, name, e.to_string()),
            }
        }

        // Workers that panicked never counted themselves.
        self.progress
            .completed
            .store(self.progress.total(), Ordering::SeqCst);

        log::info!(
            "Loaded {} assets, {} templates, {} failures in {:.1}ms",
            report.ids.len(),
            report.templates.len(),
            report.failures.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );

        report
    }

    /// Run [`Self::load_all`] to completion on the calling thread
    pub fn load_all_blocking(
        &mut self,
        assets: &mut AssetRegistry,
        templates: &mut TemplateRegistry,
    ) -> LoadReport {
        pollster::block_on(self.load_all(assets, templates))
    }
}

fn template_path(root: &Path, name: &str) -> PathBuf {
    let json = root.join(format!("{name}.json"));
    if json.exists() {
        return json;
    }
    let ron = root.join(format!("{name}.ron"));
    if ron.exists() { ron } else { json }
}

fn worker_failure(request: &LoadRequest, error: &TaskError) -> LoadedAsset {
    LoadedAsset {
        kind: request.kind(),
        path: request.path().to_path_buf(),
        result: Err(super::media::AssetError::Decode(error.to_string())),
    }
}

fn register(assets: &mut AssetRegistry, loaded: LoadedAsset, report: &mut LoadReport) {
    match loaded.result {
        Ok(payload) => {
            let id = assets.store_payload(payload, &loaded.path);
            report.ids.push(id);
        }
        Err(e) => {
            log::warn!(
                "Failed to load {} {}: {e}",
                loaded.kind,
                loaded.path.display()
            );
            report.failures.push(LoadFailure {
                kind: loaded.kind,
                path: loaded.path,
                reason: e.to_string(),
            });
        }
    }
}

fn record_template_failure(report: &mut LoadReport, name: String, reason: String) {
    log::warn!("Failed to load data template '{name}': {reason}");
    report.failures.push(LoadFailure {
        kind: AssetKind::Data,
        path: PathBuf::from(name),
        reason,
    });
}
