//! The action pipeline.
//!
//! Wraps one long-running unit of work (fetch, transform, commit) as a
//! cancellable stream of progress events. Each run is a tokio task keyed by
//! its request token; at most one run per token is in flight, enforced
//! through an in-flight registry the gate layer consults via
//! [`Pipeline::is_running`].

mod fetch;
pub mod progress;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
pub use fetch::{FetchError, FetchEvent, ImageFetcher};
use image::DynamicImage;
pub use progress::{
    FailureKind, PRE_FINALIZE_PERCENT, ProgressEvent, ProgressPhase, ProgressStream,
};
use thiserror::Error;
use tokio::sync::mpsc;

use self::progress::MilestoneTracker;
use crate::action::{ActionPayload, ActionRequest, CommitMode, RequestToken, TransformKind};
use crate::collection::{CollectionError, CollectionHandle, CollectionItem, OperationKind};

/// Buffer for the progress channel; large enough that a healthy consumer
/// never stalls the run.
const PROGRESS_BUFFER_SIZE: usize = 128;

// ============================================================================
// Collaborator Contracts
// ============================================================================

/// A rejected transform. Pixel kernels live outside this crate; only their
/// failure surfaces here, always as a fatal pipeline outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("image transform failed: {reason}")]
pub struct TransformError {
    pub reason: String,
}

/// The transform stage between fetch and commit.
pub trait ImageTransformer: Send + Sync {
    /// Applies `kind` to `image`. [`TransformKind::Plain`] must return the
    /// image unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`TransformError`] when the transform cannot be applied.
    fn transform(
        &self,
        image: DynamicImage,
        kind: TransformKind,
    ) -> Result<DynamicImage, TransformError>;
}

/// The device wallpaper API. Success or failure only.
pub trait WallpaperApplier: Send + Sync {
    fn apply(&self, image: &DynamicImage) -> bool;
}

// ============================================================================
// Pipeline
// ============================================================================

/// Runs gated actions as cancellable progress-streaming tasks.
pub struct Pipeline {
    fetcher: Arc<dyn ImageFetcher>,
    transformer: Arc<dyn ImageTransformer>,
    applier: Arc<dyn WallpaperApplier>,
    collection: CollectionHandle,
    running: Arc<DashMap<RequestToken, Arc<AtomicBool>>>,
}

impl Pipeline {
    /// Creates a pipeline over the given collaborators.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        transformer: Arc<dyn ImageTransformer>,
        applier: Arc<dyn WallpaperApplier>,
        collection: CollectionHandle,
    ) -> Self {
        Self {
            fetcher,
            transformer,
            applier,
            collection,
            running: Arc::new(DashMap::new()),
        }
    }

    /// Whether a run for `token` is currently in flight. The gate layer
    /// folds this into its busy flag so a duplicate request never reaches
    /// the pipeline.
    #[must_use]
    pub fn is_running(&self, token: RequestToken) -> bool { self.running.contains_key(&token) }

    /// Requests cooperative cancellation of the run for `token`.
    ///
    /// Returns whether a run was found. No event is emitted after the
    /// flag is observed; cancellation is a distinct non-terminal outcome,
    /// not a failure.
    pub fn cancel(&self, token: RequestToken) -> bool {
        self.running.get(&token).is_some_and(|flag| {
            flag.store(true, Ordering::SeqCst);
            true
        })
    }

    /// Starts the run for `request` and returns its progress stream.
    ///
    /// Must be called from within a tokio runtime. Dropping the stream
    /// cancels the run.
    #[must_use]
    pub fn run(&self, request: ActionRequest) -> ProgressStream {
        let token = request.token;
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel(PROGRESS_BUFFER_SIZE);
        let stream = ProgressStream::new(token, rx, Arc::clone(&cancelled));

        match self.running.entry(token) {
            Entry::Occupied(_) => {
                // The gate layer should have rejected this as Busy; deliver
                // nothing rather than corrupting the live run's registry.
                tracing::warn!(
                    action = token.kind().name(),
                    "duplicate pipeline run for in-flight token rejected"
                );
                return stream;
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&cancelled));
            }
        }

        let guard = RunGuard {
            running: Arc::clone(&self.running),
            token,
        };
        tracing::debug!(action = token.kind().name(), "pipeline run starting");
        tokio::spawn(execute(
            request,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.transformer),
            Arc::clone(&self.applier),
            self.collection.clone(),
            tx,
            cancelled,
            guard,
        ));
        stream
    }
}

/// Removes the in-flight registry entry when a run ends, on every exit
/// path including panics.
struct RunGuard {
    running: Arc<DashMap<RequestToken, Arc<AtomicBool>>>,
    token: RequestToken,
}

impl Drop for RunGuard {
    fn drop(&mut self) { self.running.remove(&self.token); }
}

/// Sends `event` unless the run was cancelled or the consumer detached.
/// Returns whether the run should keep going.
async fn emit(
    tx: &mpsc::Sender<ProgressEvent>,
    cancelled: &AtomicBool,
    event: ProgressEvent,
) -> bool {
    if cancelled.load(Ordering::SeqCst) {
        return false;
    }
    tx.send(event).await.is_ok()
}

#[allow(clippy::too_many_arguments)]
async fn execute(
    request: ActionRequest,
    fetcher: Arc<dyn ImageFetcher>,
    transformer: Arc<dyn ImageTransformer>,
    applier: Arc<dyn WallpaperApplier>,
    collection: CollectionHandle,
    tx: mpsc::Sender<ProgressEvent>,
    cancelled: Arc<AtomicBool>,
    _guard: RunGuard,
) {
    let mut tracker = MilestoneTracker::new(request.token);
    if !emit(&tx, &cancelled, tracker.start()).await {
        return;
    }

    // Stage 1: acquire the source image.
    let mut fetch_events = fetcher.fetch(&request.payload.source_url);
    let image = loop {
        let Some(event) = fetch_events.recv().await else {
            // The fetch stream ended without delivering an image.
            let _ = emit(&tx, &cancelled, tracker.fail(FailureKind::Transient)).await;
            return;
        };
        if cancelled.load(Ordering::SeqCst) {
            return;
        }
        match event {
            FetchEvent::Progress(percent) => {
                if let Some(update) = tracker.progress(percent) {
                    if !emit(&tx, &cancelled, update).await {
                        return;
                    }
                }
            }
            FetchEvent::Ready(image) => break image,
            FetchEvent::Failed(err) => {
                tracing::debug!(error = %err, "pipeline fetch failed");
                let _ = emit(&tx, &cancelled, tracker.fail(FailureKind::Transient)).await;
                return;
            }
        }
    };

    // Finalization begins: the indicator switches to indefinite.
    if let Some(update) = tracker.pre_finalize() {
        if !emit(&tx, &cancelled, update).await {
            return;
        }
    }

    // Stage 2: transform.
    let image = match transformer.transform(image, request.payload.transform) {
        Ok(image) => image,
        Err(err) => {
            tracing::warn!(error = %err, "pipeline transform failed");
            let _ = emit(&tx, &cancelled, tracker.fail(FailureKind::Fatal)).await;
            return;
        }
    };

    // Stage 3: commit.
    match request.payload.commit {
        CommitMode::SetWallpaper => {
            if !applier.apply(&image) {
                tracing::warn!("wallpaper api refused the image");
                let _ = emit(&tx, &cancelled, tracker.fail(FailureKind::Fatal)).await;
                return;
            }
        }
        CommitMode::AddToCollection => {
            let item = committed_item(&request.payload);
            match collection.add_items(vec![item]).await {
                Ok(_) => {}
                Err(CollectionError::AlreadyInCollection) => {
                    let _ = emit(
                        &tx,
                        &cancelled,
                        tracker.fail(FailureKind::AlreadyInCollection),
                    )
                    .await;
                    return;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "collection commit failed");
                    let _ = emit(&tx, &cancelled, tracker.fail(FailureKind::Fatal)).await;
                    return;
                }
            }
        }
        CommitMode::PreviewOnly => {}
    }

    let _ = emit(&tx, &cancelled, tracker.complete()).await;
}

/// Builds the collection entry a committed run imports.
fn committed_item(payload: &ActionPayload) -> CollectionItem {
    let operation = match payload.transform {
        TransformKind::Plain => OperationKind::Downloaded,
        TransformKind::Crystallize => OperationKind::Crystallized,
        TransformKind::CropFinalize => OperationKind::Edited,
    };
    CollectionItem::new(payload.source_url.clone(), operation)
}
