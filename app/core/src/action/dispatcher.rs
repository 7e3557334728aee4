//! Gated dispatch of user intents.
//!
//! Every intent passes the gate chain first. Passing intents start a
//! pipeline run (or an OS-managed download); blocked intents surface the
//! remedial flow to the caller, and — for the two remedies that suspend
//! the process behind an external UI — record the request for replay. When
//! the remedial flow reports back, the recorded request is consumed on
//! both outcomes and re-submitted unchanged only on success.

use std::sync::Arc;

use super::gate::{self, BlockReason, GateFlags, GateResult, Remedy};
use super::pending::PendingActionStore;
use super::{ActionKind, ActionPayload, ActionRequest, CommitMode, RequestToken, TransformKind};
use crate::collection::{CollectionError, CollectionHandle};
use crate::download::{DownloadError, DownloadTracker, ExternalDownloadId};
use crate::pipeline::{Pipeline, ProgressStream};

/// Outcome of submitting an intent.
#[derive(Debug)]
pub enum Submission {
    /// The gates passed and a pipeline run started; observe it here.
    Started(ProgressStream),
    /// The gates passed and the OS download manager took the job.
    Enqueued(ExternalDownloadId),
    /// A gate blocked the intent; show the remedial flow.
    Blocked { reason: BlockReason, remedy: Remedy },
    /// The download manager refused the job.
    EnqueueFailed(DownloadError),
}

/// Outcome of a remedial flow reporting back.
#[derive(Debug)]
pub enum RemedyResolution {
    /// The remedy succeeded; the original request was re-submitted.
    Replayed(Submission),
    /// The remedy was declined; nothing was replayed and the recorded
    /// request is gone. Surface a "remedy declined" message.
    Declined,
    /// No request was recorded for this token.
    NothingPending,
}

/// Routes gated user intents into the pipeline, the download manager and
/// the collection engine.
pub struct ActionDispatcher {
    pipeline: Pipeline,
    pending: Arc<PendingActionStore>,
    downloads: Arc<DownloadTracker>,
    collection: CollectionHandle,
}

impl ActionDispatcher {
    /// Creates a dispatcher over the engine's moving parts.
    #[must_use]
    pub fn new(
        pipeline: Pipeline,
        pending: Arc<PendingActionStore>,
        downloads: Arc<DownloadTracker>,
        collection: CollectionHandle,
    ) -> Self {
        Self { pipeline, pending, downloads, collection }
    }

    /// Submits an intent through the gate chain.
    ///
    /// The caller supplies the gate flags fresh on every call; the
    /// dispatcher only folds in what it knows first-hand — whether a run
    /// for the same token (or a download for the same link) is already in
    /// flight.
    pub fn submit(&self, request: ActionRequest, flags: GateFlags) -> Submission {
        let busy = flags.busy
            || self.pipeline.is_running(request.token)
            || (request.kind() == ActionKind::Download
                && self.downloads.is_in_flight(&request.payload.source_url));
        let flags = GateFlags { busy, ..flags };

        match gate::evaluate(request.kind(), flags) {
            GateResult::Proceed => self.execute(request),
            GateResult::Blocked { reason, remedy } => {
                tracing::debug!(
                    action = request.kind().name(),
                    reason = ?reason,
                    "intent blocked"
                );
                if remedy.is_replayable() {
                    self.pending.record(request);
                }
                Submission::Blocked { reason, remedy }
            }
        }
    }

    /// Delivers the outcome of a remedial flow for `token`.
    ///
    /// The pending entry is consumed whether the remedy succeeded or not;
    /// only success replays the original request, unchanged, against the
    /// caller's fresh flags.
    pub fn resolve_remedy(
        &self,
        token: RequestToken,
        granted: bool,
        flags: GateFlags,
    ) -> RemedyResolution {
        let Some(request) = self.pending.consume(token) else {
            tracing::warn!(action = token.kind().name(), "remedy result without pending action");
            return RemedyResolution::NothingPending;
        };
        if granted {
            RemedyResolution::Replayed(self.submit(request, flags))
        } else {
            tracing::debug!(action = token.kind().name(), "remedy declined, dropping intent");
            RemedyResolution::Declined
        }
    }

    /// Requests cancellation of the pipeline run for `token`.
    pub fn cancel(&self, token: RequestToken) -> bool { self.pipeline.cancel(token) }

    /// Correlates an OS download-completion signal; returns the finished
    /// link.
    pub fn complete_download(&self, id: ExternalDownloadId) -> Option<String> {
        self.downloads.complete(id)
    }

    /// The collection engine handle.
    #[must_use]
    pub const fn collection(&self) -> &CollectionHandle { &self.collection }

    /// Applies the single selected collection item as the wallpaper.
    ///
    /// # Errors
    ///
    /// [`CollectionError::SelectionNotSingle`] unless exactly one item is
    /// selected.
    pub async fn apply_selected_as_wallpaper(
        &self,
        flags: GateFlags,
    ) -> Result<Submission, CollectionError> {
        let target = self.collection.single_selection().await?;
        let request = ActionRequest::new(
            ActionKind::QuickSet,
            ActionPayload {
                source_url: target.source_path,
                transform: TransformKind::Plain,
                commit: CommitMode::SetWallpaper,
            },
        );
        Ok(self.submit(request, flags))
    }

    /// Crystallizes the single selected collection item, persisting the
    /// result back into the collection.
    ///
    /// # Errors
    ///
    /// [`CollectionError::SelectionNotSingle`] unless exactly one item is
    /// selected.
    pub async fn crystallize_selected(
        &self,
        flags: GateFlags,
    ) -> Result<Submission, CollectionError> {
        let target = self.collection.single_selection().await?;
        let request = ActionRequest::new(
            ActionKind::Crystallize,
            ActionPayload {
                source_url: target.source_path,
                transform: TransformKind::Crystallize,
                commit: CommitMode::AddToCollection,
            },
        );
        Ok(self.submit(request, flags))
    }

    fn execute(&self, request: ActionRequest) -> Submission {
        if request.kind() == ActionKind::Download {
            return match self.downloads.begin(&request.payload.source_url) {
                Ok(id) => Submission::Enqueued(id),
                Err(DownloadError::AlreadyInFlight) => Submission::Blocked {
                    reason: BlockReason::Busy,
                    remedy: Remedy::ShowBusyMessage,
                },
                Err(err) => Submission::EnqueueFailed(err),
            };
        }
        Submission::Started(self.pipeline.run(request))
    }
}
