//! Mural - the engine behind a wallpaper companion app.
//!
//! The crate owns everything between a user's "do something with this
//! image" intent and the collaborators that actually move bytes: the gate
//! chain deciding whether costly work may start, the replay memory for
//! intents suspended behind permission and purchase flows, the cancellable
//! fetch/transform/commit pipeline with observable progress, the ordered
//! multi-selectable collection with rollback-on-failure mutations, the
//! automatic rotation scheduler, and dedup tracking for OS-managed
//! downloads.
//!
//! Rendering, image codecs and kernels, the HTTP client, purchase
//! verification and the OS download manager stay outside; the engine sees
//! them only through the traits in [`pipeline`], [`collection`] and
//! [`download`]. Pipeline runs, the collection actor and rotation jobs are
//! tokio tasks, so entry points that spawn must be called inside a tokio
//! runtime.

pub mod action;
pub mod changer;
pub mod collection;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod settings;

pub use action::{
    ActionDispatcher, ActionKind, ActionPayload, ActionRequest, BlockReason, CommitMode,
    GateFlags, GateResult, PendingActionStore, Remedy, RemedyResolution, RequestToken,
    Submission, TransformKind,
};
pub use changer::{
    AutostartQuirks, CollectionRotation, IntervalOutcome, Rotation, WallpaperChanger,
};
pub use collection::{
    CollectionError, CollectionHandle, CollectionItem, CollectionStore, OperationKind,
    SelectionMode,
};
pub use download::{DownloadEnqueuer, DownloadTracker, ExternalDownloadId};
pub use error::MuralError;
pub use pipeline::{
    FailureKind, ImageFetcher, ImageTransformer, Pipeline, ProgressEvent, ProgressPhase,
    ProgressStream, WallpaperApplier,
};
pub use settings::{ChangerInterval, ChangerSettings, SettingsStore};
