//! Collection mutation engine.
//!
//! The collection is an ordered, reorderable, multi-selectable list of
//! imported images. All mutations funnel through a single actor task so
//! concurrent operations resolve in arrival order; the in-memory list is
//! the one copy shown to callers, updated optimistically and restored
//! wholesale from a snapshot when the authoritative store rejects a write.

mod actor;
mod handle;
mod messages;
mod state;
mod store;

use thiserror::Error;
use uuid::Uuid;

pub use handle::CollectionHandle;
pub use messages::{AddOutcome, DeleteOutcome, SelectionUpdate};
pub use state::{SelectionMode, SelectionSet};
pub use store::{CollectionStore, StoreError};

// ============================================================================
// Items
// ============================================================================

/// How an item entered the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Imported from a completed download.
    Downloaded,
    /// Finalized from the external crop/edit tool.
    Edited,
    /// Produced by the crystallize transform.
    Crystallized,
    /// A solid/minimal color wallpaper.
    MinimalColor,
}

/// One image in the collection.
///
/// The id is minted at import time and stays stable across reorders; the
/// source path plus operation identify the item's provenance and drive
/// duplicate rejection on import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionItem {
    /// Stable identifier.
    pub id: Uuid,
    /// Where the image lives (or came from).
    pub source_path: String,
    /// How the image was produced.
    pub operation: OperationKind,
}

impl CollectionItem {
    /// Creates an item with a fresh id.
    #[must_use]
    pub fn new(source_path: impl Into<String>, operation: OperationKind) -> Self {
        Self {
            id: Uuid::now_v7(),
            source_path: source_path.into(),
            operation,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by the collection engine.
///
/// The `*Failed` variants mean the authoritative store rejected a mutation;
/// the optimistic copy has already been rolled back and the carried list is
/// the restored state the caller must re-render from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// An index was outside the current list.
    #[error("position {0} is outside the collection")]
    InvalidPosition(usize),
    /// Import would duplicate an existing item's provenance.
    #[error("image is already in the collection")]
    AlreadyInCollection,
    /// A single-target action ran with a selection count other than one.
    #[error("exactly one selected item is required (found {0})")]
    SelectionNotSingle(usize),
    /// Persisting a reorder failed; previous order restored.
    #[error("could not persist the new order; previous order restored")]
    ReorderFailed { restored: Vec<CollectionItem> },
    /// Persisting a delete failed; previous state restored.
    #[error("could not persist the deletion; previous state restored")]
    DeleteFailed { restored: Vec<CollectionItem> },
    /// Persisting an import failed; previous state restored.
    #[error("could not persist the import; previous state restored")]
    InsertFailed { restored: Vec<CollectionItem> },
    /// The actor task is gone (shutdown or runtime teardown).
    #[error("collection engine has stopped")]
    EngineStopped,
}

// ============================================================================
// Spawning
// ============================================================================

/// Spawns the collection engine over `store` with an already-loaded item
/// list, returning the handle all mutations go through.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn<S: CollectionStore>(store: S, items: Vec<CollectionItem>) -> CollectionHandle {
    actor::CollectionActor::spawn(store, items)
}
