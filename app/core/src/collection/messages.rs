//! Message and outcome types for the collection actor.

use tokio::sync::oneshot;

use super::state::SelectionMode;
use super::{CollectionError, CollectionItem};

/// Commands processed by the collection actor, strictly in arrival order.
#[derive(Debug)]
pub(crate) enum CollectionCommand {
    Reorder {
        from: usize,
        to: usize,
        respond_to: oneshot::Sender<Result<Vec<CollectionItem>, CollectionError>>,
    },
    ToggleSelect {
        position: usize,
        respond_to: oneshot::Sender<Result<SelectionUpdate, CollectionError>>,
    },
    DeleteSelected {
        respond_to: oneshot::Sender<Result<DeleteOutcome, CollectionError>>,
    },
    AddItems {
        items: Vec<CollectionItem>,
        respond_to: oneshot::Sender<Result<AddOutcome, CollectionError>>,
    },
    SingleTarget {
        respond_to: oneshot::Sender<Result<CollectionItem, CollectionError>>,
    },
    Snapshot {
        respond_to: oneshot::Sender<Vec<CollectionItem>>,
    },
    Shutdown,
}

impl CollectionCommand {
    /// Human-readable command name, for logging.
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::Reorder { .. } => "Reorder",
            Self::ToggleSelect { .. } => "ToggleSelect",
            Self::DeleteSelected { .. } => "DeleteSelected",
            Self::AddItems { .. } => "AddItems",
            Self::SingleTarget { .. } => "SingleTarget",
            Self::Snapshot { .. } => "Snapshot",
            Self::Shutdown => "Shutdown",
        }
    }
}

/// Result of a selection toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionUpdate {
    /// Number of selected items after the toggle.
    pub selected_count: usize,
    /// The UI affordance state driven by that count.
    pub mode: SelectionMode,
}

/// Result of a successful batch delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// The removed items, in the order they were removed.
    pub removed: Vec<CollectionItem>,
    /// The remaining list, for immediate re-render.
    pub items: Vec<CollectionItem>,
    /// Whether the collection is now empty; the caller then shows the
    /// empty state and hides the rotation controls.
    pub now_empty: bool,
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// How many items were inserted (drives single vs. plural phrasing).
    pub added: usize,
    /// The full list after the insert.
    pub items: Vec<CollectionItem>,
}
