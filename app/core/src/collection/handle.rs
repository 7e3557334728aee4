//! Handle for communicating with the collection actor.
//!
//! Cheap to clone and shareable across tasks. Every method enqueues a
//! command and awaits the actor's reply over a oneshot channel; if the
//! actor has stopped, [`CollectionError::EngineStopped`] is returned.

use tokio::sync::{mpsc, oneshot};

use super::messages::{AddOutcome, CollectionCommand, DeleteOutcome, SelectionUpdate};
use super::{CollectionError, CollectionItem};

/// Handle for the collection mutation engine.
#[derive(Clone)]
pub struct CollectionHandle {
    sender: mpsc::Sender<CollectionCommand>,
}

impl CollectionHandle {
    pub(crate) const fn new(sender: mpsc::Sender<CollectionCommand>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, CollectionError>>) -> CollectionCommand,
    ) -> Result<T, CollectionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| CollectionError::EngineStopped)?;
        rx.await.map_err(|_| CollectionError::EngineStopped)?
    }

    /// Moves the item at `from` to `to`, returning the new ordering for
    /// immediate render. The mutation is applied optimistically before the
    /// authoritative write; a rejected write restores the previous order
    /// and surfaces it through [`CollectionError::ReorderFailed`].
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidPosition`] for out-of-range indices,
    /// [`CollectionError::ReorderFailed`] when persistence rejected the
    /// new order, [`CollectionError::EngineStopped`] if the actor is gone.
    pub async fn reorder(
        &self,
        from: usize,
        to: usize,
    ) -> Result<Vec<CollectionItem>, CollectionError> {
        self.request(|respond_to| CollectionCommand::Reorder { from, to, respond_to })
            .await
    }

    /// Toggles selection of the item at `position`; the returned update
    /// carries the new count and the UI affordance state it drives.
    ///
    /// # Errors
    ///
    /// [`CollectionError::InvalidPosition`] or
    /// [`CollectionError::EngineStopped`].
    pub async fn toggle_select(
        &self,
        position: usize,
    ) -> Result<SelectionUpdate, CollectionError> {
        self.request(|respond_to| CollectionCommand::ToggleSelect { position, respond_to })
            .await
    }

    /// Deletes the selected items and clears the selection.
    ///
    /// # Errors
    ///
    /// [`CollectionError::DeleteFailed`] when persistence rejected the
    /// deletion (previous state restored), or
    /// [`CollectionError::EngineStopped`].
    pub async fn delete_selected(&self) -> Result<DeleteOutcome, CollectionError> {
        self.request(|respond_to| CollectionCommand::DeleteSelected { respond_to })
            .await
    }

    /// Imports items into the collection.
    ///
    /// # Errors
    ///
    /// [`CollectionError::AlreadyInCollection`] when any entry duplicates
    /// existing provenance, [`CollectionError::InsertFailed`] when
    /// persistence rejected the write, or
    /// [`CollectionError::EngineStopped`].
    pub async fn add_items(
        &self,
        items: Vec<CollectionItem>,
    ) -> Result<AddOutcome, CollectionError> {
        self.request(|respond_to| CollectionCommand::AddItems { items, respond_to })
            .await
    }

    /// Resolves the target of a single-target action (apply-as-wallpaper,
    /// crystallize): valid only when exactly one item is selected, in which
    /// case the first selection-order entry is returned.
    ///
    /// # Errors
    ///
    /// [`CollectionError::SelectionNotSingle`] with the actual count, or
    /// [`CollectionError::EngineStopped`].
    pub async fn single_selection(&self) -> Result<CollectionItem, CollectionError> {
        self.request(|respond_to| CollectionCommand::SingleTarget { respond_to })
            .await
    }

    /// Current item list, in order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::EngineStopped`] if the actor is gone.
    pub async fn snapshot(&self) -> Result<Vec<CollectionItem>, CollectionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CollectionCommand::Snapshot { respond_to: tx })
            .await
            .map_err(|_| CollectionError::EngineStopped)?;
        rx.await.map_err(|_| CollectionError::EngineStopped)
    }

    /// Requests a graceful stop of the actor.
    pub fn shutdown(&self) {
        let _ = self.sender.try_send(CollectionCommand::Shutdown);
    }

    /// Whether the actor is still running (channel open).
    #[must_use]
    pub fn is_alive(&self) -> bool { !self.sender.is_closed() }
}

impl std::fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
