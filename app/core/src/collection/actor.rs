//! The collection actor.
//!
//! Owns the list, the selection and the store, and processes commands
//! sequentially so concurrent reorder/delete/import calls resolve in
//! arrival order without fine-grained locking. Persistence failures roll
//! the optimistic mutation back wholesale from a snapshot taken before the
//! mutation; the failed outcome carries the restored list so the caller
//! can re-render fully.

use tokio::sync::mpsc;

use super::handle::CollectionHandle;
use super::messages::{AddOutcome, CollectionCommand, DeleteOutcome, SelectionUpdate};
use super::state::{CollectionState, SelectionMode};
use super::store::CollectionStore;
use super::{CollectionError, CollectionItem};

/// Channel buffer for the collection actor.
const CHANNEL_BUFFER_SIZE: usize = 64;

pub(crate) struct CollectionActor<S> {
    state: CollectionState,
    store: S,
    receiver: mpsc::Receiver<CollectionCommand>,
}

impl<S: CollectionStore> CollectionActor<S> {
    /// Spawns the actor with an already-loaded item list and returns the
    /// handle for communicating with it.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(store: S, items: Vec<CollectionItem>) -> CollectionHandle {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let actor = Self {
            state: CollectionState::new(items),
            store,
            receiver,
        };
        tokio::spawn(actor.run());
        CollectionHandle::new(sender)
    }

    async fn run(mut self) {
        tracing::debug!("collection actor started");
        while let Some(command) = self.receiver.recv().await {
            if matches!(command, CollectionCommand::Shutdown) {
                tracing::debug!("collection actor received shutdown");
                return;
            }
            tracing::trace!(command = command.name(), "collection command");
            self.handle_command(command);
        }
        tracing::debug!("collection actor channel closed, exiting");
    }

    fn handle_command(&mut self, command: CollectionCommand) {
        match command {
            CollectionCommand::Reorder { from, to, respond_to } => {
                let _ = respond_to.send(self.on_reorder(from, to));
            }
            CollectionCommand::ToggleSelect { position, respond_to } => {
                let _ = respond_to.send(self.on_toggle_select(position));
            }
            CollectionCommand::DeleteSelected { respond_to } => {
                let _ = respond_to.send(self.on_delete_selected());
            }
            CollectionCommand::AddItems { items, respond_to } => {
                let _ = respond_to.send(self.on_add_items(items));
            }
            CollectionCommand::SingleTarget { respond_to } => {
                let _ = respond_to.send(self.on_single_target());
            }
            CollectionCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.state.items().to_vec());
            }
            CollectionCommand::Shutdown => unreachable!(),
        }
    }

    fn on_reorder(
        &mut self,
        from: usize,
        to: usize,
    ) -> Result<Vec<CollectionItem>, CollectionError> {
        let snapshot = self.state.snapshot();
        self.state.reorder(from, to)?;
        if let Err(err) = self.store.persist_order(self.state.items()) {
            tracing::warn!(error = %err, "persisting reorder failed, restoring previous order");
            self.state.restore(snapshot);
            return Err(CollectionError::ReorderFailed {
                restored: self.state.items().to_vec(),
            });
        }
        Ok(self.state.items().to_vec())
    }

    fn on_toggle_select(
        &mut self,
        position: usize,
    ) -> Result<SelectionUpdate, CollectionError> {
        let selected_count = self.state.toggle_select(position)?;
        Ok(SelectionUpdate {
            selected_count,
            mode: SelectionMode::from_count(selected_count),
        })
    }

    fn on_delete_selected(&mut self) -> Result<DeleteOutcome, CollectionError> {
        if self.state.selection().is_empty() {
            return Ok(DeleteOutcome {
                removed: Vec::new(),
                items: self.state.items().to_vec(),
                now_empty: self.state.is_empty(),
            });
        }
        let snapshot = self.state.snapshot();
        let removed = self.state.delete_selected();
        let ids: Vec<_> = removed.iter().map(|item| item.id).collect();
        if let Err(err) = self.store.persist_batch_delete(&ids) {
            tracing::warn!(error = %err, "persisting delete failed, restoring previous state");
            self.state.restore(snapshot);
            return Err(CollectionError::DeleteFailed {
                restored: self.state.items().to_vec(),
            });
        }
        Ok(DeleteOutcome {
            removed,
            items: self.state.items().to_vec(),
            now_empty: self.state.is_empty(),
        })
    }

    fn on_add_items(
        &mut self,
        items: Vec<CollectionItem>,
    ) -> Result<AddOutcome, CollectionError> {
        let snapshot = self.state.snapshot();
        let inserted = items.clone();
        let added = self.state.insert(items)?;
        if let Err(err) = self.store.persist_insert(&inserted) {
            tracing::warn!(error = %err, "persisting insert failed, restoring previous state");
            self.state.restore(snapshot);
            return Err(CollectionError::InsertFailed {
                restored: self.state.items().to_vec(),
            });
        }
        Ok(AddOutcome { added, items: self.state.items().to_vec() })
    }

    fn on_single_target(&self) -> Result<CollectionItem, CollectionError> {
        let count = self.state.selection().len();
        match self.state.primary_selection() {
            Some(item) if count == 1 => Ok(item.clone()),
            _ => Err(CollectionError::SelectionNotSingle(count)),
        }
    }
}
