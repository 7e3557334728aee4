//! Persistence contract behind the collection engine.
//!
//! The store performs the authoritative writes that back the optimistic
//! in-memory mutations. It is invoked only from inside the collection
//! actor task, so implementations may block (a database, the filesystem);
//! callers of the handle never wait on anything but the actor's reply.

use thiserror::Error;
use uuid::Uuid;

use super::CollectionItem;

/// A rejected authoritative write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("collection store failure: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    /// Convenience constructor from anything displayable.
    pub fn new(message: impl Into<String>) -> Self { Self(message.into()) }
}

/// Authoritative persistence for the collection.
///
/// Each method either fully applies the mutation or rejects it; the engine
/// rolls back its optimistic copy on rejection.
pub trait CollectionStore: Send + 'static {
    /// Persists the complete new ordering.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the order could not be written.
    fn persist_order(&mut self, items: &[CollectionItem]) -> Result<(), StoreError>;

    /// Persists removal of the given item ids.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the deletion could not be written.
    fn persist_batch_delete(&mut self, ids: &[Uuid]) -> Result<(), StoreError>;

    /// Persists newly imported items.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the insert could not be written.
    fn persist_insert(&mut self, items: &[CollectionItem]) -> Result<(), StoreError>;
}
