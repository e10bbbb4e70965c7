//! Storage adapter trait definition.

use super::Query;
use crate::Result;
use crate::models::{Record, RecordId};

/// Uniform document contract implemented once per backend technology.
///
/// Records live in named collections and are keyed by a store-assigned
/// integer id. Every record an adapter returns carries that id in its `id`
/// field. Adapters serialize concurrent access internally, so a single
/// instance can be shared for the life of the process.
///
/// `connect()` must be called before any other operation; until then every
/// operation fails with [`crate::Error::NotConnected`].
pub trait StorageAdapter: Send + Sync {
    /// The backend name, for logs and errors.
    fn name(&self) -> &'static str;

    /// Acquires the backing resource. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be opened or initialized.
    fn connect(&self) -> Result<()>;

    /// Releases the backing resource. A no-op when not connected.
    ///
    /// # Errors
    ///
    /// Returns an error if pending state cannot be flushed.
    fn disconnect(&self) -> Result<()>;

    /// Returns true between `connect()` and `disconnect()`.
    fn is_connected(&self) -> bool;

    /// Stores a new record and returns it with its assigned id.
    ///
    /// Any `id` field in the input is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if not connected or the write fails.
    fn create(&self, collection: &str, record: Record) -> Result<Record>;

    /// Reads one record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the id does not exist.
    fn read(&self, collection: &str, id: RecordId) -> Result<Record>;

    /// Reads every record of a collection in insertion order.
    ///
    /// An unknown collection is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if not connected or the read fails.
    fn read_all(&self, collection: &str) -> Result<Vec<Record>>;

    /// Merges `partial` into an existing record and returns the result.
    ///
    /// The `id` field cannot be changed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the id does not exist.
    fn update(&self, collection: &str, id: RecordId, partial: Record) -> Result<Record>;

    /// Removes a record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the id does not exist.
    fn delete(&self, collection: &str, id: RecordId) -> Result<()>;

    /// Returns every record satisfying all predicates of `query`.
    ///
    /// Default implementation filters [`Self::read_all`].
    ///
    /// # Errors
    ///
    /// Returns an error if not connected or the read fails.
    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Record>> {
        Ok(self
            .read_all(collection)?
            .into_iter()
            .filter(|record| query.matches(record))
            .collect())
    }
}
