//! In-memory storage adapter.
//!
//! Holds collections in process memory behind a mutex. Records survive
//! `disconnect()`/`connect()` cycles for the lifetime of the adapter, but are
//! lost when it is dropped. Useful for tests and ephemeral runs.

use super::collections::CollectionSet;
use super::traits::StorageAdapter;
use crate::models::{Record, RecordId};
use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    connected: bool,
    data: CollectionSet,
}

/// In-memory storage adapter.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    state: Mutex<MemoryState>,
}

impl MemoryAdapter {
    /// Creates an empty, disconnected adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| Error::operation("lock_memory_store", e))
    }

    /// Locks the state and fails unless connected.
    fn connected_state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        let state = self.lock_state()?;
        if !state.connected {
            return Err(Error::NotConnected {
                backend: self.name().to_string(),
            });
        }
        Ok(state)
    }
}

impl StorageAdapter for MemoryAdapter {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn connect(&self) -> Result<()> {
        self.lock_state()?.connected = true;
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        self.lock_state()?.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock_state().is_ok_and(|state| state.connected)
    }

    fn create(&self, collection: &str, record: Record) -> Result<Record> {
        self.connected_state()?.data.insert(collection, record)
    }

    fn read(&self, collection: &str, id: RecordId) -> Result<Record> {
        self.connected_state()?.data.get(collection, id)
    }

    fn read_all(&self, collection: &str) -> Result<Vec<Record>> {
        Ok(self.connected_state()?.data.all(collection))
    }

    fn update(&self, collection: &str, id: RecordId, partial: Record) -> Result<Record> {
        self.connected_state()?.data.update(collection, id, partial)
    }

    fn delete(&self, collection: &str, id: RecordId) -> Result<()> {
        self.connected_state()?.data.remove(collection, id)
    }
}
