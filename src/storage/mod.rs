//! Storage layer abstraction.
//!
//! Every backend implements the same document contract ([`StorageAdapter`]):
//! named collections of schemaless [`Record`](crate::models::Record)s keyed by
//! a store-assigned integer id, with equality/inequality predicate queries.
//!
//! | Backend | Adapter | Location |
//! |---------|---------|----------|
//! | Document | [`DocumentStoreAdapter`] | `data/db.json` |
//! | Memory | [`MemoryAdapter`] | Process memory |
//! | `SQLite` | [`SqliteAdapter`] | `data/classroom.db` |
//! | PostgreSQL | Not implemented | Rejected by [`StorageAdapterFactory`] |

// Allow significant_drop_tightening - guards are held for the whole operation.
#![allow(clippy::significant_drop_tightening)]

mod collections;
mod document;
mod factory;
mod memory;
mod query;
mod sqlite;
mod traits;

pub use document::DocumentStoreAdapter;
pub use factory::StorageAdapterFactory;
pub use memory::MemoryAdapter;
pub use query::{Operator, Predicate, Query};
pub use sqlite::SqliteAdapter;
pub use traits::StorageAdapter;
