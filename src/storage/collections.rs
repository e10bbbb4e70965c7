//! In-process collection tables shared by the memory and document adapters.

use crate::models::record::{strip_id, with_id};
use crate::models::{Record, RecordId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One collection: record bodies keyed by id, plus the next id to assign.
#[derive(Debug, Clone, Default)]
pub(crate) struct Collection {
    records: BTreeMap<RecordId, Record>,
    last_id: RecordId,
}

impl Collection {
    fn insert(&mut self, collection: &str, mut body: Record) -> Result<Record> {
        let id = self.last_id.checked_add(1).ok_or_else(|| {
            Error::operation("assign_record_id", format!("id space exhausted in '{collection}'"))
        })?;
        strip_id(&mut body);
        self.last_id = id;
        let stored = with_id(id, &body);
        self.records.insert(id, body);
        Ok(stored)
    }
}

/// All collections of one store.
///
/// Serializes in the `{"collection": {"1": {...}}}` layout of an embedded
/// document database file. Record bodies are stored without their id.
#[derive(Debug, Clone, Default)]
pub(crate) struct CollectionSet {
    collections: BTreeMap<String, Collection>,
}

impl CollectionSet {
    pub(crate) fn insert(&mut self, collection: &str, body: Record) -> Result<Record> {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(collection, body)
    }

    pub(crate) fn get(&self, collection: &str, id: RecordId) -> Result<Record> {
        self.collections
            .get(collection)
            .and_then(|c| c.records.get(&id))
            .map(|body| with_id(id, body))
            .ok_or_else(|| Error::not_found(collection, id))
    }

    pub(crate) fn all(&self, collection: &str) -> Vec<Record> {
        self.collections
            .get(collection)
            .map(|c| {
                c.records
                    .iter()
                    .map(|(id, body)| with_id(*id, body))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn update(
        &mut self,
        collection: &str,
        id: RecordId,
        mut partial: Record,
    ) -> Result<Record> {
        let body = self
            .collections
            .get_mut(collection)
            .and_then(|c| c.records.get_mut(&id))
            .ok_or_else(|| Error::not_found(collection, id))?;
        strip_id(&mut partial);
        body.extend(partial);
        Ok(with_id(id, body))
    }

    pub(crate) fn remove(&mut self, collection: &str, id: RecordId) -> Result<()> {
        self.collections
            .get_mut(collection)
            .and_then(|c| c.records.remove(&id))
            .map(|_| ())
            .ok_or_else(|| Error::not_found(collection, id))
    }
}

/// On-disk shape: collection name → decimal id → record body.
type StoredLayout = BTreeMap<String, BTreeMap<String, Record>>;

impl Serialize for CollectionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let layout: StoredLayout = self
            .collections
            .iter()
            .map(|(name, c)| {
                let records = c
                    .records
                    .iter()
                    .map(|(id, body)| (id.to_string(), body.clone()))
                    .collect();
                (name.clone(), records)
            })
            .collect();
        layout.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CollectionSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let layout = StoredLayout::deserialize(deserializer)?;
        let mut collections = BTreeMap::new();
        for (name, stored) in layout {
            let mut collection = Collection::default();
            for (key, body) in stored {
                let id: RecordId = key.parse().map_err(|_| {
                    serde::de::Error::custom(format!("invalid record id '{key}' in '{name}'"))
                })?;
                collection.last_id = collection.last_id.max(id);
                collection.records.insert(id, body);
            }
            collections.insert(name, collection);
        }
        Ok(Self { collections })
    }
}
