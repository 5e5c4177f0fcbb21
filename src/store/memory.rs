//! In-memory record store for tests and `--ephemeral` runs.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::{Collection, RecordStore, record_id, seed};

pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
    seeded: bool,
}

impl MemoryStore {
    /// Store that seeds the starter dataset on first access, mirroring the
    /// JSON backend's behavior.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            seeded: true,
        }
    }

    /// Store whose collections start empty. Used by tests that need full
    /// control over the book.
    pub fn blank() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            seeded: false,
        }
    }

    fn load_mut<'a>(
        &self,
        map: &'a mut HashMap<Collection, Vec<Value>>,
        collection: Collection,
    ) -> Result<&'a mut Vec<Value>, StoreError> {
        match map.entry(collection) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => {
                let initial = if self.seeded {
                    seed::starter_records(collection)?
                } else {
                    Vec::new()
                };
                Ok(slot.insert(initial))
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let mut map = self.collections.write().await;
        Ok(self.load_mut(&mut map, collection)?.clone())
    }

    async fn put(&self, collection: Collection, record: Value) -> Result<Value, StoreError> {
        let mut map = self.collections.write().await;
        let records = self.load_mut(&mut map, collection)?;
        records.insert(0, record.clone());
        Ok(record)
    }

    async fn patch_by_id(
        &self,
        collection: Collection,
        id: &str,
        record: Value,
    ) -> Result<Value, StoreError> {
        let mut map = self.collections.write().await;
        let records = self.load_mut(&mut map, collection)?;
        let slot = records
            .iter_mut()
            .find(|existing| record_id(existing) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.as_str(),
                id: id.to_string(),
            })?;
        *slot = record.clone();
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::MemoryStore;
    use crate::store::{Collection, RecordStore};

    #[tokio::test]
    async fn seeded_store_matches_json_backend_semantics() {
        let store = MemoryStore::new();
        let clients = store.get_all(Collection::Clients).await.expect("read");
        assert!(!clients.is_empty());
    }

    #[tokio::test]
    async fn blank_store_starts_empty_and_keeps_insertion_order() {
        let store = MemoryStore::blank();
        assert!(
            store
                .get_all(Collection::Invoices)
                .await
                .expect("read")
                .is_empty()
        );

        store
            .put(Collection::Invoices, json!({"id": "one"}))
            .await
            .expect("put one");
        store
            .put(Collection::Invoices, json!({"id": "two"}))
            .await
            .expect("put two");

        let all = store.get_all(Collection::Invoices).await.expect("read");
        let ids: Vec<&str> = all
            .iter()
            .filter_map(|r| r.get("id").and_then(|v| v.as_str()))
            .collect();
        assert_eq!(ids, vec!["two", "one"]);
    }
}
