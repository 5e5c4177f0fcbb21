//! Record store abstraction.
//!
//! Provides a backend-agnostic `RecordStore` trait over named collections of
//! JSON records. Two implementations exist:
//!
//! - `json`: one file per collection under the data directory, rewritten in
//!   full on every mutation (the office runs single-operator, so the store
//!   stays deliberately non-transactional)
//! - `memory`: in-process map for tests and `--ephemeral` runs
//!
//! Records are stored as `serde_json::Value` with `camelCase` field names;
//! typed services deserialize at the edges via `fetch_all` / `save_record` /
//! `update_record`.

pub mod json;
pub mod memory;
pub mod seed;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;

pub use json::JsonStore;
pub use memory::MemoryStore;

/// Named collection persisted by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    Cases,
    Invoices,
    Expenses,
    FutureDebts,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Self::Clients,
        Self::Cases,
        Self::Invoices,
        Self::Expenses,
        Self::FutureDebts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Cases => "cases",
            Self::Invoices => "invoices",
            Self::Expenses => "expenses",
            Self::FutureDebts => "future_debts",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "clients" => Some(Self::Clients),
            "cases" => Some(Self::Cases),
            "invoices" => Some(Self::Invoices),
            "expenses" => Some(Self::Expenses),
            "future_debts" => Some(Self::FutureDebts),
            _ => None,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque persistence boundary for the office's collections.
///
/// The contract is deliberately small: fetch everything, prepend one record,
/// or replace one record by id. No delete, no transactions, no partial-field
/// patch. First access to a collection with nothing persisted yet seeds the
/// built-in starter dataset.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records of `collection`, newest first.
    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError>;

    /// Prepend `record` to `collection` and return it as persisted.
    async fn put(&self, collection: Collection, record: Value) -> Result<Value, StoreError>;

    /// Replace the record whose `id` field equals `id`.
    async fn patch_by_id(
        &self,
        collection: Collection,
        id: &str,
        record: Value,
    ) -> Result<Value, StoreError>;
}

/// Read the `id` field every stored record carries.
pub fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// Fetch a whole collection as typed records, preserving stored order.
pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
) -> Result<Vec<T>, StoreError> {
    let raw = store.get_all(collection).await?;
    raw.into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
                collection: collection.as_str(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Persist a new typed record at the front of `collection`.
pub async fn save_record<T: Serialize + DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
    record: &T,
) -> Result<T, StoreError> {
    let value = encode(collection, record)?;
    let stored = store.put(collection, value).await?;
    decode(collection, stored)
}

/// Replace the typed record with the given id.
pub async fn update_record<T: Serialize + DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
    id: &str,
    record: &T,
) -> Result<T, StoreError> {
    let value = encode(collection, record)?;
    let stored = store.patch_by_id(collection, id, value).await?;
    decode(collection, stored)
}

fn encode<T: Serialize>(collection: Collection, record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::Encode {
        collection: collection.as_str(),
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(collection: Collection, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
        collection: collection.as_str(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::Collection;

    #[test]
    fn collection_names_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(Collection::from_name(collection.as_str()), Some(collection));
        }
        assert_eq!(Collection::from_name("ledgers"), None);
    }
}
