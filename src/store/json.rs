//! JSON-file record store.
//!
//! One file per collection under the data directory, read in full on every
//! fetch and rewritten in full on every mutation. Writes go through a temp
//! file and an atomic rename so a crash mid-write never leaves a truncated
//! collection behind. An advisory lock on the data directory keeps a second
//! process from opening the same store; within one process the rewrite-on-
//! write pattern is left as-is.

use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs4::FileExt;
use serde_json::Value;

use crate::error::StoreError;
use crate::store::{Collection, RecordStore, record_id, seed};

const LOCK_FILE: &str = ".wakeel.lock";

pub struct JsonStore {
    data_dir: PathBuf,
    // Held for the lifetime of the store; dropping it releases the lock.
    _lock: File,
}

impl JsonStore {
    /// Open (creating if needed) the store rooted at `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir).map_err(|source| StoreError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        let lock_path = data_dir.join(LOCK_FILE);
        let lock = File::create(&lock_path).map_err(|source| StoreError::Io {
            path: lock_path.clone(),
            source,
        })?;
        lock.try_lock_exclusive()
            .map_err(|_| StoreError::Locked {
                path: data_dir.to_path_buf(),
            })?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            _lock: lock,
        })
    }

    fn collection_path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(format!("{}.json", collection.as_str()))
    }

    /// Load a collection, seeding the starter dataset when the file does not
    /// exist yet. A present-but-empty list is respected, not re-seeded.
    async fn read_collection(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        let path = self.collection_path(collection);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let records = seed::starter_records(collection)?;
                tracing::info!(collection = collection.as_str(), "seeding starter records");
                self.write_collection(collection, &records).await?;
                return Ok(records);
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            collection: collection.as_str(),
            message: e.to_string(),
        })
    }

    async fn write_collection(
        &self,
        collection: Collection,
        records: &[Value],
    ) -> Result<(), StoreError> {
        let path = self.collection_path(collection);
        let tmp = self.data_dir.join(format!("{}.json.tmp", collection.as_str()));

        let body = serde_json::to_vec_pretty(records).map_err(|e| StoreError::Encode {
            collection: collection.as_str(),
            message: e.to_string(),
        })?;

        tokio::fs::write(&tmp, body)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io { path, source })
    }
}

#[async_trait]
impl RecordStore for JsonStore {
    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        self.read_collection(collection).await
    }

    async fn put(&self, collection: Collection, record: Value) -> Result<Value, StoreError> {
        let mut records = self.read_collection(collection).await?;
        records.insert(0, record.clone());
        self.write_collection(collection, &records).await?;
        Ok(record)
    }

    async fn patch_by_id(
        &self,
        collection: Collection,
        id: &str,
        record: Value,
    ) -> Result<Value, StoreError> {
        let mut records = self.read_collection(collection).await?;
        let slot = records
            .iter_mut()
            .find(|existing| record_id(existing) == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.as_str(),
                id: id.to_string(),
            })?;
        *slot = record.clone();
        self.write_collection(collection, &records).await?;
        Ok(record)
    }
}
