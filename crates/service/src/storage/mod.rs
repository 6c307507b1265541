//! Storage abstractions for service layer
//!
//! One capability contract (`Storage`) with two interchangeable backends:
//! an in-process map and a directory of files.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use configs::{StorageBackend, StorageConfig};
use tracing::info;

use crate::errors::{StorageError, StorageResult};

pub mod disk_store;
pub mod memory_store;

pub use disk_store::DiskStore;
pub use memory_store::MemoryStore;

/// Key-value record storage.
/// Implementations must be safe to share between concurrent requests.
///
/// `""`, `"."` and `".."` are never valid keys: `store` rejects them with
/// `StorageError::InvalidKey`, and `get`/`delete` report them as `NotFound`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert or overwrite the value for `key`; fails with `InvalidKey` per [`validate_key`].
    async fn store(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Snapshot of every stored record. No ordering guarantee.
    async fn list(&self) -> StorageResult<HashMap<String, String>>;

    /// Value for `key`, or `StorageError::NotFound`.
    async fn get(&self, key: &str) -> StorageResult<String>;

    /// Remove `key`, or `StorageError::NotFound` when absent.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Which backend variant this store is.
    fn backend(&self) -> StorageBackend;
}

/// Reject keys that no backend can hold as a distinct record.
pub fn validate_key(key: &str) -> StorageResult<()> {
    match key {
        "" | "." | ".." => Err(StorageError::InvalidKey(key.to_string())),
        _ => Ok(()),
    }
}

/// Build the backend selected by configuration.
pub async fn open_storage(cfg: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match cfg.backend {
        StorageBackend::InMemory => Arc::new(MemoryStore::new()),
        StorageBackend::Disk => Arc::new(DiskStore::open(&cfg.root_dir).await?),
    };
    info!(backend = %storage.backend(), "storage opened");
    Ok(storage)
}
