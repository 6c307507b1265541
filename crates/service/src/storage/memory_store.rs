use std::collections::HashMap;

use async_trait::async_trait;
use configs::StorageBackend;
use tokio::sync::RwLock;

use crate::errors::{StorageError, StorageResult};
use crate::storage::{validate_key, Storage};

/// Process-lifetime record store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn store(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut map = self.inner.write().await;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn list(&self) -> StorageResult<HashMap<String, String>> {
        let map = self.inner.read().await;
        Ok(map.clone())
    }

    async fn get(&self, key: &str) -> StorageResult<String> {
        let map = self.inner.read().await;
        map.get(key).cloned().ok_or_else(|| StorageError::not_found(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let mut map = self.inner.write().await;
        map.remove(key).map(|_| ()).ok_or_else(|| StorageError::not_found(key))
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::InMemory
    }
}
