use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use configs::StorageBackend;
use tokio::{fs, sync::RwLock};
use tracing::{debug, info, warn};

use crate::errors::{StorageError, StorageResult};
use crate::storage::{validate_key, Storage};

/// Directory-backed record store: one file per key, file bytes are the value.
///
/// Keys are used as file names verbatim. A key containing a path separator or
/// `..` resolves outside a single file under `root`; callers that accept
/// untrusted keys must validate them first.
#[derive(Debug)]
pub struct DiskStore {
    root: PathBuf,
    // Guards the directory as a whole; writers exclude List and Get.
    lock: RwLock<()>,
}

impl DiskStore {
    /// Open a store rooted at `root`, creating the directory if missing.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StorageError::NotADirectory(root)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&root).await.map_err(|e| StorageError::io(&root, e))?;
                info!(root = %root.display(), "storage directory created");
            }
            Err(e) => return Err(StorageError::io(&root, e)),
        }
        Ok(Self { root, lock: RwLock::new(()) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Whether `path` is an existing regular file. Directories count as absent.
    async fn is_record(path: &Path) -> StorageResult<bool> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    async fn read_value(path: &Path) -> StorageResult<String> {
        let bytes = fs::read(path).await.map_err(|e| StorageError::io(path, e))?;
        String::from_utf8(bytes).map_err(|_| StorageError::InvalidUtf8 { path: path.to_path_buf() })
    }
}

#[async_trait]
impl Storage for DiskStore {
    async fn store(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        let path = self.path_for(key);
        let _guard = self.lock.write().await;
        fs::write(&path, value.as_bytes()).await.map_err(|e| StorageError::io(&path, e))?;
        debug!(path = %path.display(), bytes = value.len(), "record written");
        Ok(())
    }

    async fn list(&self) -> StorageResult<HashMap<String, String>> {
        let _guard = self.lock.read().await;
        let mut records = HashMap::new();
        let mut dir = fs::read_dir(&self.root).await.map_err(|e| StorageError::io(&self.root, e))?;
        while let Some(entry) = dir.next_entry().await.map_err(|e| StorageError::io(&self.root, e))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| StorageError::io(&path, e))?;
            if !file_type.is_file() {
                warn!(path = %path.display(), "skipping non-file entry in storage root");
                continue;
            }
            let key = match entry.file_name().into_string() {
                Ok(key) => key,
                Err(name) => {
                    warn!(name = ?name, "skipping entry with non UTF-8 name");
                    continue;
                }
            };
            let value = Self::read_value(&path).await?;
            records.insert(key, value);
        }
        Ok(records)
    }

    async fn get(&self, key: &str) -> StorageResult<String> {
        let path = self.path_for(key);
        let _guard = self.lock.read().await;
        if !Self::is_record(&path).await? {
            return Err(StorageError::not_found(key));
        }
        Self::read_value(&path).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key);
        let _guard = self.lock.write().await;
        if !Self::is_record(&path).await? {
            return Err(StorageError::not_found(key));
        }
        fs::remove_file(&path).await.map_err(|e| StorageError::io(&path, e))?;
        debug!(path = %path.display(), "record removed");
        Ok(())
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Disk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uuid::Uuid;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("disk_store_{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn disk_store_basic_crud() -> Result<(), anyhow::Error> {
        let root = temp_root();
        let store = DiskStore::open(&root).await?;

        // initially empty
        assert!(store.list().await?.is_empty());

        store.store("file", "system").await?;
        assert_eq!(tokio::fs::read_to_string(root.join("file")).await?, "system");
        assert_eq!(store.get("file").await?, "system");
        assert!(store.get("Golang").await.unwrap_err().is_not_found());

        store.store("data", "structure").await?;
        let list = store.list().await?;
        assert_eq!(list.len(), 2);
        assert_eq!(list["data"], "structure");

        store.delete("file").await?;
        assert!(!root.join("file").exists());
        assert!(store.get("file").await.unwrap_err().is_not_found());
        assert!(store.delete("file").await.unwrap_err().is_not_found());

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn overwrite_truncates_previous_value() -> Result<(), anyhow::Error> {
        let root = temp_root();
        let store = DiskStore::open(&root).await?;
        store.store("go", "a much longer value").await?;
        store.store("go", "lang").await?;
        assert_eq!(store.get("go").await?, "lang");
        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn records_survive_reopen() -> Result<(), anyhow::Error> {
        let root = temp_root().join("nested").join("storage");
        {
            let store = DiskStore::open(&root).await?;
            store.store("py", "con").await?;
        }
        let reopened = DiskStore::open(&root).await?;
        assert_eq!(reopened.get("py").await?, "con");
        if let Some(base) = root.parent().and_then(Path::parent) {
            let _ = tokio::fs::remove_dir_all(base).await;
        }
        Ok(())
    }

    #[tokio::test]
    async fn open_rejects_regular_file_root() -> Result<(), anyhow::Error> {
        let root = temp_root();
        tokio::fs::write(&root, b"not a dir").await?;
        let err = DiskStore::open(&root).await.unwrap_err();
        assert!(matches!(err, StorageError::NotADirectory(_)));
        let _ = tokio::fs::remove_file(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn subdirectories_are_not_records() -> Result<(), anyhow::Error> {
        let root = temp_root();
        let store = DiskStore::open(&root).await?;
        tokio::fs::create_dir(root.join("nested")).await?;
        store.store("go", "lang").await?;

        let list = store.list().await?;
        assert_eq!(list.len(), 1);
        assert!(store.get("nested").await.unwrap_err().is_not_found());
        assert!(store.delete("nested").await.unwrap_err().is_not_found());
        assert!(store.get("").await.unwrap_err().is_not_found());

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn non_utf8_content_is_reported() -> Result<(), anyhow::Error> {
        let root = temp_root();
        let store = DiskStore::open(&root).await?;
        tokio::fs::write(root.join("bin"), [0xff, 0xfe, 0x00]).await?;
        let err = store.get("bin").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidUtf8 { .. }));
        assert!(store.list().await.is_err());
        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn write_failure_is_reported() -> Result<(), anyhow::Error> {
        let root = temp_root();
        let store = DiskStore::open(&root).await?;
        tokio::fs::remove_dir_all(&root).await?;

        let err = store.store("go", "lang").await.unwrap_err();
        match err {
            StorageError::Io { path, .. } => assert_eq!(path, root.join("go")),
            other => panic!("expected Io, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn reserved_keys_are_rejected() -> Result<(), anyhow::Error> {
        let root = temp_root();
        let store = DiskStore::open(&root).await?;
        for key in ["", ".", ".."] {
            let err = store.store(key, "v").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "{key:?}: {err:?}");
            assert!(store.get(key).await.unwrap_err().is_not_found());
        }
        assert!(store.list().await?.is_empty());
        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_lose_nothing() -> Result<(), anyhow::Error> {
        let root = temp_root();
        let store = Arc::new(DiskStore::open(&root).await?);
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.store(&format!("k{i}"), &format!("v{i}")).await?;
                store.store("shared", &format!("v{i}")).await
            }));
        }
        for h in handles {
            h.await??;
        }
        let list = store.list().await?;
        assert_eq!(list.len(), 33);
        for i in 0..32 {
            assert_eq!(list[&format!("k{i}")], format!("v{i}"));
        }
        // last writer wins, and the value is never a torn mix of two writes
        let shared = &list["shared"];
        assert!((0..32).any(|i| *shared == format!("v{i}")));

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }
}
