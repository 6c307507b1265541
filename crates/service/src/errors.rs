use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("key not found: {0}")]
    NotFound(String),
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("value stored at {} is not valid UTF-8", .path.display())]
    InvalidUtf8 { path: PathBuf },
    #[error("storage root {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub fn not_found(key: &str) -> Self { Self::NotFound(key.to_string()) }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Whether this is the recoverable "key absent" condition.
    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }
}
