//! Record storage layer.
//! - `storage::Storage` is the capability contract every backend satisfies.
//! - `storage::MemoryStore` and `storage::DiskStore` are the two backends.
//! - `errors::StorageError` separates the recoverable `NotFound` from I/O failures.

pub mod errors;
pub mod storage;

pub use errors::{StorageError, StorageResult};
pub use storage::{open_storage, DiskStore, MemoryStore, Storage};
