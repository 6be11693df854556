//! In-memory storage backend for LabDesk.
//!
//! Implements [`LabStorage`] over plain maps guarded by a single
//! `tokio::sync::RwLock`, so every mutation (including order + items) is
//! applied atomically. Used by the HTTP tests and by
//! `storage.backend = "memory"`.
//!
//! # Example
//!
//! ```ignore
//! use labdesk_db_memory::InMemoryStorage;
//! use labdesk_storage::LabStorage;
//!
//! let storage = InMemoryStorage::new();
//! let tests = storage.list_lab_tests(&Default::default()).await?;
//! ```

mod lab_impl;
pub mod storage;

pub use labdesk_storage::{LabStorage, StorageError};
pub use storage::InMemoryStorage;

/// Creates a new, empty in-memory storage behind the shared trait object.
pub fn create_storage() -> labdesk_storage::DynLabStorage {
    std::sync::Arc::new(InMemoryStorage::new())
}
