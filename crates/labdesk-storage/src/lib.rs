//! # labdesk-storage
//!
//! Storage abstraction layer for the LabDesk server.
//!
//! This crate defines the trait and filter types every storage backend
//! implements. Backends live in separate crates (`labdesk-db-postgres`,
//! `labdesk-db-memory`).
//!
//! ## Example
//!
//! ```ignore
//! use labdesk_core::OrderStatus;
//! use labdesk_storage::{LabStorage, OrderFilter, StorageError};
//!
//! async fn drafts(storage: &dyn LabStorage) -> Result<usize, StorageError> {
//!     let filter = OrderFilter::default().with_status(OrderStatus::Draft);
//!     Ok(storage.list_orders(&filter).await?.len())
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::LabStorage;
pub use types::{LabTestFilter, OrderFilter};

// Patient listing filters on the parsed search query directly.
pub use labdesk_core::PatientQuery as PatientFilter;

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared storage trait object.
pub type DynLabStorage = std::sync::Arc<dyn LabStorage>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        DynLabStorage, ErrorCategory, LabStorage, LabTestFilter, OrderFilter, PatientFilter,
        StorageError, StorageResult,
    };
}
