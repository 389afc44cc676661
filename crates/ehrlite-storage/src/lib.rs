//! # ehrlite-storage
//!
//! Storage abstraction layer for the ehrlite server.
//!
//! This crate defines the trait and types every patient storage backend
//! implements. It does not contain any implementations; those live in
//! separate crates (see `ehrlite-db-memory`).
//!
//! ## Example
//!
//! ```ignore
//! use ehrlite_storage::{PatientFields, PatientStorage, StorageError};
//!
//! async fn rename(
//!     storage: &dyn PatientStorage,
//!     id: u64,
//!     name: &str,
//! ) -> Result<(), StorageError> {
//!     let fields = PatientFields {
//!         name: Some(name.to_string()),
//!         ..Default::default()
//!     };
//!     storage.update(id, fields).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::PatientStorage;
pub use types::{MAX_AGE, PatientFields, PatientId, PatientRecord, PatientStatus};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shareable storage trait object.
pub type DynPatientStorage = std::sync::Arc<dyn PatientStorage>;
