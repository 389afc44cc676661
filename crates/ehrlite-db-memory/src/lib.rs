//! In-memory patient storage backend for the ehrlite server.
//!
//! This crate provides an in-memory implementation of the `PatientStorage`
//! trait from `ehrlite-storage`. Records live for the lifetime of the process.
//!
//! # Example
//!
//! ```ignore
//! use ehrlite_db_memory::InMemoryStorage;
//! use ehrlite_storage::{PatientFields, PatientStorage};
//!
//! let storage = InMemoryStorage::new();
//! let created = storage
//!     .create(PatientFields { name: Some("Jane".into()), ..Default::default() })
//!     .await?;
//! assert_eq!(created.id, 1);
//! ```

pub mod factory;
pub mod storage;

// Re-export the storage trait for convenience
pub use ehrlite_storage::{DynPatientStorage, PatientStorage, StorageError};

pub use factory::{StorageBackend, StorageConfig, StorageOptions, create_storage};
pub use storage::InMemoryStorage;
