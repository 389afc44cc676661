use std::sync::Arc;

use ehrlite_storage::DynPatientStorage;
use serde::{Deserialize, Serialize};

use crate::InMemoryStorage;

/// Supported storage backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-memory storage; contents are lost on restart.
    #[default]
    Memory,
}

/// Storage-specific configuration options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageOptions {
    /// Initial capacity hint for the record map.
    #[serde(default)]
    pub preallocate: Option<usize>,
}

/// Factory configuration to construct a storage instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default, flatten)]
    pub options: StorageOptions,
}

/// Creates a storage backend from configuration.
pub fn create_storage(config: &StorageConfig) -> DynPatientStorage {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!(
                backend = "memory",
                preallocate = ?config.options.preallocate,
                "Patient storage initialized"
            );
            Arc::new(InMemoryStorage::with_options(config.options.clone()))
        }
    }
}
