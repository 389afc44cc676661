use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ehrlite_storage::{
    PatientFields, PatientId, PatientRecord, PatientStorage, StorageError, StorageResult,
};
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::factory::StorageOptions;

/// In-memory patient storage.
///
/// This storage implementation provides:
/// - Insertion-ordered records keyed by identifier (`IndexMap`)
/// - A monotonic identifier counter that never hands out the same id twice
/// - Merges performed under the write lock, so concurrent updates to one
///   record are serialized (last writer wins per field)
#[derive(Debug)]
pub struct InMemoryStorage {
    data: RwLock<IndexMap<PatientId, PatientRecord>>,
    /// Next identifier to assign
    next_id: AtomicU64,
}

impl InMemoryStorage {
    /// Creates a new in-memory storage with default options.
    pub fn new() -> Self {
        Self::with_options(StorageOptions::default())
    }

    /// Creates a new in-memory storage with the given options.
    pub fn with_options(options: StorageOptions) -> Self {
        let data = match options.preallocate {
            Some(capacity) => IndexMap::with_capacity(capacity),
            None => IndexMap::new(),
        };
        Self {
            data: RwLock::new(data),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> PatientId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatientStorage for InMemoryStorage {
    async fn list(&self) -> StorageResult<Vec<PatientRecord>> {
        let guard = self.data.read().await;
        Ok(guard.values().cloned().collect())
    }

    async fn get(&self, id: PatientId) -> StorageResult<Option<PatientRecord>> {
        let guard = self.data.read().await;
        Ok(guard.get(&id).cloned())
    }

    async fn create(&self, fields: PatientFields) -> StorageResult<PatientRecord> {
        fields.validate()?;
        let mut guard = self.data.write().await;
        // Assigned under the write lock so insertion order follows id order.
        let record = PatientRecord::new(self.next_id(), fields);
        guard.insert(record.id, record.clone());
        tracing::debug!(id = record.id, "patient created");
        Ok(record)
    }

    async fn update(
        &self,
        id: PatientId,
        fields: PatientFields,
    ) -> StorageResult<PatientRecord> {
        fields.validate()?;
        if fields.is_empty() {
            return self.get(id).await?.ok_or_else(|| StorageError::not_found(id));
        }
        let mut guard = self.data.write().await;
        let record = guard
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found(id))?;
        record.fields.merge(fields);
        tracing::debug!(id, "patient updated");
        Ok(record.clone())
    }

    async fn count(&self) -> StorageResult<usize> {
        Ok(self.data.read().await.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
