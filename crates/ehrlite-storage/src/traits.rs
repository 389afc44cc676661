//! Storage trait for the patient storage abstraction layer.

use async_trait::async_trait;

use crate::StorageResult;
use crate::types::{PatientFields, PatientId, PatientRecord};

/// The trait that all patient storage backends must implement.
///
/// The backend is the sole owner of the collection and of identifier
/// assignment. Implementations must be thread-safe (`Send + Sync`). There is
/// no delete operation: records live for the lifetime of the backend.
///
/// # Example
///
/// ```ignore
/// use ehrlite_storage::{PatientRecord, PatientStorage, StorageError, StorageResult};
///
/// async fn require(storage: &dyn PatientStorage, id: u64) -> StorageResult<PatientRecord> {
///     storage.get(id).await?.ok_or(StorageError::not_found(id))
/// }
/// ```
#[async_trait]
pub trait PatientStorage: Send + Sync {
    /// Returns every record in insertion order.
    async fn list(&self) -> StorageResult<Vec<PatientRecord>>;

    /// Reads a record by identifier.
    ///
    /// Returns `None` if no record carries `id`; an identifier of `0` can never
    /// match.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing records.
    async fn get(&self, id: PatientId) -> StorageResult<Option<PatientRecord>>;

    /// Creates a new record from `fields`, assigning the next identifier.
    ///
    /// Identifiers are strictly increasing and never reused.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRecord` if `fields` fails validation.
    async fn create(&self, fields: PatientFields) -> StorageResult<PatientRecord>;

    /// Shallow-merges `fields` over the record identified by `id`.
    ///
    /// Fields absent from `fields` keep their previous value; the identifier is
    /// never changed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist, in which
    /// case the store is left untouched.
    /// Returns `StorageError::InvalidRecord` if `fields` fails validation.
    async fn update(
        &self,
        id: PatientId,
        fields: PatientFields,
    ) -> StorageResult<PatientRecord>;

    /// Returns the number of stored records.
    async fn count(&self) -> StorageResult<usize>;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
