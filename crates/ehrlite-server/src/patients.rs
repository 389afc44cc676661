//! Patient record routes.

use axum::Json;
use axum::extract::State;
use ehrlite_api::ApiError;
use ehrlite_storage::{ErrorCategory, PatientFields, PatientId, PatientRecord, StorageError};
use serde::{Deserialize, Serialize};

use crate::extract::{ApiJson, ApiPath};
use crate::server::AppState;

/// Body of a successful create or update: `{"message": ..., "patient": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientMessage {
    pub message: String,
    pub patient: PatientRecord,
}

impl PatientMessage {
    fn new(message: &str, patient: PatientRecord) -> Self {
        Self {
            message: message.to_string(),
            patient,
        }
    }
}

/// Parses a path segment into a positive patient id.
pub fn parse_patient_id(raw: &str) -> Result<PatientId, ApiError> {
    match raw.parse::<PatientId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request("Invalid patient id")),
    }
}

/// Converts a storage failure into its HTTP error and logs it under its
/// category.
fn storage_error(err: StorageError) -> ApiError {
    let category = err.category();
    match category {
        ErrorCategory::Internal => {
            tracing::error!(error.category = %category, error = %err, "patient storage failed")
        }
        _ => tracing::debug!(error.category = %category, error = %err, "patient storage rejected request"),
    }
    err.into()
}

pub async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientRecord>>, ApiError> {
    let patients = state.storage.list().await.map_err(storage_error)?;
    Ok(Json(patients))
}

pub async fn get_patient(
    State(state): State<AppState>,
    ApiPath(raw_id): ApiPath<String>,
) -> Result<Json<PatientRecord>, ApiError> {
    let id = parse_patient_id(&raw_id)?;
    state
        .storage
        .get(id)
        .await
        .map_err(storage_error)?
        .map(Json)
        .ok_or_else(ApiError::patient_not_found)
}

pub async fn create_patient(
    State(state): State<AppState>,
    ApiJson(fields): ApiJson<PatientFields>,
) -> Result<Json<PatientMessage>, ApiError> {
    let patient = state.storage.create(fields).await.map_err(storage_error)?;
    tracing::info!(patient.id = patient.id, "patient added");
    Ok(Json(PatientMessage::new("Patient added", patient)))
}

pub async fn update_patient(
    State(state): State<AppState>,
    ApiPath(raw_id): ApiPath<String>,
    ApiJson(fields): ApiJson<PatientFields>,
) -> Result<Json<PatientMessage>, ApiError> {
    let id = parse_patient_id(&raw_id)?;
    let patient = state
        .storage
        .update(id, fields)
        .await
        .map_err(storage_error)?;
    tracing::info!(patient.id = patient.id, "patient updated");
    Ok(Json(PatientMessage::new("Patient updated", patient)))
}
