use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use ehrlite_api::ApiResponse;
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    ApiResponse::ok(json!({ "message": "Backend running successfully!" }))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

/// Current UTC time as RFC 3339.
pub fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Component-level health: which feature capabilities are backed by a
/// working implementation, plus the storage backend in use.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = timestamp_now();
    let patients = state.storage.count().await.ok();
    let body = json!({
        "status": "healthy",
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "image_enhancement": state.features.enhancer.is_available(),
            "clinical_notes": state.features.notes.is_available(),
            "icd10_coding": state.features.coder.is_available(),
        },
        "storage": {
            "backend": state.storage.backend_name(),
            "patients": patients,
        },
    });
    ApiResponse::ok(body)
}

pub async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
