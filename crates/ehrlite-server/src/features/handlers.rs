//! HTTP handlers for the feature endpoints. They translate wire payloads into
//! capability calls and never inspect which implementation is plugged in.

use axum::extract::State;
use axum::Json;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ehrlite_api::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::visit::{self, Visit, VisitDocumentation};
use super::{CodeSuggestion, DEFAULT_TOP_K, Enhancement, Modality, NoteRequest, NoteType};
use crate::extract::ApiJson;
use crate::handlers::timestamp_now;
use crate::server::AppState;

// ---- image enhancement ----

#[derive(Debug, Default, Deserialize)]
pub struct EnhanceImageBody {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub modality: Option<String>,
    /// Ask the remote model for an analysis instead of an enhanced image
    #[serde(default)]
    pub use_bedrock: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct EnhanceImageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub message: String,
}

/// Accepts bare base64 or a `data:<mime>;base64,` URL.
fn decode_image(raw: &str) -> Result<Vec<u8>, ApiError> {
    let payload = match raw.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => raw,
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(ApiError::bad_request("image_base64 is required"));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| ApiError::bad_request(format!("image_base64 is not valid base64: {e}")))
}

pub async fn enhance_image(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<EnhanceImageBody>,
) -> Result<Json<EnhanceImageResponse>, ApiError> {
    let raw = body
        .image_base64
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("image_base64 is required"))?;
    let image = decode_image(raw)?;
    let modality = match body.modality.as_deref() {
        Some(m) if !m.trim().is_empty() => m.parse::<Modality>()?,
        _ => Modality::default(),
    };

    tracing::debug!(%modality, bytes = image.len(), analyze = body.use_bedrock, "image enhancement requested");

    let response = match state
        .features
        .enhancer
        .enhance(image, modality, body.use_bedrock)
        .await?
    {
        Enhancement::Image { bytes, message } => EnhanceImageResponse {
            success: true,
            enhanced_image: Some(STANDARD.encode(bytes)),
            content: None,
            message,
        },
        Enhancement::Analysis { content, message } => EnhanceImageResponse {
            success: true,
            enhanced_image: None,
            content: Some(content),
            message,
        },
    };
    Ok(Json(response))
}

// ---- clinical notes ----

#[derive(Debug, Default, Deserialize)]
pub struct ClinicalNoteBody {
    #[serde(default)]
    pub note_type: Option<String>,
    #[serde(default)]
    pub patient_info: Option<Map<String, Value>>,
    #[serde(default)]
    pub findings: Option<Map<String, Value>>,
    #[serde(default)]
    pub admission_data: Option<Map<String, Value>>,
    #[serde(default)]
    pub image_findings: Option<String>,
    #[serde(default)]
    pub modality: Option<String>,
}

impl TryFrom<ClinicalNoteBody> for NoteRequest {
    type Error = ApiError;

    fn try_from(body: ClinicalNoteBody) -> Result<Self, Self::Error> {
        let note_type = body
            .note_type
            .as_deref()
            .unwrap_or_default()
            .parse::<NoteType>()?;
        Ok(NoteRequest {
            note_type,
            patient_info: body.patient_info.unwrap_or_default(),
            findings: body.findings.unwrap_or_default(),
            admission_data: body.admission_data.unwrap_or_default(),
            image_findings: body.image_findings,
            modality: body.modality,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ClinicalNoteResponse {
    pub success: bool,
    pub content: String,
}

pub async fn clinical_notes(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ClinicalNoteBody>,
) -> Result<Json<ClinicalNoteResponse>, ApiError> {
    let request = NoteRequest::try_from(body)?;
    tracing::debug!(note_type = ?request.note_type, "clinical note requested");
    let content = state.features.notes.generate(&request).await?;
    Ok(Json(ClinicalNoteResponse {
        success: true,
        content,
    }))
}

// ---- ICD-10 coding ----

#[derive(Debug, Default, Deserialize)]
pub struct Icd10Body {
    #[serde(default)]
    pub clinical_text: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Icd10Response {
    pub success: bool,
    pub suggested_codes: Vec<CodeSuggestion>,
    pub total_suggestions: usize,
}

pub async fn icd10_coding(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Icd10Body>,
) -> Result<Json<Icd10Response>, ApiError> {
    let text = body.clinical_text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ApiError::bad_request("clinical_text is required"));
    }
    let top_k = body.top_k.unwrap_or(DEFAULT_TOP_K);
    if top_k == 0 {
        return Err(ApiError::bad_request("top_k must be at least 1"));
    }

    let suggested_codes = state.features.coder.suggest(&text, top_k).await?;
    tracing::debug!(top_k, found = suggested_codes.len(), "ICD-10 codes suggested");
    Ok(Json(Icd10Response {
        success: true,
        total_suggestions: suggested_codes.len(),
        suggested_codes,
    }))
}

// ---- visit documentation ----

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct VisitDocumentationResponse {
    pub success: bool,
    pub documentation: VisitDocumentation,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BatchProcessResponse {
    pub success: bool,
    pub processed_count: usize,
    pub results: Vec<VisitDocumentation>,
    pub timestamp: String,
}

pub async fn visit_documentation(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Visit>,
) -> Result<Json<VisitDocumentationResponse>, ApiError> {
    let documentation = visit::document_visit(&state.features, body).await?;
    Ok(Json(VisitDocumentationResponse {
        success: true,
        documentation,
    }))
}

/// Body is a bare JSON array of visits.
pub async fn batch_process(
    State(state): State<AppState>,
    ApiJson(visits): ApiJson<Vec<Visit>>,
) -> Result<Json<BatchProcessResponse>, ApiError> {
    let requested = visits.len();
    let results = visit::document_visits(&state.features, visits).await?;
    tracing::info!(visits = requested, "visit batch processed");
    Ok(Json(BatchProcessResponse {
        success: true,
        processed_count: results.len(),
        results,
        timestamp: timestamp_now(),
    }))
}
