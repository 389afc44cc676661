use std::sync::Arc;

use ehrlite_storage::{PatientFields, PatientId, PatientRecord};
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::{TokenStore, TokenStoreError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered 401. The stored token has been cleared.
    #[error("Login required")]
    LoginRequired,
    /// Any other non-2xx answer. `message` is the body's `error` field when
    /// present, the raw body otherwise.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Failed to connect to server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to parse response JSON: {0}")]
    Decode(#[source] serde_json::Error),
    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),
}

/// `{"message": ..., "patient": {...}}` returned by create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientMessage {
    pub message: String,
    pub patient: PatientRecord,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnhanceImageRequest {
    pub image_base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modality: Option<String>,
    pub use_bedrock: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClinicalNoteRequest {
    pub note_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_info: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admission_data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_findings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modality: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Icd10Request {
    pub clinical_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

/// HTTP client for the ehrlite API.
///
/// Every request carries `Authorization: Bearer <token>` when the token
/// store holds one.
pub struct EhrClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl EhrClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(ACCEPT, "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, mut req: RequestBuilder) -> Result<T, ClientError> {
        if let Some(token) = self.tokens.load()? {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.clear()?;
            return Err(ClientError::LoginRequired);
        }
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        serde_json::from_str(&body).map_err(ClientError::Decode)
    }

    pub async fn root(&self) -> Result<Value, ClientError> {
        self.send(self.request(Method::GET, "/")).await
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        self.send(self.request(Method::GET, "/health")).await
    }

    pub async fn list_patients(&self) -> Result<Vec<PatientRecord>, ClientError> {
        self.send(self.request(Method::GET, "/patients")).await
    }

    pub async fn get_patient(&self, id: PatientId) -> Result<PatientRecord, ClientError> {
        self.send(self.request(Method::GET, &format!("/patients/{id}")))
            .await
    }

    pub async fn create_patient(
        &self,
        fields: &PatientFields,
    ) -> Result<PatientMessage, ClientError> {
        self.send(self.request(Method::POST, "/patients").json(fields))
            .await
    }

    pub async fn update_patient(
        &self,
        id: PatientId,
        fields: &PatientFields,
    ) -> Result<PatientMessage, ClientError> {
        self.send(
            self.request(Method::PUT, &format!("/patients/{id}"))
                .json(fields),
        )
        .await
    }

    pub async fn enhance_image(&self, body: &EnhanceImageRequest) -> Result<Value, ClientError> {
        self.send(self.request(Method::POST, "/image-enhancement").json(body))
            .await
    }

    pub async fn clinical_note(&self, body: &ClinicalNoteRequest) -> Result<Value, ClientError> {
        self.send(self.request(Method::POST, "/clinical-notes").json(body))
            .await
    }

    pub async fn icd10_codes(&self, body: &Icd10Request) -> Result<Value, ClientError> {
        self.send(self.request(Method::POST, "/icd10-coding").json(body))
            .await
    }

    /// Progress note plus ICD-10 codes for one visit.
    pub async fn document_visit(&self, visit: &Value) -> Result<Value, ClientError> {
        self.send(self.request(Method::POST, "/visit-documentation").json(visit))
            .await
    }

    pub async fn batch_process(&self, visits: &[Value]) -> Result<Value, ClientError> {
        self.send(self.request(Method::POST, "/batch-process").json(visits))
            .await
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
