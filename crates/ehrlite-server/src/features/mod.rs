//! Capability interfaces behind the image-enhancement, clinical-note and
//! ICD-10 coding endpoints.
//!
//! The HTTP layer only talks to the [`Enhancer`], [`NoteGenerator`] and
//! [`Coder`] traits. [`FeatureServices::from_backend`] picks the concrete
//! implementations: the canned [`stub`] responders or the [`disabled`] ones
//! that answer 501. [`visit`] combines notes and coding per patient visit.

pub mod disabled;
pub mod handlers;
pub mod icd10;
pub mod stub;
pub mod visit;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use ehrlite_api::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::FeatureBackend;

/// Errors raised by a capability implementation.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    #[error("{0}")]
    Failed(String),
}

impl From<FeatureError> for ApiError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::InvalidInput(msg) => ApiError::bad_request(msg),
            e @ FeatureError::NotImplemented(_) => ApiError::not_implemented(e.to_string()),
            FeatureError::Failed(msg) => ApiError::internal(msg),
        }
    }
}

// ---- image enhancement ----

/// Imaging modality of an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modality {
    #[default]
    Xray,
    Ct,
    Mri,
    Ultrasound,
    Dxa,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xray => "xray",
            Self::Ct => "ct",
            Self::Mri => "mri",
            Self::Ultrasound => "ultrasound",
            Self::Dxa => "dxa",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "xray" => Ok(Self::Xray),
            "ct" => Ok(Self::Ct),
            "mri" => Ok(Self::Mri),
            "ultrasound" => Ok(Self::Ultrasound),
            "dxa" => Ok(Self::Dxa),
            _ => Err(FeatureError::InvalidInput(format!(
                "Unsupported modality: {s}"
            ))),
        }
    }
}

/// What an enhancer produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Enhancement {
    /// The enhanced image bytes.
    Image { bytes: Vec<u8>, message: String },
    /// A textual analysis instead of an image.
    Analysis { content: String, message: String },
}

#[async_trait]
pub trait Enhancer: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// `analyze` asks for a textual analysis rather than an image.
    async fn enhance(
        &self,
        image: Vec<u8>,
        modality: Modality,
        analyze: bool,
    ) -> Result<Enhancement, FeatureError>;
}

// ---- clinical notes ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteType {
    Soap,
    Discharge,
    Radiology,
}

impl FromStr for NoteType {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "soap" => Ok(Self::Soap),
            "discharge" => Ok(Self::Discharge),
            "radiology" => Ok(Self::Radiology),
            _ => Err(FeatureError::InvalidInput("Invalid note type".into())),
        }
    }
}

/// A validated note request.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteRequest {
    pub note_type: NoteType,
    pub patient_info: Map<String, Value>,
    pub findings: Map<String, Value>,
    pub admission_data: Map<String, Value>,
    pub image_findings: Option<String>,
    pub modality: Option<String>,
}

#[async_trait]
pub trait NoteGenerator: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, request: &NoteRequest) -> Result<String, FeatureError>;
}

// ---- ICD-10 coding ----

/// Suggestions returned when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSuggestion {
    pub code: String,
    pub description: String,
    pub confidence: f64,
    pub valid: bool,
    pub reasoning: String,
}

#[async_trait]
pub trait Coder: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// Returns at most `top_k` suggestions, best first.
    async fn suggest(
        &self,
        clinical_text: &str,
        top_k: usize,
    ) -> Result<Vec<CodeSuggestion>, FeatureError>;
}

/// The capability bundle held in application state.
#[derive(Clone)]
pub struct FeatureServices {
    pub enhancer: Arc<dyn Enhancer>,
    pub notes: Arc<dyn NoteGenerator>,
    pub coder: Arc<dyn Coder>,
}

impl FeatureServices {
    pub fn from_backend(backend: FeatureBackend) -> Self {
        match backend {
            FeatureBackend::Stub => Self {
                enhancer: Arc::new(stub::StubEnhancer),
                notes: Arc::new(stub::TemplateNoteGenerator),
                coder: Arc::new(stub::KeywordCoder::default()),
            },
            FeatureBackend::Disabled => Self {
                enhancer: Arc::new(disabled::Disabled),
                notes: Arc::new(disabled::Disabled),
                coder: Arc::new(disabled::Disabled),
            },
        }
    }
}

impl fmt::Debug for FeatureServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureServices")
            .field("image_enhancement", &self.enhancer.is_available())
            .field("clinical_notes", &self.notes.is_available())
            .field("icd10_coding", &self.coder.is_available())
            .finish()
    }
}
