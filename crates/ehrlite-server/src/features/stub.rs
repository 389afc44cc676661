//! Canned capability implementations.
//!
//! None of these perform real image processing, text generation or medical
//! coding. They exist so the endpoints have a working contract until a real
//! service is plugged in.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::icd10::{self, CatalogueEntry, FALLBACK, KEYWORD_CATALOGUE};
use super::{
    CodeSuggestion, Coder, Enhancement, Enhancer, FeatureError, Modality, NoteGenerator,
    NoteRequest, NoteType,
};

const NOT_AVAILABLE: &str = "N/A";

/// Returns the image unchanged, or a placeholder analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubEnhancer;

#[async_trait]
impl Enhancer for StubEnhancer {
    async fn enhance(
        &self,
        image: Vec<u8>,
        modality: Modality,
        analyze: bool,
    ) -> Result<Enhancement, FeatureError> {
        if analyze {
            return Ok(Enhancement::Analysis {
                content: format!(
                    "Placeholder analysis for {modality} image ({} bytes): no findings generated.",
                    image.len()
                ),
                message: "Analysis completed (stub)".into(),
            });
        }
        Ok(Enhancement::Image {
            bytes: image,
            message: format!("Enhancement completed (stub): {modality} image returned unchanged"),
        })
    }
}

/// Fills the SOAP, discharge and radiology templates from the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNoteGenerator;

#[async_trait]
impl NoteGenerator for TemplateNoteGenerator {
    async fn generate(&self, request: &NoteRequest) -> Result<String, FeatureError> {
        let note = match request.note_type {
            NoteType::Soap => {
                let f = &request.findings;
                format!(
                    "SOAP NOTE\n---------\nSubjective: {}\nObjective: {}\nAssessment: {}\nPlan: {}\n",
                    field(f, "subjective"),
                    field(f, "objective"),
                    field(f, "assessment"),
                    field(f, "plan"),
                )
            }
            NoteType::Discharge => {
                let a = &request.admission_data;
                format!(
                    "DISCHARGE SUMMARY\n-----------------\nPatient: {}\nDiagnosis: {}\nTreatment: {}\nInstructions: {}\n",
                    field(&request.patient_info, "name"),
                    field(a, "diagnosis"),
                    field(a, "treatment"),
                    field(a, "instructions"),
                )
            }
            NoteType::Radiology => format!(
                "RADIOLOGY REPORT\n----------------\nModality: {}\nFindings: {}\nImpression: Possible abnormality detected.\n",
                request.modality.as_deref().unwrap_or(NOT_AVAILABLE),
                request.image_findings.as_deref().unwrap_or(NOT_AVAILABLE),
            ),
        };
        Ok(note)
    }
}

fn field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Suggests codes by case-insensitive keyword matching.
#[derive(Debug, Clone)]
pub struct KeywordCoder {
    catalogue: &'static [CatalogueEntry],
}

impl Default for KeywordCoder {
    fn default() -> Self {
        Self {
            catalogue: KEYWORD_CATALOGUE,
        }
    }
}

impl KeywordCoder {
    const MATCH_CONFIDENCE: f64 = 0.85;
    const FALLBACK_CONFIDENCE: f64 = 0.3;

    fn suggestion(entry: &CatalogueEntry, confidence: f64, reasoning: String) -> CodeSuggestion {
        CodeSuggestion {
            code: entry.code.to_string(),
            description: entry.description.to_string(),
            confidence,
            valid: icd10::is_valid_code(entry.code),
            reasoning,
        }
    }
}

#[async_trait]
impl Coder for KeywordCoder {
    async fn suggest(
        &self,
        clinical_text: &str,
        top_k: usize,
    ) -> Result<Vec<CodeSuggestion>, FeatureError> {
        let text = clinical_text.to_lowercase();
        let mut suggestions: Vec<CodeSuggestion> = self
            .catalogue
            .iter()
            .filter(|entry| text.contains(entry.keyword))
            .map(|entry| {
                Self::suggestion(
                    entry,
                    Self::MATCH_CONFIDENCE,
                    format!("Keyword '{}' found in clinical text", entry.keyword),
                )
            })
            .collect();

        if suggestions.is_empty() {
            suggestions.push(Self::suggestion(
                &FALLBACK,
                Self::FALLBACK_CONFIDENCE,
                "No known keyword found in clinical text".to_string(),
            ));
        }
        suggestions.truncate(top_k);
        Ok(suggestions)
    }
}
