use async_trait::async_trait;

use super::{
    CodeSuggestion, Coder, Enhancement, Enhancer, FeatureError, Modality, NoteGenerator,
    NoteRequest,
};

/// Implements every capability as "not implemented" (HTTP 501).
#[derive(Debug, Clone, Copy, Default)]
pub struct Disabled;

#[async_trait]
impl Enhancer for Disabled {
    fn is_available(&self) -> bool {
        false
    }

    async fn enhance(
        &self,
        _image: Vec<u8>,
        _modality: Modality,
        _analyze: bool,
    ) -> Result<Enhancement, FeatureError> {
        Err(FeatureError::NotImplemented("Image enhancement"))
    }
}

#[async_trait]
impl NoteGenerator for Disabled {
    fn is_available(&self) -> bool {
        false
    }

    async fn generate(&self, _request: &NoteRequest) -> Result<String, FeatureError> {
        Err(FeatureError::NotImplemented("Clinical note generation"))
    }
}

#[async_trait]
impl Coder for Disabled {
    fn is_available(&self) -> bool {
        false
    }

    async fn suggest(
        &self,
        _clinical_text: &str,
        _top_k: usize,
    ) -> Result<Vec<CodeSuggestion>, FeatureError> {
        Err(FeatureError::NotImplemented("ICD-10 coding"))
    }
}
