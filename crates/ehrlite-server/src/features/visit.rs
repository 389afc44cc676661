//! Visit documentation: one structured visit in, a SOAP progress note plus
//! ICD-10 suggestions out. Built purely on the [`NoteGenerator`] and
//! [`Coder`] seams, so it follows whichever backend is configured.
//!
//! [`NoteGenerator`]: super::NoteGenerator
//! [`Coder`]: super::Coder

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CodeSuggestion, DEFAULT_TOP_K, FeatureError, FeatureServices, NoteRequest, NoteType};
use crate::handlers::timestamp_now;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VisitPatient {
    pub patient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<String>,
}

/// Chart observations. Vitals are free text (`"120/80"`, `"98.6F"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VisitObservations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_exam: Option<String>,
}

impl VisitObservations {
    /// Recorded vitals and exam joined in chart order, or `None` when nothing
    /// objective was recorded.
    fn objective(&self) -> Option<String> {
        let parts: Vec<String> = [
            ("Blood pressure", &self.blood_pressure),
            ("Heart rate", &self.heart_rate),
            ("Temperature", &self.temperature),
            ("Respiratory rate", &self.respiratory_rate),
            ("Physical exam", &self.physical_exam),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            non_blank(value.as_deref()).map(|v| format!("{label}: {v}"))
        })
        .collect();
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Visit {
    pub patient_info: VisitPatient,
    #[serde(default)]
    pub observations: VisitObservations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,
    #[serde(default)]
    pub diagnosis: String,
}

impl Visit {
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.patient_info.patient_id.trim().is_empty() {
            return Err(FeatureError::InvalidInput(
                "patient_info.patient_id is required".into(),
            ));
        }
        if self.diagnosis.trim().is_empty() {
            return Err(FeatureError::InvalidInput("diagnosis is required".into()));
        }
        Ok(())
    }

    /// The SOAP request for this visit. Without an explicit assessment the
    /// diagnosis stands in for it.
    fn note_request(&self) -> NoteRequest {
        let patient = &self.patient_info;
        let mut patient_info = Map::new();
        patient_info.insert("patient_id".into(), Value::from(patient.patient_id.as_str()));
        if let Some(age) = patient.age {
            patient_info.insert("age".into(), Value::from(age));
        }
        insert_text(&mut patient_info, "gender", patient.gender.as_deref());
        insert_text(&mut patient_info, "visit_date", patient.visit_date.as_deref());

        let mut findings = Map::new();
        insert_text(&mut findings, "subjective", self.observations.subjective.as_deref());
        insert_text(&mut findings, "objective", self.observations.objective().as_deref());
        let assessment = non_blank(self.assessment.as_deref()).unwrap_or(self.diagnosis.trim());
        insert_text(&mut findings, "assessment", Some(assessment));

        NoteRequest {
            note_type: NoteType::Soap,
            patient_info,
            findings,
            admission_data: Map::new(),
            image_findings: None,
            modality: None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn insert_text(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = non_blank(value) {
        map.insert(key.to_string(), Value::from(v));
    }
}

/// The documentation produced for one visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitDocumentation {
    pub patient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<String>,
    pub progress_note: String,
    pub diagnosis: String,
    pub icd10_codes: Vec<CodeSuggestion>,
    pub timestamp: String,
}

/// Writes the progress note, then codes the diagnosis with the note as
/// context.
pub async fn document_visit(
    features: &FeatureServices,
    visit: Visit,
) -> Result<VisitDocumentation, FeatureError> {
    visit.validate()?;
    let progress_note = features.notes.generate(&visit.note_request()).await?;
    let coding_text = format!("{}\n{}", visit.diagnosis.trim(), progress_note);
    let icd10_codes = features.coder.suggest(&coding_text, DEFAULT_TOP_K).await?;
    tracing::debug!(
        patient_id = %visit.patient_info.patient_id,
        codes = icd10_codes.len(),
        "visit documented"
    );
    Ok(VisitDocumentation {
        patient_id: visit.patient_info.patient_id,
        visit_date: visit.patient_info.visit_date,
        progress_note,
        diagnosis: visit.diagnosis,
        icd10_codes,
        timestamp: timestamp_now(),
    })
}

/// Documents `visits` in order.
///
/// Every visit is validated before the first one is processed, so invalid
/// input never yields partial work. Input errors name the offending index.
pub async fn document_visits(
    features: &FeatureServices,
    visits: Vec<Visit>,
) -> Result<Vec<VisitDocumentation>, FeatureError> {
    for (index, visit) in visits.iter().enumerate() {
        visit.validate().map_err(|e| at_index(index, e))?;
    }
    let mut results = Vec::with_capacity(visits.len());
    for (index, visit) in visits.into_iter().enumerate() {
        let documentation = document_visit(features, visit)
            .await
            .map_err(|e| at_index(index, e))?;
        results.push(documentation);
    }
    Ok(results)
}

fn at_index(index: usize, err: FeatureError) -> FeatureError {
    match err {
        FeatureError::InvalidInput(msg) => FeatureError::InvalidInput(format!("visits[{index}]: {msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureBackend;
    use serde_json::json;

    fn visit(patient_id: &str, diagnosis: &str) -> Visit {
        serde_json::from_value(json!({
            "patient_info": {"patient_id": patient_id, "age": 54, "visit_date": "2026-03-02"},
            "observations": {
                "subjective": "Headache for two days",
                "blood_pressure": "150/95",
                "heart_rate": "80"
            },
            "diagnosis": diagnosis
        }))
        .unwrap()
    }

    fn codes(doc: &VisitDocumentation) -> Vec<&str> {
        doc.icd10_codes.iter().map(|c| c.code.as_str()).collect()
    }

    #[test]
    fn objective_joins_recorded_vitals_in_chart_order() {
        let obs = VisitObservations {
            temperature: Some("38.2C".into()),
            blood_pressure: Some("120/80".into()),
            physical_exam: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(
            obs.objective().as_deref(),
            Some("Blood pressure: 120/80; Temperature: 38.2C")
        );
        assert_eq!(VisitObservations::default().objective(), None);
    }

    #[test]
    fn unknown_visit_fields_are_rejected() {
        let err = serde_json::from_value::<Visit>(json!({
            "patient_info": {"patient_id": "P1"},
            "diagnosis": "Flu",
            "urgency": "high"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("urgency"));
    }

    #[tokio::test]
    async fn visit_yields_soap_note_and_codes() {
        let features = FeatureServices::from_backend(FeatureBackend::Stub);
        let doc = document_visit(&features, visit("P-100", "Essential hypertension"))
            .await
            .unwrap();

        assert_eq!(doc.patient_id, "P-100");
        assert_eq!(doc.visit_date.as_deref(), Some("2026-03-02"));
        assert!(doc.progress_note.starts_with("SOAP NOTE"));
        assert!(doc.progress_note.contains("Subjective: Headache for two days"));
        assert!(doc.progress_note.contains("Objective: Blood pressure: 150/95; Heart rate: 80"));
        assert!(doc.progress_note.contains("Assessment: Essential hypertension"));
        assert_eq!(codes(&doc), ["R51", "I10"]);
        assert!(doc.icd10_codes.iter().all(|c| c.valid));
        assert!(!doc.timestamp.is_empty());
    }

    #[tokio::test]
    async fn explicit_assessment_wins_over_diagnosis() {
        let features = FeatureServices::from_backend(FeatureBackend::Stub);
        let mut v = visit("P-1", "Cough");
        v.assessment = Some("Viral bronchitis".into());
        let doc = document_visit(&features, v).await.unwrap();
        assert!(doc.progress_note.contains("Assessment: Viral bronchitis"));
        assert_eq!(doc.diagnosis, "Cough");
    }

    #[tokio::test]
    async fn missing_identifiers_are_invalid_input() {
        let features = FeatureServices::from_backend(FeatureBackend::Stub);
        let err = document_visit(&features, visit(" ", "Flu")).await.unwrap_err();
        assert_eq!(err.to_string(), "patient_info.patient_id is required");
        let err = document_visit(&features, visit("P1", "")).await.unwrap_err();
        assert_eq!(err.to_string(), "diagnosis is required");
    }

    #[tokio::test]
    async fn batch_keeps_order_and_names_bad_index() {
        let features = FeatureServices::from_backend(FeatureBackend::Stub);
        let docs = document_visits(
            &features,
            vec![visit("A", "Fever"), visit("B", "Type 2 diabetes")],
        )
        .await
        .unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.patient_id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(codes(&docs[1]), ["R51", "E11.9"]);

        let err = document_visits(&features, vec![visit("A", "Fever"), visit("B", " ")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "visits[1]: diagnosis is required");

        assert!(document_visits(&features, Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_backend_is_not_implemented() {
        let features = FeatureServices::from_backend(FeatureBackend::Disabled);
        let err = document_visits(&features, vec![visit("A", "Fever")])
            .await
            .unwrap_err();
        assert!(matches!(err, FeatureError::NotImplemented(_)));
    }
}
