use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ehrlite_cli::EhrClient;
use ehrlite_cli::client::{ClinicalNoteRequest, EnhanceImageRequest, Icd10Request};
use serde::Deserialize;
use serde_json::{Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;

use super::read_json;
use crate::cli::{EnhanceArgs, OutputFormat};
use crate::output::{print_success, print_value};

/// Optional note inputs read from `--file`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoteInputs {
    #[serde(default)]
    patient_info: Option<Map<String, Value>>,
    #[serde(default)]
    findings: Option<Map<String, Value>>,
    #[serde(default)]
    admission_data: Option<Map<String, Value>>,
    #[serde(default)]
    image_findings: Option<String>,
    #[serde(default)]
    modality: Option<String>,
}

pub async fn notes(
    client: &EhrClient,
    note_type: &str,
    file: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let inputs: NoteInputs = match file {
        Some(path) => read_json(Some(path))?,
        None => NoteInputs::default(),
    };
    let request = ClinicalNoteRequest {
        note_type: note_type.to_string(),
        patient_info: inputs.patient_info,
        findings: inputs.findings,
        admission_data: inputs.admission_data,
        image_findings: inputs.image_findings,
        modality: inputs.modality,
    };
    let resp = client.clinical_note(&request).await?;
    match (format, resp.get("content").and_then(|v| v.as_str())) {
        (OutputFormat::Table, Some(content)) => println!("{content}"),
        _ => print_value(&resp, format)?,
    }
    Ok(())
}

pub async fn icd10(
    client: &EhrClient,
    text: &str,
    top_k: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let request = Icd10Request {
        clinical_text: text.to_string(),
        top_k,
    };
    let resp = client.icd10_codes(&request).await?;
    if format == OutputFormat::Json {
        return print_value(&resp, format);
    }

    let codes = resp
        .get("suggested_codes")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    println!("{}", codes_table(&codes));
    println!("Total: {}", codes.len());
    Ok(())
}

fn codes_table(codes: &[Value]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Code", "Description", "Confidence", "Valid"]);
    for code in codes {
        let cell = |key: &str| {
            code.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string()
        };
        let confidence = code
            .get("confidence")
            .and_then(|v| v.as_f64())
            .map_or_else(|| "-".to_string(), |c| format!("{c:.2}"));
        let valid = code
            .get("valid")
            .and_then(|v| v.as_bool())
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        builder.push_record([cell("code"), cell("description"), confidence, valid]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// A single visit object goes to `/visit-documentation`, an array to
/// `/batch-process`.
pub async fn visits(client: &EhrClient, file: Option<&Path>, format: OutputFormat) -> Result<()> {
    let resp = match read_json::<Value>(file)? {
        Value::Array(visits) => client.batch_process(&visits).await?,
        visit @ Value::Object(_) => client.document_visit(&visit).await?,
        _ => bail!("Expected a visit object or an array of visits"),
    };
    if format == OutputFormat::Json {
        return print_value(&resp, format);
    }

    let docs: Vec<Value> = match resp.get("results").and_then(|v| v.as_array()) {
        Some(results) => results.clone(),
        None => resp.get("documentation").cloned().into_iter().collect(),
    };
    for doc in &docs {
        let patient = doc.get("patient_id").and_then(|v| v.as_str()).unwrap_or("-");
        println!("{} {}", "Patient".cyan(), patient);
        println!("{}", doc.get("progress_note").and_then(|v| v.as_str()).unwrap_or(""));
        let codes = doc
            .get("icd10_codes")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        println!("{}", codes_table(&codes));
    }
    print_success(&format!("Documented {} visit(s)", docs.len()));
    Ok(())
}

pub async fn enhance(client: &EhrClient, args: &EnhanceArgs, format: OutputFormat) -> Result<()> {
    let bytes = fs::read(&args.image)
        .with_context(|| format!("Failed to read image: {}", args.image.display()))?;
    let request = EnhanceImageRequest {
        image_base64: STANDARD.encode(&bytes),
        modality: args.modality.clone(),
        use_bedrock: args.use_bedrock,
    };
    let mut resp = client.enhance_image(&request).await?;

    if let Some(output) = &args.output {
        let encoded = resp
            .get("enhanced_image")
            .and_then(|v| v.as_str())
            .context("Server returned no image")?;
        let image = STANDARD
            .decode(encoded)
            .context("Server returned an invalid image encoding")?;
        fs::write(output, &image)
            .with_context(|| format!("Failed to write image: {}", output.display()))?;
        print_success(&format!("Wrote {} bytes to {}", image.len(), output.display()));
    }

    // The image itself is noise on a terminal.
    if let Some(obj) = resp.as_object_mut() {
        if let Some(Value::String(img)) = obj.get("enhanced_image") {
            let summary = format!("<{} base64 chars>", img.len());
            obj.insert("enhanced_image".into(), Value::String(summary));
        }
    }
    print_value(&resp, format)
}
