use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use ehrlite_cli::EhrClient;
use ehrlite_storage::{PatientFields, PatientId, PatientStatus};

use super::read_json;
use crate::cli::OutputFormat;
use crate::output::{print_patients, print_success, print_value};

pub async fn list(client: &EhrClient, format: OutputFormat) -> Result<()> {
    let patients = client.list_patients().await?;
    print_patients(&patients, format)
}

pub async fn get(client: &EhrClient, id: PatientId, format: OutputFormat) -> Result<()> {
    let patient = client.get_patient(id).await?;
    print_value(&patient, format)
}

pub async fn create(client: &EhrClient, file: Option<&Path>, format: OutputFormat) -> Result<()> {
    let fields: PatientFields = read_json(file)?;
    fields.validate()?;
    let created = client.create_patient(&fields).await?;
    print_success(&format!(
        "{} (id {})",
        created.message,
        created.patient.id.to_string().cyan()
    ));
    print_value(&created.patient, format)
}

pub async fn update(
    client: &EhrClient,
    id: PatientId,
    file: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let fields: PatientFields = read_json(file)?;
    fields.validate()?;
    let updated = client.update_patient(id, &fields).await?;
    print_success(&format!("{} (id {})", updated.message, id.to_string().cyan()));
    print_value(&updated.patient, format)
}

/// Reads the current status and writes back the opposite one. A patient
/// without a status counts as active.
pub async fn toggle_status(client: &EhrClient, id: PatientId, format: OutputFormat) -> Result<()> {
    let current = client.get_patient(id).await?;
    let next = current
        .fields
        .status
        .unwrap_or(PatientStatus::Active)
        .toggled();
    let fields = PatientFields {
        status: Some(next),
        ..Default::default()
    };
    let updated = client.update_patient(id, &fields).await?;
    print_success(&format!(
        "Patient {} is now {}",
        id.to_string().cyan(),
        next.as_str().cyan()
    ));
    print_value(&updated.patient, format)
}
