use anyhow::Result;
use colored::Colorize;
use ehrlite_storage::PatientRecord;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_value<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let value = serde_json::to_value(value)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Table => print_as_table(&value),
    }
    Ok(())
}

pub fn print_patients(patients: &[PatientRecord], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_value(&patients, format);
    }
    if patients.is_empty() {
        println!("No patients found.");
        return Ok(());
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Age", "Gender", "Diagnosis", "Status"]);
    for p in patients {
        let f = &p.fields;
        builder.push_record([
            p.id.to_string(),
            f.name.clone().unwrap_or_else(|| "-".into()),
            f.age.map_or_else(|| "-".into(), |a| a.to_string()),
            f.gender.clone().unwrap_or_else(|| "-".into()),
            f.diagnosis.clone().unwrap_or_else(|| "-".into()),
            f.status.map_or("-", |s| s.as_str()).to_string(),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    println!("Total: {}", patients.len());
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Objects become a two-column key/value table. Anything else prints as JSON.
fn print_as_table(value: &Value) {
    let Some(obj) = value.as_object() else {
        println!("{value}");
        return;
    };
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in obj {
        let cell = match val {
            Value::String(s) => s.clone(),
            Value::Null => "-".to_string(),
            other => other.to_string(),
        };
        builder.push_record([key.clone(), cell]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}
