use anyhow::Result;
use colored::Colorize;
use ehrlite_cli::{ClientError, EhrClient};

use crate::cli::OutputFormat;
use crate::output::print_value;

pub async fn status(client: &EhrClient, format: OutputFormat) -> Result<()> {
    let server = client.base_url();
    let health = match client.health().await {
        Ok(h) => h,
        Err(ClientError::Api { status, message }) => {
            println!(
                "{} {} returned {} {}",
                "✗".red(),
                server.cyan(),
                status.to_string().red(),
                message
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if format == OutputFormat::Json {
        return print_value(&health, format);
    }

    let state = health
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    println!("{} {} is {}", "✓".green(), server.cyan(), state.green());
    if let Some(components) = health.get("components").and_then(|v| v.as_object()) {
        for (name, up) in components {
            let mark = if up.as_bool() == Some(true) {
                "available".green()
            } else {
                "unavailable".yellow()
            };
            println!("  {name}: {mark}");
        }
    }
    Ok(())
}
