mod cli;
mod commands;
mod output;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use ehrlite_cli::auth::FileTokenStore;
use ehrlite_cli::{ClientError, EhrClient, config};

use cli::{Cli, Commands, ConfigCommands, OutputFormat, PatientCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if matches!(e.downcast_ref::<ClientError>(), Some(ClientError::LoginRequired)) {
            print_error("session expired, run `ehrlite login`");
        } else {
            print_error(&format!("{e:#}"));
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let profile = &cli.profile;
    let profile_cfg = config::load_profile(profile)?;
    let server = config::resolve_server(cli.server.as_deref(), &profile_cfg);
    let format = match cli.format {
        Some(f) => f,
        None => match profile_cfg.format.as_deref() {
            Some("table") => OutputFormat::Table,
            _ => OutputFormat::Json,
        },
    };
    let store = Arc::new(FileTokenStore::for_profile(profile)?);

    match &cli.command {
        Commands::Login(args) => commands::auth::login(&store, &server, &args.token)?,
        Commands::Logout => commands::auth::logout(&store, profile)?,
        Commands::Whoami => commands::auth::whoami(&store, &server, profile)?,
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => {
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    profile_cfg.server.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    profile_cfg.format.as_deref().unwrap_or("json")
                );
            }
            ConfigCommands::Set(set_args) => {
                let mut cfg = profile_cfg.clone();
                cfg.set(&set_args.key, &set_args.value)?;
                config::save_profile(profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
        Commands::Status => {
            let client = EhrClient::new(&server, store);
            commands::server::status(&client, format).await?;
        }
        Commands::Patients(args) => {
            let client = EhrClient::new(&server, store);
            match &args.command {
                PatientCommands::List => commands::patients::list(&client, format).await?,
                PatientCommands::Get { id } => {
                    commands::patients::get(&client, *id, format).await?
                }
                PatientCommands::Create { file } => {
                    commands::patients::create(&client, file.as_deref(), format).await?
                }
                PatientCommands::Update { id, file } => {
                    commands::patients::update(&client, *id, file.as_deref(), format).await?
                }
                PatientCommands::ToggleStatus { id } => {
                    commands::patients::toggle_status(&client, *id, format).await?
                }
            }
        }
        Commands::Notes(args) => {
            let client = EhrClient::new(&server, store);
            commands::features::notes(&client, &args.note_type, args.file.as_deref(), format)
                .await?;
        }
        Commands::Icd10(args) => {
            let client = EhrClient::new(&server, store);
            commands::features::icd10(&client, &args.text, args.top_k, format).await?;
        }
        Commands::Enhance(args) => {
            let client = EhrClient::new(&server, store);
            commands::features::enhance(&client, args, format).await?;
        }
        Commands::Visits(args) => {
            let client = EhrClient::new(&server, store);
            commands::features::visits(&client, args.file.as_deref(), format).await?;
        }
    }

    Ok(())
}
