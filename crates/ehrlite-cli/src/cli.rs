use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ehrlite_storage::PatientId;

#[derive(Parser)]
#[command(name = "ehrlite")]
#[command(about = "ehrlite CLI: manage patient records and call the clinical helpers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL (overrides config)
    #[arg(short, long, global = true, env = "EHRLITE_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "EHRLITE_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a bearer token for this profile
    Login(LoginArgs),
    /// Remove the stored token
    Logout,
    /// Show the current profile and token
    Whoami,
    /// Check server health
    Status,
    /// Read and edit patient records
    Patients(PatientsArgs),
    /// Generate a clinical note (soap, discharge, radiology)
    Notes(NotesArgs),
    /// Suggest ICD-10 codes for clinical text
    Icd10(Icd10Args),
    /// Enhance or analyze a medical image
    Enhance(EnhanceArgs),
    /// Document visits: progress note plus ICD-10 codes per visit
    Visits(VisitsArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Bearer token issued for this server
    #[arg(long)]
    pub token: String,
}

#[derive(clap::Args)]
pub struct PatientsArgs {
    #[command(subcommand)]
    pub command: PatientCommands,
}

#[derive(Subcommand)]
pub enum PatientCommands {
    /// List all patients
    List,
    /// Show one patient
    Get { id: PatientId },
    /// Add a patient from a JSON file (reads stdin if omitted)
    Create {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Merge fields from a JSON file into a patient (reads stdin if omitted)
    Update {
        id: PatientId,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Flip a patient between active and inactive
    ToggleStatus { id: PatientId },
}

#[derive(clap::Args)]
pub struct NotesArgs {
    /// Note type: soap, discharge or radiology
    pub note_type: String,
    /// JSON file with patient_info, findings, admission_data, image_findings, modality
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct Icd10Args {
    /// Clinical text to code
    pub text: String,
    /// Maximum number of suggestions
    #[arg(long)]
    pub top_k: Option<usize>,
}

#[derive(clap::Args)]
pub struct EnhanceArgs {
    /// Image file to upload
    pub image: PathBuf,
    /// Imaging modality (xray, ct, mri, ultrasound, dxa)
    #[arg(long)]
    pub modality: Option<String>,
    /// Ask for a textual analysis instead of an enhanced image
    #[arg(long)]
    pub use_bedrock: bool,
    /// Write the returned image here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct VisitsArgs {
    /// JSON file with one visit object, or an array of visits for batch
    /// processing (reads stdin if omitted)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format)
    pub key: String,
    /// Value
    pub value: String,
}
