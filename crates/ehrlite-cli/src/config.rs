use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Fallback server URL when no flag or profile names one.
pub const DEFAULT_SERVER: &str = "http://localhost:5000";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
}

impl ProfileConfig {
    /// Sets a key by name. Valid keys: `server`, `format`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server" => {
                url::Url::parse(value).with_context(|| format!("Invalid server URL: {value}"))?;
                self.server = Some(value.to_string());
            }
            "format" => {
                if !matches!(value, "json" | "table") {
                    anyhow::bail!("Invalid format: {value}. Valid formats: json, table");
                }
                self.format = Some(value.to_string());
            }
            other => anyhow::bail!("Unknown config key: {other}. Valid keys: server, format"),
        }
        Ok(())
    }
}

/// Profiles keyed by name, as stored in `~/.ehrlite/config.toml`.
pub type ConfigFile = BTreeMap<String, ProfileConfig>;

fn config_path() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".ehrlite");
    fs::create_dir_all(&dir)?;
    Ok(dir.join("config.toml"))
}

pub fn load_all() -> Result<ConfigFile> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    Ok(load_all()?.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all()?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(config_path()?, content)?;
    Ok(())
}

/// Picks the server URL: `--server` / `EHRLITE_URL`, then the profile, then
/// [`DEFAULT_SERVER`].
pub fn resolve_server(cli_server: Option<&str>, profile: &ProfileConfig) -> String {
    cli_server
        .map(str::to_string)
        .or_else(|| profile.server.clone())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string())
}
