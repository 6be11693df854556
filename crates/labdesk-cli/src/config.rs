use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
}

pub type ConfigFile = BTreeMap<String, ProfileConfig>;

fn config_path() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".labdesk");
    Ok(dir.join("config.toml"))
}

fn load_all_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

fn save_profile_to(path: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all_from(path)?;
    all.insert(profile.to_string(), config.clone());
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, toml::to_string_pretty(&all)?)?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all_from(&config_path()?)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    save_profile_to(&config_path()?, profile, config)
}

/// Applies `key = value` to a profile. Only `server` and `format` are known.
pub fn set_value(config: &mut ProfileConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "server" => config.server = Some(value.trim_end_matches('/').to_string()),
        "format" => match value {
            "json" | "table" => config.format = Some(value.to_string()),
            other => anyhow::bail!("Unknown format '{other}'. Use json or table"),
        },
        other => anyhow::bail!("Unknown config key '{other}'. Valid keys: server, format"),
    }
    Ok(())
}

pub fn resolve_server(cli_server: &Option<String>, profile: &str) -> Result<String> {
    // --server flag / LABDESK_URL env
    if let Some(s) = cli_server {
        return Ok(s.clone());
    }
    if let Some(s) = load_profile(profile)?.server {
        return Ok(s);
    }
    anyhow::bail!(
        "No server URL configured. Use --server, set LABDESK_URL, \
         or run: labdesk config set server <url>"
    )
}
