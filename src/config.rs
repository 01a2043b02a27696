// Configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::i18n::Language;
use crate::models::AppConfig;

pub const APP_DIR: &str = "civic-assistant";

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join(APP_DIR);

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

pub fn get_logs_dir() -> Result<PathBuf> {
    let logs_dir = get_config_dir()?.join("logs");
    fs::create_dir_all(&logs_dir).context("Failed to create logs directory")?;
    Ok(logs_dir)
}

/// Load the user's config, writing the defaults on first run, then apply
/// `CIVIC_*` environment overrides.
pub fn load_config() -> Result<AppConfig> {
    let mut config = load_config_from(&get_config_path()?)?;
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

pub fn load_config_from(config_path: &Path) -> Result<AppConfig> {
    if !config_path.exists() {
        let default_config = AppConfig::default();
        save_config_to(config_path, &default_config)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(config_path).context("Failed to read config file")?;

    let config: AppConfig = toml::from_str(&contents).context("Failed to parse config file")?;

    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(&get_config_path()?, config)
}

pub fn save_config_to(config_path: &Path, config: &AppConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(config_path, contents).context("Failed to write config file")?;

    Ok(())
}

pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = get("CIVIC_GATEWAY_URL") {
        config.gateway_url = url;
    }
    if let Some(key) = get("CIVIC_API_KEY") {
        config.api_key = key;
    }
    if let Some(code) = get("CIVIC_LANGUAGE") {
        config.language = Language::from_code(&code);
    }
}
