// src/config.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{EvalError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.evalgate.dev";

/// Milliseconds between status polls unless overridden with `--interval`.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Settings persisted by `evalgate login` in the user config directory.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl FileConfig {
    /// Loads the config file, treating a missing file as empty settings.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(FileConfig::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Writes the config file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub api_key: String,
}

impl AppConfig {
    /// Resolves configuration with CLI/env values taking precedence over the
    /// config file, and the built-in base URL as the last resort. An API key
    /// must come from somewhere.
    pub fn resolve(
        api_base: Option<String>,
        api_key: Option<String>,
        file: &FileConfig,
    ) -> Result<Self> {
        let api_base = api_base
            .or_else(|| file.api_base.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let api_key = api_key.or_else(|| file.api_key.clone()).ok_or_else(|| {
            EvalError::Config(
                "No API key configured. Set EVALGATE_API_KEY or run `evalgate login`.".to_string(),
            )
        })?;

        Ok(AppConfig { api_base, api_key })
    }
}

/// Default location of the persisted config: `<config dir>/evalgate/config.toml`.
pub fn config_file_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        EvalError::Config("Could not determine the user config directory".to_string())
    })?;
    Ok(base.join("evalgate").join("config.toml"))
}

/// Shows only the last four characters of an API key.
pub fn masked_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 4 {
        "****".to_string()
    } else {
        let tail: String = key.chars().skip(count - 4).collect();
        format!("****{}", tail)
    }
}
