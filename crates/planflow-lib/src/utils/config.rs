// Configuration loading
// Feature: Configuration
//
// Reads `AppConfig` from TOML and applies environment overrides:
// - PLANFLOW_CONFIG: config file path (default `planflow.toml`)
// - PLANFLOW_BIND: server bind address
// - PLANFLOW_MODEL: LLM model identifier
// - OPENAI_API_KEY: provider API key

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::AppConfig;

pub const CONFIG_PATH_ENV: &str = "PLANFLOW_CONFIG";
pub const BIND_ENV: &str = "PLANFLOW_BIND";
pub const MODEL_ENV: &str = "PLANFLOW_MODEL";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_CONFIG_PATH: &str = "planflow.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid config file: {0}")]
    Parse(String),

    #[error("Invalid prompt file: {0}")]
    Yaml(String),

    #[error("Invalid template '{name}': missing placeholder {placeholder}")]
    InvalidTemplate { name: String, placeholder: String },

    #[error("{0} is not set")]
    MissingApiKey(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    Io,
    Parse,
    Yaml,
    InvalidTemplate,
    MissingApiKey,
}

impl ConfigErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigErrorCode::Io => "CONFIG_IO_ERROR",
            ConfigErrorCode::Parse => "CONFIG_PARSE_ERROR",
            ConfigErrorCode::Yaml => "CONFIG_PROMPT_PARSE_ERROR",
            ConfigErrorCode::InvalidTemplate => "TEMPLATE_INVALID",
            ConfigErrorCode::MissingApiKey => "CONFIG_MISSING_API_KEY",
        }
    }
}

impl ConfigError {
    pub fn code(&self) -> ConfigErrorCode {
        match self {
            ConfigError::Io { .. } => ConfigErrorCode::Io,
            ConfigError::Parse(_) => ConfigErrorCode::Parse,
            ConfigError::Yaml(_) => ConfigErrorCode::Yaml,
            ConfigError::InvalidTemplate { .. } => ConfigErrorCode::InvalidTemplate,
            ConfigError::MissingApiKey(_) => ConfigErrorCode::MissingApiKey,
        }
    }
}

/// Load `.env` from the working directory, then its parent
pub fn load_dotenv() {
    let _ = dotenvy::dotenv().or_else(|_| dotenvy::from_filename("../.env"));
}

/// Config file path from `PLANFLOW_CONFIG`, or the default
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Parse a config file. A missing file yields the defaults.
pub fn load_file(path: &Path) -> ConfigResult<AppConfig> {
    if !path.exists() {
        log::info!(
            "[config] {} not found, using default configuration",
            path.display()
        );
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    log::info!("[config] Loaded configuration from {}", path.display());
    Ok(config)
}

/// Apply environment overrides through `lookup`
pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bind) = lookup(BIND_ENV).filter(|value| !value.is_empty()) {
        config.server.bind = bind;
    }
    if let Some(model) = lookup(MODEL_ENV).filter(|value| !value.is_empty()) {
        config.llm.model = model;
    }
}

/// Load the config file named by the environment and apply overrides
pub fn load_config() -> ConfigResult<AppConfig> {
    let mut config = load_file(&config_path())?;
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Provider API key from `OPENAI_API_KEY`
pub fn api_key() -> ConfigResult<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ConfigError::MissingApiKey(API_KEY_ENV.to_string()))
}
