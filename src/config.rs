//! Startup configuration
//!
//! Read from an optional JSON file (`FARMLOG_CONFIG`), then overridden field
//! by field from `FARMLOG_*` environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use farmlog_data::domain::DomainError;
use farmlog_data::repository::{Latency, LocalOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_ENV: &str = "FARMLOG_CONFIG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Collections kept in the local SQLite key-value store
    #[default]
    Local,
    /// Records kept by the remote record store
    Remote,
}

impl std::str::FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Backend::Local),
            "remote" => Ok(Backend::Remote),
            other => Err(ConfigError::Invalid(format!("unknown backend '{}'", other))),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to open local store: {0}")]
    Store(#[source] DomainError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub backend: Backend,
    pub remote_url: Option<String>,
    pub remote_token: Option<String>,
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    /// Seed empty local collections from the bundled sample data
    pub seed_fixtures: bool,
    /// Simulated 200-500 ms delay on local operations
    pub latency: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            remote_url: None,
            remote_token: None,
            db_path: PathBuf::from("farmlog.db"),
            log_dir: PathBuf::from("logs"),
            seed_fixtures: true,
            latency: false,
        }
    }
}

impl AppConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().filter(|(k, _)| k.starts_with("FARMLOG_")).collect();
        Self::from_vars(&vars)
    }

    /// Load using an explicit variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = match vars.get(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(path))?,
            None => Self::default(),
        };
        config.apply_overrides(vars)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> Result<(), ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(backend) = get("FARMLOG_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(url) = get("FARMLOG_REMOTE_URL") {
            self.remote_url = Some(url.to_string());
        }
        if let Some(token) = get("FARMLOG_REMOTE_TOKEN") {
            self.remote_token = Some(token.to_string());
        }
        if let Some(path) = get("FARMLOG_DB_PATH") {
            self.db_path = PathBuf::from(path);
        }
        if let Some(dir) = get("FARMLOG_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(flag) = get("FARMLOG_LATENCY") {
            self.latency = parse_flag(flag)?;
        }
        Ok(())
    }

    pub fn local_options(&self) -> LocalOptions {
        LocalOptions {
            seed_fixtures: self.seed_fixtures,
            latency: self.latency.then(Latency::default),
        }
    }
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid(format!("expected a boolean, got '{}'", other))),
    }
}
