use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "DIRSTORE_CONFIG";
pub const ROOT_ENV: &str = "DIRSTORE_ROOT";
pub const ENDPOINT_ENV: &str = "DIRSTORE_ENDPOINT";
pub const SYNC_WRITES_ENV: &str = "DIRSTORE_SYNC_WRITES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("storage root {0} is not an absolute path")]
    RelativeRoot(PathBuf),

    #[error("endpoint {0:?} is not an http(s) URL")]
    InvalidEndpoint(String),
}

/// Settings for a local storage connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Absolute path of the storage root. Every object lives beneath it.
    pub root: PathBuf,
    /// Base URL for public links. Unset or empty means objects have no public URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// fsync each object before it is published.
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

fn default_sync_writes() -> bool {
    true
}

impl StorageConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            endpoint: None,
            sync_writes: default_sync_writes(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(ConfigError::from)
    }

    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let root = env::var_os(ROOT_ENV).ok_or(ConfigError::MissingVar(ROOT_ENV))?;
        let mut config = Self::new(PathBuf::from(root));
        if let Ok(endpoint) = env::var(ENDPOINT_ENV) {
            config.endpoint = Some(endpoint);
        }
        if let Ok(flag) = env::var(SYNC_WRITES_ENV) {
            config.sync_writes = !matches!(flag.trim(), "0" | "false" | "no" | "off");
        }
        Ok(config)
    }

    /// Load the file named by `DIRSTORE_CONFIG` if set, otherwise build the
    /// config from the individual environment variables.
    pub fn from_env_or_path() -> Result<Self, ConfigError> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(PathBuf::from(path)),
            None => Self::from_env(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root.is_absolute() {
            return Err(ConfigError::RelativeRoot(self.root.clone()));
        }
        if let Some(endpoint) = self.public_endpoint() {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
            }
        }
        Ok(())
    }

    /// The configured endpoint, with an empty string treated as unset.
    pub fn public_endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }
}
