//! Configuration for the journey engine

use crate::controller::PersistFailurePolicy;
use journey_types::CompletionPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `api.base_url`
pub const API_URL_ENV: &str = "CCRM_API_URL";

/// Base URL variable shared with the web frontend, used when
/// [`API_URL_ENV`] is unset
pub const PUBLIC_API_URL_ENV: &str = "NEXT_PUBLIC_API_URL";

/// Environment variable overriding `api.bearer_token`
pub const API_TOKEN_ENV: &str = "CCRM_API_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Journey API connection
    #[serde(default)]
    pub api: ApiConfig,

    /// Workflow policies
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Journey API connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sent as `Authorization: Bearer ...` when set
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            bearer_token: None,
        }
    }
}

/// Workflow policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Used for journeys whose progress does not name a policy
    #[serde(default)]
    pub completion_policy: CompletionPolicy,

    /// What to do with the local state when persisting fails
    #[serde(default)]
    pub persist_failure: PersistFailurePolicy,

    /// Start from a fresh instance when progress cannot be loaded
    #[serde(default = "default_true")]
    pub fallback_on_load_failure: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            completion_policy: CompletionPolicy::default(),
            persist_failure: PersistFailurePolicy::default(),
            fallback_on_load_failure: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Load configuration.
    ///
    /// Reads `path` when given, else the user config file if it exists,
    /// else uses defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path.map(Path::to_path_buf).or_else(existing_default_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML file without applying overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let url = lookup(API_URL_ENV)
            .or_else(|| lookup(PUBLIC_API_URL_ENV))
            .filter(|u| !u.trim().is_empty());
        if let Some(url) = url {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(API_TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.api.bearer_token = Some(token);
        }
    }

    /// `$CONFIG_DIR/ccrm/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ccrm").join("config.toml"))
    }
}

fn existing_default_path() -> Option<PathBuf> {
    EngineConfig::default_path().filter(|p| p.is_file())
}
