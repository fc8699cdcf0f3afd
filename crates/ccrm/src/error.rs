//! CLI error types

use access_types::AccessError;
use journey_engine::{ApiError, ConfigError};
use journey_types::JourneyError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Journey API client error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Rejected workflow action
    #[error(transparent)]
    Journey(#[from] JourneyError),

    /// Unknown role or permission
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The action was applied but the journey API did not accept it
    #[error("{action} was not saved: {error}")]
    NotPersisted { action: String, error: JourneyError },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
