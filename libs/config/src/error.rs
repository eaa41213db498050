//! Configuration errors
//!
//! Every variant is fatal at startup.

use thiserror::Error;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Mandatory setting absent or blank
    #[error("Missing required configuration: {key}")]
    MissingField { key: &'static str },

    /// Setting present but unusable
    #[error("Invalid configuration for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// File or environment could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config_crate::ConfigError),

    #[error("Failed to expand {key}: {reason}")]
    Expansion { key: &'static str, reason: String },
}
