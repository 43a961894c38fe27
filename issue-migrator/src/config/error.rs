//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading configuration or validating requests.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("Failed to parse '{path}': {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Failed to parse a JSON request file.
    #[error("Failed to parse '{path}': {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Validation error in a config file.
    #[error("Validation error in '{path}': {message}")]
    ValidationError { path: String, message: String },

    /// A migration or listing request is missing required fields.
    #[error("Invalid {side} configuration: {message}")]
    InvalidPlatform {
        side: &'static str,
        message: String,
    },

    /// Unknown migration direction.
    #[error("Invalid migration direction '{0}'")]
    InvalidDirection(String),
}
