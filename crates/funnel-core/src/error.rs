//! Core error types for funnel-core.
//!
//! Timers, latches and counters are total and never fail. The only runtime
//! failure that matters is a generation request failing; it is caught at the
//! query adapter and replaced with a fixed string. Everything else here is
//! configuration or caller misuse.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for funnel-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generative-text service errors
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The session runtime task is gone
    #[error("Session runtime has shut down")]
    RuntimeClosed,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-separated key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home directory could not be determined
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Failures of a generation round trip.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// No API key was found in the environment
    #[error("No API key configured (looked in {0})")]
    MissingApiKey(String),

    /// Network or TLS failure
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service rejected the request for quota reasons
    #[error("Quota exceeded: {0}")]
    Quota(String),

    /// Any other non-success HTTP status
    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON
    #[error("Malformed response: {0}")]
    Decode(String),

    /// The task carrying the request died before answering
    #[error("Request aborted: {0}")]
    Aborted(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Session};

    #[test]
    fn config_errors_surface_through_core_error() {
        let mut config = Config::default();
        config.scarcity.floor = 11;
        let err = Session::new(&config).err().unwrap();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "scarcity.floor"
        ));
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn toml_errors_become_parse_failures() {
        let err: ConfigError = toml::from_str::<Config>("gate = 3").unwrap_err().into();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }
}
