//! Error handling module
//!
//! This module provides the error type shared by every stage of
//! configuration resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration error types
///
/// Every variant is fatal at startup. Variants name the offending field or
/// list fragment so an operator can fix the environment directly.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    #[error("Invalid value for {field}: expected {expected}, got {value:?}")]
    TypeCoercion {
        field: String,
        expected: String,
        value: String,
    },

    #[error("Constraint violated for {field}: {reason}")]
    ConstraintViolation { field: String, reason: String },

    #[error("Invalid story volume {fragment:?}: {reason}")]
    MalformedVolumeSpec { fragment: String, reason: String },

    #[error("Invalid github standby config {fragment:?}: {reason}")]
    MalformedStandbyConfigSpec { fragment: String, reason: String },

    #[error("{field} is required when {condition}")]
    ConditionalRequirementViolation { field: String, condition: String },

    #[error("Failed to load env file from {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },

    #[error("Configuration source error: {0}")]
    Source(String),
}

impl ConfigError {
    /// Name of the field this error refers to, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::MissingRequiredField { field }
            | ConfigError::TypeCoercion { field, .. }
            | ConfigError::ConstraintViolation { field, .. }
            | ConfigError::ConditionalRequirementViolation { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Source(err.to_string())
    }
}
