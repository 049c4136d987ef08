//! rssant configuration - resolves process settings from the environment
//!
//! This library reads `RSSANT_*` environment variables (optionally preloaded
//! from an env-file), validates them against a declared schema and produces a
//! single immutable [`AppConfig`] for the API, worker and scheduler roles.

pub mod config;
pub mod domain;
pub mod shared;

#[cfg(test)]
mod tests;

pub use config::AppConfig;
pub use domain::{derive_secret, parse_standby_configs, parse_volumes};
pub use shared::error::{ConfigError, ConfigResult};

/// Application result type
pub type Result<T> = std::result::Result<T, shared::error::ConfigError>;
