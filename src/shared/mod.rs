//! Shared utilities and common functionality
//!
//! Error handling, logging and serde helpers used across the crate.

pub mod error;
pub mod logging;
pub mod redact;

pub use error::{ConfigError, ConfigResult};
pub use logging::{LogFilter, LoggingUtils};
