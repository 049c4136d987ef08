//! Configuration management module
//!
//! This module handles all configuration concerns: the schema, binding from
//! the environment, coercion, and cross-field post-processing.

pub mod app_config;
pub mod binder;
pub mod coercion;
pub mod schema;
pub mod validation;

pub use app_config::{AppConfig, LogLevel, Role};
pub use binder::{EnvironmentBinder, RawEnvironment, ENV_PREFIX};
pub use coercion::{
    format_duration, parse_duration, FieldValidator, FieldValue, ValidatedFields,
};
pub use schema::{FieldDefault, FieldKind, FieldSpec, MAX_FEED_COUNT, SCHEMA};
pub use validation::ConfigValidator;
