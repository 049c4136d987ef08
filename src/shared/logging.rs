//! Logging utilities module
//!
//! This module provides centralized logging setup and the startup summary.

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use crate::config::AppConfig;
use crate::shared::error::ConfigError;

/// Handle for changing the log level once the configuration is resolved
pub struct LogFilter {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogFilter {
    /// Switch to `level`; no-op when `RUST_LOG` chose the filter
    pub fn set_level(&self, level: &str) -> crate::Result<()> {
        if self.from_env {
            return Ok(());
        }
        self.handle
            .reload(EnvFilter::new(level))
            .map_err(|e| ConfigError::Source(format!("Failed to set log level: {}", e)))
    }
}

/// Logging utilities for the application
pub struct LoggingUtils;

impl LoggingUtils {
    /// Initialize logging; `RUST_LOG` wins over `level` when set
    pub fn initialize(level: &str) -> crate::Result<LogFilter> {
        let (filter_layer, filter) = Self::reloadable_filter(level);

        let subscriber = tracing_subscriber::registry().with(filter_layer).with(
            fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(std::io::stderr),
        );

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| ConfigError::Source(format!("Failed to initialize logging: {}", e)))?;

        Ok(filter)
    }

    fn reloadable_filter(level: &str) -> (reload::Layer<EnvFilter, Registry>, LogFilter) {
        let (filter, from_env) = match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, true),
            Err(_) => (EnvFilter::new(level), false),
        };
        let (layer, handle) = reload::Layer::new(filter);
        (layer, LogFilter { handle, from_env })
    }

    /// Log what was resolved, without secrets
    pub fn log_resolved(config: &AppConfig) {
        info!(
            role = %config.role,
            log_level = config.log_level.as_filter(),
            root_domain = %config.root_domain,
            story_volumes = config.story_volumes.len(),
            standby_configs = config.github_standby_configs.len(),
            smtp = config.smtp.enable,
            "Configuration resolved"
        );
        if config.debug {
            warn!("Debug mode is enabled");
        }
        if config.allow_private_address {
            warn!("Feed fetching may reach private network addresses");
        }
    }

    /// Log a fatal resolution error
    pub fn log_failure(err: &ConfigError) {
        error!(
            field = err.field().unwrap_or("-"),
            error = %err,
            "Configuration resolution failed"
        );
    }
}
