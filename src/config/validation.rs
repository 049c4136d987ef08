//! Configuration post-processing
//!
//! Cross-field rules that can only run once every field has been coerced:
//! derived secrets, conditional requirements, the two mini-languages and the
//! cached views built from comma separated lists.

use std::collections::BTreeSet;

use tracing::debug;
use url::{Host, Url};

use crate::config::AppConfig;
use crate::domain::{
    derive_secret, parse_standby_configs, parse_volumes, StorageVolumeRecord,
    IMAGE_TOKEN_SECRET_PURPOSE, SERVICE_SECRET_PURPOSE,
};
use crate::shared::error::{ConfigError, ConfigResult};

/// Configuration validator for cross-field logic
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run every post-processing step in order, stopping at the first failure
    pub fn post_process(config: &mut AppConfig) -> ConfigResult<()> {
        Self::fill_derived_secrets(config);
        Self::validate_smtp(config)?;
        Self::resolve_story_volumes(config)?;
        Self::resolve_standby_configs(config)?;
        Self::compute_views(config)?;
        Ok(())
    }

    /// Derive unset auxiliary secrets from the root secret
    fn fill_derived_secrets(config: &mut AppConfig) {
        if config.service_secret.is_empty() {
            debug!("Deriving service_secret from secret_key");
            config.service_secret = derive_secret(&config.secret_key, SERVICE_SECRET_PURPOSE);
        }
        if config.image_proxy.token_secret.is_empty() {
            debug!("Deriving image_token_secret from secret_key");
            config.image_proxy.token_secret =
                derive_secret(&config.secret_key, IMAGE_TOKEN_SECRET_PURPOSE);
        }
    }

    /// SMTP needs a host and a port once enabled
    fn validate_smtp(config: &AppConfig) -> ConfigResult<()> {
        if !config.smtp.enable {
            return Ok(());
        }
        if config.smtp.host.as_deref().map_or(true, |host| host.trim().is_empty()) {
            return Err(Self::required_by_smtp("smtp_host"));
        }
        if config.smtp.port.map_or(true, |port| port == 0) {
            return Err(Self::required_by_smtp("smtp_port"));
        }
        Ok(())
    }

    fn required_by_smtp(field: &str) -> ConfigError {
        ConfigError::ConditionalRequirementViolation {
            field: field.to_string(),
            condition: "smtp_enable=true".to_string(),
        }
    }

    /// Volume 0 defaults to the primary postgres connection
    pub fn default_volume(config: &AppConfig) -> StorageVolumeRecord {
        let pg = &config.postgres;
        StorageVolumeRecord::primary(&pg.user, &pg.password, &pg.host, pg.port, &pg.db)
    }

    fn resolve_story_volumes(config: &mut AppConfig) -> ConfigResult<()> {
        let default_record = Self::default_volume(config);
        let text = config.postgres.story_volumes.as_deref().unwrap_or("");
        config.story_volumes = parse_volumes(text, &default_record)?;
        debug!(count = config.story_volumes.len(), "Resolved story volumes");
        Ok(())
    }

    fn resolve_standby_configs(config: &mut AppConfig) -> ConfigResult<()> {
        let text = config.github.standby_configs.as_deref().unwrap_or("");
        config.github_standby_configs = parse_standby_configs(text)?;
        Ok(())
    }

    fn compute_views(config: &mut AppConfig) -> ConfigResult<()> {
        config.root_domain = Self::root_domain(&config.root_url)?;
        config.standby_domain_set = split_list(config.standby_domains.as_deref().unwrap_or(""));
        config.image_proxy_url_list = split_list(&config.image_proxy.urls).into_iter().collect();
        Ok(())
    }

    /// Host name of the root URL
    fn root_domain(root_url: &str) -> ConfigResult<String> {
        let invalid = |reason: &str| ConfigError::ConstraintViolation {
            field: "root_url".to_string(),
            reason: reason.to_string(),
        };
        let url = Url::parse(root_url).map_err(|_| invalid("not a valid URL"))?;
        match url.host() {
            Some(Host::Domain(domain)) => Ok(domain.to_string()),
            Some(Host::Ipv4(addr)) => Ok(addr.to_string()),
            Some(Host::Ipv6(addr)) => Ok(addr.to_string()),
            None => Err(invalid("URL has no host")),
        }
    }
}

/// Trimmed, non-empty, deduplicated items of a comma separated list
fn split_list(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
