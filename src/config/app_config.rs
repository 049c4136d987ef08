//! Application configuration structures
//!
//! This module contains the typed configuration resolved from the
//! environment. Fields mirror the schema; the derived fields at the bottom of
//! [`AppConfig`] are filled by the post-processor.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use super::binder::{EnvironmentBinder, RawEnvironment};
use super::coercion::{FieldValidator, ValidatedFields};
use super::validation::ConfigValidator;
use crate::domain::{StandbyOAuthConfig, StorageVolumeRecord};
use crate::shared::error::{ConfigError, ConfigResult};

/// Process role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Api,
    Worker,
    Scheduler,
    AsyncApi,
}

impl FromStr for Role {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(Role::Api),
            "worker" => Ok(Role::Worker),
            "scheduler" => Ok(Role::Scheduler),
            "asyncapi" => Ok(Role::AsyncApi),
            other => Err(ConfigError::ConstraintViolation {
                field: "role".to_string(),
                reason: format!("unknown role {:?}", other),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Api => "api",
            Role::Worker => "worker",
            Role::Scheduler => "scheduler",
            Role::AsyncApi => "asyncapi",
        };
        f.write_str(name)
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(ConfigError::ConstraintViolation {
                field: "log_level".to_string(),
                reason: format!("unknown log level {:?}", other),
            }),
        }
    }
}

/// Primary postgres connection
#[derive(Debug, Clone, Serialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub db: String,
    pub user: String,
    #[serde(serialize_with = "crate::shared::redact::secret")]
    pub password: String,
    /// Raw story volume spec
    #[serde(serialize_with = "crate::shared::redact::optional_secret")]
    pub story_volumes: Option<String>,
}

/// GitHub OAuth login
#[derive(Debug, Clone, Serialize)]
pub struct GithubConfig {
    pub client_id: Option<String>,
    #[serde(serialize_with = "crate::shared::redact::optional_secret")]
    pub secret: Option<String>,
    /// Raw standby config list
    #[serde(serialize_with = "crate::shared::redact::optional_secret")]
    pub standby_configs: Option<String>,
}

/// Outgoing email
#[derive(Debug, Clone, Serialize)]
pub struct SmtpConfig {
    pub enable: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    #[serde(serialize_with = "crate::shared::redact::optional_secret")]
    pub password: Option<String>,
    pub use_ssl: bool,
}

/// RSS proxy service
#[derive(Debug, Clone, Serialize)]
pub struct RssProxyConfig {
    pub enable: bool,
    pub url: Option<String>,
    #[serde(serialize_with = "crate::shared::redact::optional_secret")]
    pub token: Option<String>,
}

/// HTTP or SOCKS proxy
#[derive(Debug, Clone, Serialize)]
pub struct ProxyConfig {
    pub enable: bool,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EzproxyConfig {
    pub enable: bool,
    pub base_url: Option<String>,
    #[serde(serialize_with = "crate::shared::redact::secret")]
    pub apikey: String,
    pub chain_cn: String,
    pub chain_global: String,
}

/// Third party analytics snippets
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsConfig {
    pub baidu_tongji_enable: bool,
    pub baidu_tongji_id: Option<String>,
    pub clarity_enable: bool,
    pub clarity_code: Option<String>,
    pub google_enable: bool,
    pub google_tracking_id: Option<String>,
    pub plausible_enable: bool,
    pub plausible_url: Option<String>,
    pub plausible_domain: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EzrevenueConfig {
    pub enable: bool,
    pub project_id: Option<String>,
    #[serde(serialize_with = "crate::shared::redact::optional_secret")]
    pub project_secret: Option<String>,
    pub base_url: Option<String>,
}

/// Image proxy and story image detection
#[derive(Debug, Clone, Serialize)]
pub struct ImageProxyConfig {
    pub enable: bool,
    /// Raw comma separated URL list
    pub urls: String,
    /// Derived from the root secret when unset
    #[serde(serialize_with = "crate::shared::redact::secret")]
    pub token_secret: String,
    #[serde(serialize_with = "crate::shared::redact::duration")]
    pub token_expires: Duration,
    pub detect_story_image_enable: bool,
}

/// Application configuration
///
/// Built once by [`AppConfig::load`] or [`AppConfig::resolve`] and shared
/// read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub debug: bool,
    pub profiler_enable: bool,
    pub debug_toolbar_enable: bool,
    pub log_level: LogLevel,
    pub role: Role,

    pub root_url: String,
    pub harbor_url: String,
    pub worker_url: String,
    pub standby_domains: Option<String>,

    pub scheduler_num_worker: u32,
    pub allow_private_address: bool,
    pub check_feed_minutes: u32,
    pub feed_story_retention: u32,
    /// Seconds
    pub feed_reader_request_timeout: u32,

    #[serde(serialize_with = "crate::shared::redact::secret")]
    pub secret_key: String,
    /// Derived from the root secret when unset
    #[serde(serialize_with = "crate::shared::redact::secret")]
    pub service_secret: String,
    pub hashid_salt: String,
    pub admin_email: String,

    pub postgres: PostgresConfig,
    pub github: GithubConfig,
    pub smtp: SmtpConfig,
    pub rss_proxy: RssProxyConfig,
    pub proxy: ProxyConfig,
    pub ezproxy: EzproxyConfig,
    pub analytics: AnalyticsConfig,
    pub ezrevenue: EzrevenueConfig,
    pub image_proxy: ImageProxyConfig,

    /// Story volumes keyed by volume index
    pub story_volumes: BTreeMap<u32, StorageVolumeRecord>,
    /// Standby OAuth apps keyed by domain
    pub github_standby_configs: BTreeMap<String, StandbyOAuthConfig>,
    /// Host name of `root_url`
    pub root_domain: String,
    pub standby_domain_set: BTreeSet<String>,
    /// Sorted, deduplicated image proxy URLs
    pub image_proxy_url_list: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the process environment and optional env-file
    pub fn load() -> crate::Result<Arc<Self>> {
        let raw = EnvironmentBinder::default().bind()?;
        let config = Self::resolve(&raw)?;
        info!(
            role = %config.role,
            root_url = %config.root_url,
            volumes = config.story_volumes.len(),
            "Configuration loaded"
        );
        Ok(Arc::new(config))
    }

    /// Validate raw values and run the cross-field post-processing
    pub fn resolve(raw: &RawEnvironment) -> crate::Result<Self> {
        let mut fields = FieldValidator::validate(raw)?;
        let mut config = Self::from_fields(&mut fields)?;
        ConfigValidator::post_process(&mut config)?;
        Ok(config)
    }

    /// Assemble base fields; derived fields stay empty until post-processing
    fn from_fields(f: &mut ValidatedFields) -> ConfigResult<Self> {
        Ok(Self {
            debug: f.take_bool("debug")?,
            profiler_enable: f.take_bool("profiler_enable")?,
            debug_toolbar_enable: f.take_bool("debug_toolbar_enable")?,
            log_level: f.take_str("log_level")?.parse()?,
            role: f.take_str("role")?.parse()?,
            root_url: f.take_str("root_url")?,
            harbor_url: f.take_str("harbor_url")?,
            worker_url: f.take_str("worker_url")?,
            standby_domains: f.take_opt_str("standby_domains")?,
            scheduler_num_worker: f.take_int("scheduler_num_worker")?,
            allow_private_address: f.take_bool("allow_private_address")?,
            check_feed_minutes: f.take_int("check_feed_minutes")?,
            feed_story_retention: f.take_int("feed_story_retention")?,
            feed_reader_request_timeout: f.take_int("feed_reader_request_timeout")?,
            secret_key: f.take_str("secret_key")?,
            service_secret: f.take_opt_str("service_secret")?.unwrap_or_default(),
            hashid_salt: f.take_str("hashid_salt")?,
            admin_email: f.take_str("admin_email")?,
            postgres: PostgresConfig {
                host: f.take_str("pg_host")?,
                port: f.take_int("pg_port")?,
                db: f.take_str("pg_db")?,
                user: f.take_str("pg_user")?,
                password: f.take_str("pg_password")?,
                story_volumes: f.take_opt_str("pg_story_volumes")?,
            },
            github: GithubConfig {
                client_id: f.take_opt_str("github_client_id")?,
                secret: f.take_opt_str("github_secret")?,
                standby_configs: f.take_opt_str("github_standby_configs")?,
            },
            smtp: SmtpConfig {
                enable: f.take_bool("smtp_enable")?,
                host: f.take_opt_str("smtp_host")?,
                port: f
                    .take_opt_int("smtp_port")?
                    .map(|port| {
                        u16::try_from(port).map_err(|_| ConfigError::ConstraintViolation {
                            field: "smtp_port".to_string(),
                            reason: format!("{} is out of range", port),
                        })
                    })
                    .transpose()?,
                username: f.take_opt_str("smtp_username")?,
                password: f.take_opt_str("smtp_password")?,
                use_ssl: f.take_bool("smtp_use_ssl")?,
            },
            rss_proxy: RssProxyConfig {
                enable: f.take_bool("rss_proxy_enable")?,
                url: f.take_opt_str("rss_proxy_url")?,
                token: f.take_opt_str("rss_proxy_token")?,
            },
            proxy: ProxyConfig {
                enable: f.take_bool("proxy_enable")?,
                url: f.take_opt_str("proxy_url")?,
            },
            ezproxy: EzproxyConfig {
                enable: f.take_bool("ezproxy_enable")?,
                base_url: f.take_opt_str("ezproxy_base_url")?,
                apikey: f.take_str("ezproxy_apikey")?,
                chain_cn: f.take_str("ezproxy_chain_cn")?,
                chain_global: f.take_str("ezproxy_chain_global")?,
            },
            analytics: AnalyticsConfig {
                baidu_tongji_enable: f.take_bool("analytics_baidu_tongji_enable")?,
                baidu_tongji_id: f.take_opt_str("analytics_baidu_tongji_id")?,
                clarity_enable: f.take_bool("analytics_clarity_enable")?,
                clarity_code: f.take_opt_str("analytics_clarity_code")?,
                google_enable: f.take_bool("analytics_google_enable")?,
                google_tracking_id: f.take_opt_str("analytics_google_tracking_id")?,
                plausible_enable: f.take_bool("analytics_plausible_enable")?,
                plausible_url: f.take_opt_str("analytics_plausible_url")?,
                plausible_domain: f.take_opt_str("analytics_plausible_domain")?,
            },
            ezrevenue: EzrevenueConfig {
                enable: f.take_bool("ezrevenue_enable")?,
                project_id: f.take_opt_str("ezrevenue_project_id")?,
                project_secret: f.take_opt_str("ezrevenue_project_secret")?,
                base_url: f.take_opt_str("ezrevenue_base_url")?,
            },
            image_proxy: ImageProxyConfig {
                enable: f.take_bool("image_proxy_enable")?,
                urls: f.take_str("image_proxy_urls")?,
                token_secret: f.take_opt_str("image_token_secret")?.unwrap_or_default(),
                token_expires: f.take_duration("image_token_expires")?,
                detect_story_image_enable: f.take_bool("detect_story_image_enable")?,
            },
            story_volumes: BTreeMap::new(),
            github_standby_configs: BTreeMap::new(),
            root_domain: String::new(),
            standby_domain_set: BTreeSet::new(),
            image_proxy_url_list: Vec::new(),
        })
    }

    pub fn is_role_api(&self) -> bool {
        self.role == Role::Api
    }

    pub fn is_role_worker(&self) -> bool {
        self.role == Role::Worker
    }

    pub fn is_role_scheduler(&self) -> bool {
        self.role == Role::Scheduler
    }

    pub fn is_role_asyncapi(&self) -> bool {
        self.role == Role::AsyncApi
    }

    /// Feed check interval
    pub fn check_feed_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.check_feed_minutes) * 60)
    }

    /// Timeout for a single feed reader request
    pub fn feed_reader_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.feed_reader_request_timeout))
    }

    /// Pretty JSON dump with every secret redacted
    pub fn to_redacted_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Source(format!("Failed to serialize configuration: {}", e)))
    }
}
