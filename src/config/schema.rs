//! Configuration schema
//!
//! Every recognized option is declared once in [`SCHEMA`]. The binder uses it
//! to know which variables to read and the validator uses it to know how to
//! coerce each raw value.

use std::time::Duration;

/// Upper bound on feeds a single user may subscribe to
pub const MAX_FEED_COUNT: usize = 5000;

/// Semantic type of a configuration field together with its constraints
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Bool,
    Int { min: Option<i64>, max: Option<i64> },
    Duration { min: Option<Duration> },
    Str,
    Enum(&'static [&'static str]),
    Url { schemes: &'static [&'static str] },
    Email,
}

impl FieldKind {
    /// Short human name of the kind, used in coercion errors
    pub fn expected(&self) -> String {
        match self {
            FieldKind::Bool => "a boolean".to_string(),
            FieldKind::Int { .. } => "an integer".to_string(),
            FieldKind::Duration { .. } => "a duration like 30s, 5m, 1h or 1d".to_string(),
            FieldKind::Str => "a string".to_string(),
            FieldKind::Enum(values) => format!("one of {}", values.join(", ")),
            FieldKind::Url { schemes } => format!("a URL with scheme {}", schemes.join("/")),
            FieldKind::Email => "an email address".to_string(),
        }
    }
}

/// Value used when the environment does not provide one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// Raw literal, coerced exactly like environment input
    Value(&'static str),
    /// Field may be absent entirely
    Optional,
    /// Field has to be provided
    Required,
}

/// Declaration of a single configuration field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
    /// Secret values are never echoed in errors or dumps
    pub secret: bool,
    pub description: &'static str,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind, default: FieldDefault) -> Self {
        Self {
            name,
            kind,
            default,
            secret: false,
            description: "",
        }
    }

    const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    const fn desc(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

const HTTP_SCHEMES: &[&str] = &["http", "https"];
const PROXY_SCHEMES: &[&str] = &["http", "https", "socks5"];

pub const LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARNING", "ERROR"];
pub const ROLES: &[&str] = &["api", "worker", "scheduler", "asyncapi"];

const fn flag(name: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Bool, FieldDefault::Value(default))
}

const fn text(name: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Str, FieldDefault::Value(default))
}

const fn optional_text(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Str, FieldDefault::Optional)
}

const fn int(
    name: &'static str,
    min: Option<i64>,
    max: Option<i64>,
    default: FieldDefault,
) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Int { min, max }, default)
}

const fn url(name: &'static str, default: FieldDefault) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Url { schemes: HTTP_SCHEMES }, default)
}

/// The full ordered set of configuration fields
pub static SCHEMA: &[FieldSpec] = &[
    flag("debug", "false").desc("debug"),
    flag("profiler_enable", "false").desc("enable profiler or not"),
    flag("debug_toolbar_enable", "false").desc("enable debug toolbar or not"),
    FieldSpec::new("log_level", FieldKind::Enum(LOG_LEVELS), FieldDefault::Value("INFO")),
    url("root_url", FieldDefault::Value("http://localhost:6789")),
    url("harbor_url", FieldDefault::Value("http://localhost:6788")),
    url("worker_url", FieldDefault::Value("http://localhost:6793")),
    int("scheduler_num_worker", Some(1), None, FieldDefault::Value("10")),
    FieldSpec::new("role", FieldKind::Enum(ROLES), FieldDefault::Value("api")),
    optional_text("standby_domains").desc("comma separated domains"),
    text("secret_key", "8k1v_4#kv4+3qu1=ulp+@@#65&++!fl1(e*7)ew&nv!)cq%e2y").secret(),
    optional_text("service_secret").secret().desc("service secret"),
    optional_text("image_token_secret").secret().desc("image proxy token secret"),
    flag("allow_private_address", "false"),
    int("check_feed_minutes", Some(1), None, FieldDefault::Value("30")),
    int("feed_story_retention", Some(1), None, FieldDefault::Value("5000"))
        .desc("max storys to keep per feed"),
    optional_text("pg_story_volumes")
        .secret()
        .desc("volume:table or volume:user:password@host:port/db/table"),
    int("feed_reader_request_timeout", Some(1), None, FieldDefault::Value("30"))
        .desc("feed reader request timeout"),
    // postgres database
    text("pg_host", "localhost").desc("postgres host"),
    int("pg_port", Some(1), Some(65535), FieldDefault::Value("5432")).desc("postgres port"),
    text("pg_db", "rssant").desc("postgres database"),
    text("pg_user", "rssant").desc("postgres user"),
    text("pg_password", "rssant").secret().desc("postgres password"),
    // github login
    optional_text("github_client_id"),
    optional_text("github_secret").secret(),
    optional_text("github_standby_configs").secret().desc("domain,client_id,secret;"),
    // email smtp
    FieldSpec::new("admin_email", FieldKind::Email, FieldDefault::Value("admin@localhost.com")),
    flag("smtp_enable", "false"),
    optional_text("smtp_host"),
    int("smtp_port", Some(0), Some(65535), FieldDefault::Optional),
    optional_text("smtp_username"),
    optional_text("smtp_password").secret(),
    flag("smtp_use_ssl", "false"),
    // rss proxy
    url("rss_proxy_url", FieldDefault::Optional),
    optional_text("rss_proxy_token").secret(),
    flag("rss_proxy_enable", "false"),
    // http proxy or socks proxy
    FieldSpec::new("proxy_url", FieldKind::Url { schemes: PROXY_SCHEMES }, FieldDefault::Optional),
    flag("proxy_enable", "false"),
    // ezproxy
    url("ezproxy_base_url", FieldDefault::Optional),
    text("ezproxy_apikey", "ezproxy").secret(),
    text("ezproxy_chain_cn", "cn"),
    text("ezproxy_chain_global", "default"),
    flag("ezproxy_enable", "false"),
    // analytics
    flag("analytics_baidu_tongji_enable", "false"),
    optional_text("analytics_baidu_tongji_id"),
    flag("analytics_clarity_enable", "false"),
    optional_text("analytics_clarity_code"),
    flag("analytics_google_enable", "false"),
    optional_text("analytics_google_tracking_id"),
    flag("analytics_plausible_enable", "false"),
    optional_text("analytics_plausible_url"),
    optional_text("analytics_plausible_domain"),
    // ezrevenue
    flag("ezrevenue_enable", "false"),
    optional_text("ezrevenue_project_id"),
    optional_text("ezrevenue_project_secret").secret(),
    url("ezrevenue_base_url", FieldDefault::Optional),
    // image proxy
    flag("image_proxy_enable", "true"),
    text("image_proxy_urls", "origin").desc("comma separated URL list"),
    FieldSpec::new(
        "image_token_expires",
        FieldKind::Duration { min: Some(Duration::from_secs(1)) },
        FieldDefault::Value("30m"),
    ),
    flag("detect_story_image_enable", "false"),
    // hashid salt
    text("hashid_salt", "rssant"),
];

/// Look up a field declaration by name
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    SCHEMA.iter().find(|spec| spec.name == name)
}

/// Whether the named field holds a secret
pub fn is_secret(name: &str) -> bool {
    field(name).map(|spec| spec.secret).unwrap_or(false)
}
