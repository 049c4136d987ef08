//! Standby GitHub OAuth registrations
//!
//! Extra OAuth apps for additional domains are configured as
//! `domain,client_id,secret` triples separated by `;`.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::shared::error::{ConfigError, ConfigResult};

/// OAuth client registered for one standby domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandbyOAuthConfig {
    pub domain: String,
    pub client_id: String,
    #[serde(serialize_with = "crate::shared::redact::secret")]
    pub client_secret: String,
}

/// Parse standby configs keyed by domain.
///
/// Blank entries are skipped. Every other entry must have exactly three
/// non-empty fields; a repeated domain replaces the earlier entry.
pub fn parse_standby_configs(text: &str) -> ConfigResult<BTreeMap<String, StandbyOAuthConfig>> {
    let mut configs = BTreeMap::new();

    for item in text.split(';').map(str::trim).filter(|item| !item.is_empty()) {
        let parts: Vec<&str> = item.split(',').map(str::trim).collect();
        let [domain, client_id, client_secret] = parts.as_slice() else {
            return Err(ConfigError::MalformedStandbyConfigSpec {
                fragment: item.to_string(),
                reason: format!(
                    "expected domain,client_id,secret but found {} fields",
                    parts.len()
                ),
            });
        };
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ConfigError::MalformedStandbyConfigSpec {
                fragment: item.to_string(),
                reason: "fields must not be empty".to_string(),
            });
        }

        let config = StandbyOAuthConfig {
            domain: domain.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        };
        if configs.insert(config.domain.clone(), config).is_some() {
            warn!(domain = %domain, "Standby config declared more than once, last one wins");
        }
    }

    Ok(configs)
}
