//! Environment binding
//!
//! Loads the optional env-file and reads one raw string per schema field
//! from `<PREFIX>_<FIELD_NAME>` variables.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::schema::SCHEMA;
use crate::shared::error::{ConfigError, ConfigResult};

/// Default variable prefix
pub const ENV_PREFIX: &str = "RSSANT";

/// Raw value per field name; `None` when the variable is unset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEnvironment {
    values: BTreeMap<String, Option<String>>,
}

impl RawEnvironment {
    /// Build a raw environment from field/value pairs, mostly for tests
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Some(v.into())))
            .collect();
        Self { values }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        self.values.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(|value| value.as_deref())
    }

    /// Number of fields that were actually set
    pub fn set_count(&self) -> usize {
        self.values.values().filter(|value| value.is_some()).count()
    }
}

/// Reads schema fields from the process environment or an injected map
#[derive(Debug, Clone)]
pub struct EnvironmentBinder {
    prefix: String,
    source: Option<HashMap<String, String>>,
}

impl EnvironmentBinder {
    /// Create a binder that reads the process environment
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            source: None,
        }
    }

    /// Read variables from `vars` instead of the process environment.
    ///
    /// Env-file entries are merged into this map rather than into the
    /// process environment.
    pub fn with_source(mut self, vars: HashMap<String, String>) -> Self {
        self.source = Some(vars);
        self
    }

    /// Variable name bound to a field
    pub fn env_key(&self, field: &str) -> String {
        format!("{}_{}", self.prefix, field).to_uppercase()
    }

    /// Variable naming the env-file to preload
    pub fn env_file_key(&self) -> String {
        self.env_key("config")
    }

    /// Load the env-file (if any) and read every schema field
    pub fn bind(&mut self) -> ConfigResult<RawEnvironment> {
        if let Some(path) = self.env_file_path() {
            self.load_env_file(&path)?;
        }

        // Only exact upper-case names bind; `Environment` alone matches any case.
        let vars: config::Map<String, String> = SCHEMA
            .iter()
            .filter_map(|spec| {
                let key = self.env_key(spec.name);
                self.lookup(&key).map(|value| (key, value))
            })
            .collect();
        let environment = config::Environment::with_prefix(&self.prefix).source(Some(vars));
        let settings = config::Config::builder().add_source(environment).build()?;

        let mut raw = RawEnvironment::default();
        for spec in SCHEMA {
            let value = match settings.get_string(spec.name) {
                Ok(value) => Some(value),
                Err(config::ConfigError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            };
            raw.insert(spec.name, value);
        }

        debug!(prefix = %self.prefix, set = raw.set_count(), "Bound environment variables");
        Ok(raw)
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match &self.source {
            Some(source) => source.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
    }

    fn env_file_path(&self) -> Option<PathBuf> {
        let raw = self.lookup(&self.env_file_key())?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let expanded = match (raw.strip_prefix("~/"), self.lookup("HOME")) {
            (Some(rest), Some(home)) => Path::new(&home).join(rest),
            _ => PathBuf::from(raw),
        };
        Some(std::path::absolute(&expanded).unwrap_or(expanded))
    }

    /// Merge `KEY=VALUE` lines without overwriting variables already set
    // `from_path` only writes the process environment, an injected map needs the iterator.
    #[allow(deprecated)]
    fn load_env_file(&mut self, path: &Path) -> ConfigResult<()> {
        info!(path = %path.display(), "Loading env file");
        let env_file_error = |source| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        };

        match &mut self.source {
            Some(source) => {
                for item in dotenv::from_path_iter(path).map_err(env_file_error)? {
                    let (key, value) = item.map_err(env_file_error)?;
                    source.entry(key).or_insert(value);
                }
            }
            None => dotenv::from_path(path).map_err(env_file_error)?,
        }

        Ok(())
    }
}

impl Default for EnvironmentBinder {
    fn default() -> Self {
        Self::new(ENV_PREFIX)
    }
}
