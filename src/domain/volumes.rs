//! Story volume routing
//!
//! Story records are sharded across volumes, each a postgres table that may
//! live on its own server. Volumes are configured with a compact text spec:
//!
//! ```text
//! {volume}:{user}:{password}@{host}:{port}/{db}/{table}
//! {volume}:{table}
//! ```
//!
//! Entries are comma separated. The short form borrows the connection of the
//! primary database.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::shared::error::{ConfigError, ConfigResult};

/// Table name of the volume used when no spec is configured
pub const DEFAULT_VOLUME_TABLE: &str = "story_volume_0";

static FULL_VOLUME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):([^:@/]+):([^:@/]+)@([^:@/]+):(\d+)/([^:@/]+)/([^:@/]+)$")
        .expect("full volume pattern is valid")
});

static SIMPLE_VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):([^:@/]+)$").expect("simple volume pattern is valid"));

/// Connection and table of one story volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageVolumeRecord {
    pub volume: u32,
    pub user: String,
    #[serde(serialize_with = "crate::shared::redact::secret")]
    pub password: String,
    pub host: String,
    pub port: u16,
    pub db: String,
    pub table: String,
}

impl StorageVolumeRecord {
    /// Volume 0 on the primary database
    pub fn primary(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        db: impl Into<String>,
    ) -> Self {
        Self {
            volume: 0,
            user: user.into(),
            password: password.into(),
            host: host.into(),
            port,
            db: db.into(),
            table: DEFAULT_VOLUME_TABLE.to_string(),
        }
    }

    /// Same connection, different volume and table
    pub fn with_table(&self, volume: u32, table: impl Into<String>) -> Self {
        Self {
            volume,
            table: table.into(),
            ..self.clone()
        }
    }
}

/// Parse a volume spec into records keyed by volume index.
///
/// Blank text yields the default record as volume 0. A malformed entry fails
/// the whole spec. A repeated index replaces the earlier entry.
pub fn parse_volumes(
    text: &str,
    default_record: &StorageVolumeRecord,
) -> ConfigResult<BTreeMap<u32, StorageVolumeRecord>> {
    let mut volumes = BTreeMap::new();

    if text.trim().is_empty() {
        volumes.insert(0, default_record.with_table(0, DEFAULT_VOLUME_TABLE));
        return Ok(volumes);
    }

    for part in text.split(',') {
        let record = parse_entry(part.trim(), default_record)?;
        if volumes.contains_key(&record.volume) {
            warn!(volume = record.volume, "Story volume declared more than once, last one wins");
        }
        volumes.insert(record.volume, record);
    }

    Ok(volumes)
}

fn parse_entry(
    part: &str,
    default_record: &StorageVolumeRecord,
) -> ConfigResult<StorageVolumeRecord> {
    let malformed = |reason: &str| ConfigError::MalformedVolumeSpec {
        fragment: part.to_string(),
        reason: reason.to_string(),
    };

    if let Some(caps) = FULL_VOLUME.captures(part) {
        let port: u16 = caps[5]
            .parse()
            .map_err(|_| malformed("port must be between 1 and 65535"))?;
        if port == 0 {
            return Err(malformed("port must be between 1 and 65535"));
        }
        return Ok(StorageVolumeRecord {
            volume: parse_index(&caps[1]).ok_or_else(|| malformed("volume index out of range"))?,
            user: caps[2].to_string(),
            password: caps[3].to_string(),
            host: caps[4].to_string(),
            port,
            db: caps[6].to_string(),
            table: caps[7].to_string(),
        });
    }

    if let Some(caps) = SIMPLE_VOLUME.captures(part) {
        let volume = parse_index(&caps[1]).ok_or_else(|| malformed("volume index out of range"))?;
        return Ok(default_record.with_table(volume, &caps[2]));
    }

    Err(malformed(
        "expected {volume}:{table} or {volume}:{user}:{password}@{host}:{port}/{db}/{table}",
    ))
}

fn parse_index(text: &str) -> Option<u32> {
    text.parse().ok()
}
