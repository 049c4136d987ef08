//! Serde helpers that keep secrets out of dumps

use serde::Serializer;

/// Placeholder written instead of a secret value
pub const REDACTED: &str = "<redacted>";

pub fn secret<S: Serializer>(_value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(REDACTED)
}

pub fn optional_secret<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(_) => serializer.serialize_str(REDACTED),
        None => serializer.serialize_none(),
    }
}

/// Serialize a duration in its compact text form, e.g. `30m`
pub fn duration<S: Serializer>(
    value: &std::time::Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&crate::config::coercion::format_duration(*value))
}
