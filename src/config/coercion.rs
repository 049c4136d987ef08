//! Field coercion
//!
//! Turns raw environment strings into typed values according to the
//! declared [`FieldKind`], applying per-field constraints.

use std::collections::BTreeMap;
use std::time::Duration;

use url::Url;
use validator::{ValidateEmail, ValidateUrl};

use super::binder::RawEnvironment;
use super::schema::{FieldDefault, FieldKind, FieldSpec, SCHEMA};
use crate::shared::error::{ConfigError, ConfigResult};
use crate::shared::redact::REDACTED;

/// Typed value of a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Duration(Duration),
    Str(String),
}

/// Parses a boolean token.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "y", "n", "on", "off"
/// (case-insensitive).
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a compact human duration.
///
/// Supports "30s", "5m", "1h", "2d", combinations like "1h30m", decimal
/// magnitudes like "1.5h", and a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    if let Ok(seconds) = input.parse::<f64>() {
        return seconds_to_duration(seconds);
    }

    let mut total = 0f64;
    let mut number = String::new();
    for c in input.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            unit => {
                let factor = match unit.to_ascii_lowercase() {
                    'd' => 86_400.0,
                    'h' => 3_600.0,
                    'm' => 60.0,
                    's' => 1.0,
                    _ => return Err(format!("unknown duration unit '{}'", unit)),
                };
                let value: f64 = number
                    .parse()
                    .map_err(|_| format!("missing number before '{}'", unit))?;
                total += value * factor;
                number.clear();
            }
        }
    }
    if !number.is_empty() {
        return Err(format!("missing unit after '{}'", number));
    }

    seconds_to_duration(total)
}

fn seconds_to_duration(seconds: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid duration: {}", e))
}

/// Render a duration in the compact form accepted by [`parse_duration`]
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    let nanos = duration.subsec_nanos();
    let mut out = String::new();

    for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }

    if nanos > 0 {
        let fraction = format!("{:09}", nanos);
        out.push_str(&format!("{}.{}s", secs, fraction.trim_end_matches('0')));
    } else if secs > 0 || out.is_empty() {
        out.push_str(&format!("{}s", secs));
    }

    out
}

/// Coerce one raw string according to its field declaration
pub fn coerce(spec: &FieldSpec, raw: &str) -> ConfigResult<FieldValue> {
    let value = raw.trim();
    match spec.kind {
        FieldKind::Bool => parse_bool(value)
            .map(FieldValue::Bool)
            .ok_or_else(|| coercion_error(spec, raw)),
        FieldKind::Int { min, max } => {
            let number: i64 = value.parse().map_err(|_| coercion_error(spec, raw))?;
            if let Some(min) = min {
                if number < min {
                    return Err(constraint_error(spec, format!("must be at least {}", min)));
                }
            }
            if let Some(max) = max {
                if number > max {
                    return Err(constraint_error(spec, format!("must be at most {}", max)));
                }
            }
            Ok(FieldValue::Int(number))
        }
        FieldKind::Duration { min } => {
            let duration = parse_duration(value).map_err(|_| coercion_error(spec, raw))?;
            if let Some(min) = min {
                if duration < min {
                    return Err(constraint_error(
                        spec,
                        format!("must be at least {}", format_duration(min)),
                    ));
                }
            }
            Ok(FieldValue::Duration(duration))
        }
        FieldKind::Str => Ok(FieldValue::Str(raw.to_string())),
        FieldKind::Enum(values) => {
            if values.contains(&value) {
                Ok(FieldValue::Str(value.to_string()))
            } else {
                Err(constraint_error(
                    spec,
                    format!("must be one of {}", values.join(", ")),
                ))
            }
        }
        FieldKind::Url { schemes } => {
            if !value.validate_url() {
                return Err(coercion_error(spec, raw));
            }
            let parsed = Url::parse(value).map_err(|_| coercion_error(spec, raw))?;
            if !schemes.contains(&parsed.scheme()) {
                return Err(constraint_error(
                    spec,
                    format!(
                        "scheme {:?} not allowed, expected {}",
                        parsed.scheme(),
                        schemes.join("/")
                    ),
                ));
            }
            Ok(FieldValue::Str(value.to_string()))
        }
        FieldKind::Email => {
            if value.validate_email() {
                Ok(FieldValue::Str(value.to_string()))
            } else {
                Err(coercion_error(spec, raw))
            }
        }
    }
}

fn coercion_error(spec: &FieldSpec, raw: &str) -> ConfigError {
    ConfigError::TypeCoercion {
        field: spec.name.to_string(),
        expected: spec.kind.expected(),
        value: if spec.secret { REDACTED.to_string() } else { raw.to_string() },
    }
}

fn constraint_error(spec: &FieldSpec, reason: String) -> ConfigError {
    ConfigError::ConstraintViolation {
        field: spec.name.to_string(),
        reason,
    }
}

/// Typed values for every schema field; `None` marks an absent optional field
#[derive(Debug, Clone, Default)]
pub struct ValidatedFields {
    values: BTreeMap<&'static str, Option<FieldValue>>,
}

impl ValidatedFields {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name).and_then(|value| value.as_ref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn take(&mut self, name: &str) -> Option<FieldValue> {
        self.values.get_mut(name).and_then(Option::take)
    }

    fn mismatch(name: &str, expected: &str) -> ConfigError {
        ConfigError::TypeCoercion {
            field: name.to_string(),
            expected: expected.to_string(),
            value: "a value of another kind".to_string(),
        }
    }

    fn missing(name: &str) -> ConfigError {
        ConfigError::MissingRequiredField {
            field: name.to_string(),
        }
    }

    pub fn take_bool(&mut self, name: &str) -> ConfigResult<bool> {
        match self.take(name) {
            Some(FieldValue::Bool(value)) => Ok(value),
            Some(_) => Err(Self::mismatch(name, "a boolean")),
            None => Err(Self::missing(name)),
        }
    }

    pub fn take_opt_int(&mut self, name: &str) -> ConfigResult<Option<i64>> {
        match self.take(name) {
            Some(FieldValue::Int(value)) => Ok(Some(value)),
            Some(_) => Err(Self::mismatch(name, "an integer")),
            None => Ok(None),
        }
    }

    /// Take an integer and narrow it to the target type
    pub fn take_int<T: TryFrom<i64>>(&mut self, name: &str) -> ConfigResult<T> {
        let value = self.take_opt_int(name)?.ok_or_else(|| Self::missing(name))?;
        T::try_from(value).map_err(|_| ConfigError::ConstraintViolation {
            field: name.to_string(),
            reason: format!("{} is out of range", value),
        })
    }

    pub fn take_duration(&mut self, name: &str) -> ConfigResult<Duration> {
        match self.take(name) {
            Some(FieldValue::Duration(value)) => Ok(value),
            Some(_) => Err(Self::mismatch(name, "a duration")),
            None => Err(Self::missing(name)),
        }
    }

    pub fn take_opt_str(&mut self, name: &str) -> ConfigResult<Option<String>> {
        match self.take(name) {
            Some(FieldValue::Str(value)) => Ok(Some(value)),
            Some(_) => Err(Self::mismatch(name, "a string")),
            None => Ok(None),
        }
    }

    pub fn take_str(&mut self, name: &str) -> ConfigResult<String> {
        self.take_opt_str(name)?.ok_or_else(|| Self::missing(name))
    }
}

/// Validator that applies the schema to a raw environment
pub struct FieldValidator;

impl FieldValidator {
    /// Coerce every schema field, failing on the first invalid one
    pub fn validate(raw: &RawEnvironment) -> ConfigResult<ValidatedFields> {
        let mut fields = ValidatedFields::default();
        for spec in SCHEMA {
            let value = Self::validate_field(spec, raw.get(spec.name))?;
            fields.values.insert(spec.name, value);
        }
        Ok(fields)
    }

    /// Resolve a single field, substituting its default when unset
    pub fn validate_field(spec: &FieldSpec, raw: Option<&str>) -> ConfigResult<Option<FieldValue>> {
        match raw.filter(|value| !value.trim().is_empty()) {
            Some(value) => coerce(spec, value).map(Some),
            None => match spec.default {
                FieldDefault::Value(literal) => coerce(spec, literal).map(Some),
                FieldDefault::Optional => Ok(None),
                FieldDefault::Required => Err(ConfigError::MissingRequiredField {
                    field: spec.name.to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::field;

    fn spec(name: &str) -> &'static FieldSpec {
        field(name).unwrap()
    }

    #[test]
    fn parse_bool_values() {
        for token in ["true", "TRUE", "1", "yes", "y", "on"] {
            assert_eq!(parse_bool(token), Some(true), "{}", token);
        }
        for token in ["false", "False", "0", "no", "n", "off"] {
            assert_eq!(parse_bool(token), Some(false), "{}", token);
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(172_800));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("0.25").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("10m5").is_err());
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn duration_round_trip() {
        for text in ["5s", "30m", "1h", "1d", "1h30m", "2d3h4m5s", "1.5s", "0s"] {
            let parsed = parse_duration(text).unwrap();
            let formatted = format_duration(parsed);
            assert_eq!(parse_duration(&formatted).unwrap(), parsed, "{} -> {}", text, formatted);
        }
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn coerce_int_ranges() {
        assert_eq!(coerce(spec("pg_port"), "5433").unwrap(), FieldValue::Int(5433));
        assert_eq!(coerce(spec("pg_port"), " 5433 ").unwrap(), FieldValue::Int(5433));

        let err = coerce(spec("scheduler_num_worker"), "0").unwrap_err();
        assert!(matches!(err, ConfigError::ConstraintViolation { .. }));
        assert!(err.to_string().contains("at least 1"));

        let err = coerce(spec("pg_port"), "70000").unwrap_err();
        assert!(err.to_string().contains("at most 65535"));

        let err = coerce(spec("pg_port"), "abc").unwrap_err();
        assert!(matches!(err, ConfigError::TypeCoercion { .. }));
    }

    #[test]
    fn coerce_duration_minimum() {
        let expires = spec("image_token_expires");
        assert_eq!(
            coerce(expires, "1h").unwrap(),
            FieldValue::Duration(Duration::from_secs(3600))
        );
        let err = coerce(expires, "0.5s").unwrap_err();
        assert!(matches!(err, ConfigError::ConstraintViolation { .. }));
    }

    #[test]
    fn coerce_enum_membership() {
        assert_eq!(
            coerce(spec("role"), "worker").unwrap(),
            FieldValue::Str("worker".to_string())
        );
        let err = coerce(spec("role"), "Worker").unwrap_err();
        assert!(err.to_string().contains("one of api, worker, scheduler, asyncapi"));
    }

    #[test]
    fn coerce_url_schemes() {
        assert!(coerce(spec("root_url"), "https://rss.example.com").is_ok());
        assert!(coerce(spec("root_url"), "not a url").is_err());

        let err = coerce(spec("root_url"), "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::ConstraintViolation { .. }));

        assert!(coerce(spec("proxy_url"), "socks5://127.0.0.1:1080").is_ok());
        assert!(coerce(spec("rss_proxy_url"), "socks5://127.0.0.1:1080").is_err());
    }

    #[test]
    fn coerce_email() {
        assert!(coerce(spec("admin_email"), "ops@example.com").is_ok());
        let err = coerce(spec("admin_email"), "ops-at-example").unwrap_err();
        assert!(matches!(err, ConfigError::TypeCoercion { .. }));
    }

    #[test]
    fn coerce_error_hides_secret_values() {
        let spec = FieldSpec {
            name: "token",
            kind: FieldKind::Int { min: None, max: None },
            default: FieldDefault::Optional,
            secret: true,
            description: "",
        };
        let err = coerce(&spec, "hunter2").unwrap_err();
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn validate_field_defaults() {
        assert_eq!(
            FieldValidator::validate_field(spec("pg_host"), None).unwrap(),
            Some(FieldValue::Str("localhost".to_string()))
        );
        assert_eq!(FieldValidator::validate_field(spec("smtp_host"), None).unwrap(), None);
        assert_eq!(FieldValidator::validate_field(spec("smtp_host"), Some("")).unwrap(), None);
        assert_eq!(
            FieldValidator::validate_field(spec("debug"), Some("  ")).unwrap(),
            Some(FieldValue::Bool(false))
        );
    }

    #[test]
    fn validate_field_required() {
        let spec = FieldSpec {
            name: "must_have",
            kind: FieldKind::Str,
            default: FieldDefault::Required,
            secret: false,
            description: "",
        };
        let err = FieldValidator::validate_field(&spec, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredField { .. }));
    }

    #[test]
    fn validate_all_defaults() {
        let fields = FieldValidator::validate(&RawEnvironment::default()).unwrap();
        assert_eq!(fields.len(), SCHEMA.len());
        assert_eq!(fields.get("image_proxy_enable"), Some(&FieldValue::Bool(true)));
        assert_eq!(fields.get("service_secret"), None);
    }

    #[test]
    fn validate_is_all_or_nothing() {
        let raw = RawEnvironment::from_pairs([("debug", "true"), ("check_feed_minutes", "zero")]);
        let err = FieldValidator::validate(&raw).unwrap_err();
        assert_eq!(err.field(), Some("check_feed_minutes"));
    }

    #[test]
    fn take_int_narrows() {
        let raw = RawEnvironment::from_pairs([("pg_port", "6543")]);
        let mut fields = FieldValidator::validate(&raw).unwrap();
        let port: u16 = fields.take_int("pg_port").unwrap();
        assert_eq!(port, 6543);
        assert!(fields.take_int::<u16>("pg_port").is_err());
        assert!(fields.take_bool("pg_host").is_err());
    }
}
