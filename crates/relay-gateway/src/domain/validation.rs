//! Request schema validation.
//!
//! Maps a decoded payload onto [`Request`], checking presence, type and value
//! constraints of every field. All failures are collected, not just the first.
//! Unknown extra fields are ignored.

use crate::domain::request::{QueryType, Request, DEFAULT_VRF};
use serde_json::{Map, Value};
use std::fmt;
use std::net::IpAddr;

/// Maximum target length in characters
const MAX_TARGET_LEN: usize = 256;

/// Maximum VRF name length
const MAX_VRF_LEN: usize = 64;

/// Well-known BGP community names (RFC 1997, RFC 3765, RFC 7999)
const WELL_KNOWN_COMMUNITIES: &[&str] = &[
    "no-export",
    "no-advertise",
    "no-export-subconfed",
    "no-peer",
    "blackhole",
];

/// One failed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    errors: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether `field` is among the failures
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed: ")?;
        for (idx, err) in self.errors.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Validate a decoded payload into a [`Request`].
pub fn validate(payload: &Value) -> Result<Request, ValidationFailure> {
    let Some(obj) = payload.as_object() else {
        return Err(ValidationFailure {
            errors: vec![FieldError::new("payload", "expected an object")],
        });
    };

    let mut errors = Vec::new();

    let query_type = match string_field(obj, "query_type", &mut errors) {
        Some(raw) => match raw.parse::<QueryType>() {
            Ok(q) => Some(q),
            Err(()) => {
                errors.push(FieldError::new(
                    "query_type",
                    format!("unsupported query type `{}`", raw),
                ));
                None
            }
        },
        None => None,
    };

    let vrf = match optional_string_field(obj, "vrf", &mut errors) {
        Some(raw) => {
            if is_valid_vrf(raw) {
                Some(raw.to_string())
            } else {
                errors.push(FieldError::new("vrf", "invalid vrf name"));
                None
            }
        }
        None => Some(DEFAULT_VRF.to_string()),
    };

    let target = match string_field(obj, "target", &mut errors) {
        Some(raw) if raw.trim().is_empty() => {
            errors.push(FieldError::new("target", "must not be empty"));
            None
        }
        Some(raw) if raw.chars().count() > MAX_TARGET_LEN => {
            errors.push(FieldError::new(
                "target",
                format!("must be at most {} characters", MAX_TARGET_LEN),
            ));
            None
        }
        Some(raw) => Some(raw.to_string()),
        None => None,
    };

    let source = match optional_string_field(obj, "source", &mut errors) {
        Some(raw) => match raw.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                errors.push(FieldError::new("source", "invalid address format"));
                None
            }
        },
        None => None,
    };
    let source_given = !matches!(obj.get("source"), None | Some(Value::Null));

    // Constraints that depend on the query type
    if let (Some(query_type), Some(target)) = (query_type, target.as_deref()) {
        if let Err(message) = check_target(query_type, target) {
            errors.push(FieldError::new("target", message));
        }
    }
    if let Some(query_type) = query_type {
        if source_given && !query_type.accepts_source() {
            errors.push(FieldError::new(
                "source",
                format!("not allowed for {}", query_type),
            ));
        }
    }
    if let (Some(source), Some(target)) = (source, target.as_deref()) {
        if let Ok(target_ip) = target.parse::<IpAddr>() {
            if source.is_ipv4() != target_ip.is_ipv4() {
                errors.push(FieldError::new(
                    "source",
                    "address family does not match target",
                ));
            }
        }
    }

    match (query_type, vrf, target) {
        (Some(query_type), Some(vrf), Some(target)) if errors.is_empty() => {
            Ok(Request::new_unchecked(query_type, vrf, target, source))
        }
        _ => Err(ValidationFailure { errors }),
    }
}

/// Required string field
fn string_field<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, "field required"));
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            errors.push(FieldError::new(field, "expected a string"));
            None
        }
    }
}

/// Optional string field; `null` counts as absent
fn optional_string_field<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            errors.push(FieldError::new(field, "expected a string"));
            None
        }
    }
}

fn check_target(query_type: QueryType, target: &str) -> Result<(), &'static str> {
    match query_type {
        QueryType::Ping | QueryType::Traceroute => target
            .parse::<IpAddr>()
            .map(|_| ())
            .map_err(|_| "invalid address format"),
        QueryType::BgpRoute => {
            if is_ip_or_prefix(target) {
                Ok(())
            } else {
                Err("invalid address format")
            }
        }
        QueryType::BgpCommunity => {
            if is_community(target) {
                Ok(())
            } else {
                Err("invalid community format")
            }
        }
        QueryType::BgpAspath => {
            if is_aspath_pattern(target) {
                Ok(())
            } else {
                Err("invalid as-path pattern")
            }
        }
    }
}

fn is_valid_vrf(vrf: &str) -> bool {
    !vrf.is_empty()
        && vrf.len() <= MAX_VRF_LEN
        && vrf
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

fn is_ip_or_prefix(target: &str) -> bool {
    match target.split_once('/') {
        None => target.parse::<IpAddr>().is_ok(),
        Some((addr, len)) => {
            let Ok(ip) = addr.parse::<IpAddr>() else {
                return false;
            };
            if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
                return false;
            }
            let max = if ip.is_ipv4() { 32 } else { 128 };
            len.parse::<u8>().map(|l| l <= max).unwrap_or(false)
        }
    }
}

fn is_community(target: &str) -> bool {
    if WELL_KNOWN_COMMUNITIES.contains(&target) {
        return true;
    }
    let parts: Vec<&str> = target.split(':').collect();
    let all_digits = parts
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    if !all_digits {
        return false;
    }
    match parts.len() {
        // Standard community ASN:VALUE
        2 => parts.iter().all(|p| p.parse::<u16>().is_ok()),
        // Large community GLOBAL:LOCAL1:LOCAL2
        3 => parts.iter().all(|p| p.parse::<u32>().is_ok()),
        _ => false,
    }
}

fn is_aspath_pattern(target: &str) -> bool {
    target.len() <= MAX_TARGET_LEN
        && target.chars().any(|c| c.is_ascii_digit() || c == '^' || c == '$')
        && target.chars().all(|c| {
            c.is_ascii_digit()
                || matches!(
                    c,
                    '_' | '^' | '$' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '|' | ' ' | '-'
                )
        })
}
