//! Remote metadata payload parsing
//!
//! The remote source answers with a JSON object carrying a last-modified
//! timestamp. Timestamps are normalized to UTC before comparison.

use crate::types::NetworkInstant;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Naive formats accepted when the timestamp carries no offset. Interpreted
/// as UTC. `%.f` also matches a missing fraction.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Date-only timestamps mean midnight UTC.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors interpreting a fetched metadata body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PayloadError {
    /// Body is not valid JSON
    #[error("malformed JSON: {reason}")]
    MalformedJson {
        /// Parser message
        reason: String,
    },

    /// Body parsed, but the top level is not an object
    #[error("expected a JSON object, found {kind}")]
    NotAnObject {
        /// JSON kind found at the top level
        kind: String,
    },

    /// Timestamp field is absent
    #[error("missing field `{field}`")]
    MissingField {
        /// Name of the absent field
        field: String,
    },

    /// Timestamp field is present but not a string
    #[error("field `{field}` is not a string")]
    FieldNotString {
        /// Name of the offending field
        field: String,
    },

    /// Timestamp text could not be parsed
    #[error("malformed timestamp `{value}`: {reason}")]
    MalformedInstant {
        /// Text that failed to parse
        value: String,
        /// Parser message
        reason: String,
    },
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse a metadata body into its top-level JSON object.
pub fn parse_metadata(body: &str) -> Result<Map<String, Value>, PayloadError> {
    let value: Value = serde_json::from_str(body).map_err(|e| PayloadError::MalformedJson {
        reason: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(PayloadError::NotAnObject {
            kind: kind_of(&other).to_string(),
        }),
    }
}

/// Parse a timestamp into a UTC instant.
///
/// Accepts RFC 3339 with any offset, a naive ISO-8601 date-time taken to be
/// UTC already, or a bare date taken as midnight UTC.
pub fn parse_instant(text: &str) -> Result<NetworkInstant, PayloadError> {
    let text = text.trim();

    let rfc3339_err = match DateTime::parse_from_rfc3339(text) {
        Ok(dt) => return Ok(NetworkInstant::from(dt.with_timezone(&Utc))),
        Err(e) => e,
    };

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| NetworkInstant::from(naive.and_utc()))
        .ok_or_else(|| PayloadError::MalformedInstant {
            value: text.to_string(),
            reason: rfc3339_err.to_string(),
        })
}

/// Extract and parse the remote last-modified instant from a metadata body.
pub fn extract_remote_instant(body: &str, field: &str) -> Result<NetworkInstant, PayloadError> {
    let metadata = parse_metadata(body)?;

    let value = metadata
        .get(field)
        .ok_or_else(|| PayloadError::MissingField {
            field: field.to_string(),
        })?;

    let text = value.as_str().ok_or_else(|| PayloadError::FieldNotString {
        field: field.to_string(),
    })?;

    parse_instant(text)
}
