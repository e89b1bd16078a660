//! Wire payloads and the normalized client model.
//!
//! The API speaks snake_case JSON with many optional fields. Each module here
//! keeps a private `Wire*` struct that mirrors the payload and a public model
//! type with defaults applied and timestamps parsed.

pub mod domain_pack;
pub mod extraction;
pub mod health;
pub mod job;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AutofillerError, Result};

/// Decode a JSON body into a wire struct, treating shape mismatches as protocol errors.
pub(crate) fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| AutofillerError::protocol(format!("Invalid {} payload: {}", what, e)))
}

/// Parse a wire timestamp.
///
/// Accepts RFC 3339; timestamps without an offset are read as UTC.
pub(crate) fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| AutofillerError::protocol(format!("Unparsable timestamp in {}: {:?}", field, raw)))
}

pub(crate) fn parse_optional_timestamp(
    raw: Option<&str>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_timestamp(s, field)).transpose()
}
