//! API key validation.
//!
//! The key is held as a [`secrecy::SecretString`], so it is redacted from
//! debug output and only read when the `Authorization` header is built.

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{AutofillerError, Result};

/// Check that `key` is usable as a bearer token before any request is made.
///
/// Rejects blank keys and keys with characters that cannot appear in an
/// HTTP header (control characters, newlines). The key itself never appears
/// in the error.
pub(crate) fn validate_api_key(key: String) -> Result<SecretString> {
    let key = SecretString::from(key);
    let exposed = key.expose_secret();

    if exposed.trim().is_empty() {
        return Err(AutofillerError::validation("API key is required"));
    }
    if HeaderValue::from_str(&format!("Bearer {}", exposed)).is_err() {
        return Err(AutofillerError::validation(
            "API key contains characters not allowed in an HTTP header",
        ));
    }

    Ok(key)
}
