//! Service health.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{decode, parse_optional_timestamp};
use crate::error::Result;

/// API health status from `GET /health`.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatus {
    /// "healthy", "degraded", or "unhealthy"
    pub status: String,

    /// API version
    pub version: String,

    /// Server time of the check
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct WireHealth {
    status: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl HealthStatus {
    pub(crate) fn from_wire(value: Value) -> Result<Self> {
        let wire: WireHealth = decode(value, "health")?;

        Ok(Self {
            status: wire.status,
            version: wire.version.unwrap_or_else(|| "unknown".to_string()),
            timestamp: parse_optional_timestamp(wire.timestamp.as_deref(), "timestamp")?,
        })
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
