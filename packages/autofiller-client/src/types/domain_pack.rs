//! Domain pack metadata.
//!
//! Read-only reference data; the client fetches it on demand and never caches it.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::decode;
use crate::error::Result;

/// Server-side configuration selecting which fields to extract for a document type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DomainPack {
    /// Pack identifier, e.g. "invoice-standard"
    pub name: String,

    pub version: String,

    #[serde(default)]
    pub description: String,

    /// JSON Schema for the extracted data
    #[serde(default)]
    pub schema: Value,

    /// Hints used by auto-routing
    #[serde(default)]
    pub routing: Option<RoutingHints>,

    /// File formats the pack accepts (e.g. "pdf", "png")
    #[serde(default)]
    pub supported_formats: Option<Vec<String>>,
}

/// Keyword and anchor lists used to route a document to this pack.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RoutingHints {
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub anchors: Vec<String>,

    /// Any other named hint lists
    #[serde(flatten)]
    pub other: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct WireDomainPackList {
    #[serde(default)]
    items: Vec<DomainPack>,
}

impl DomainPack {
    pub(crate) fn from_wire(value: Value) -> Result<Self> {
        decode(value, "domain pack")
    }

    pub(crate) fn list_from_wire(value: Value) -> Result<Vec<Self>> {
        let list: WireDomainPackList = decode(value, "domain pack list")?;
        Ok(list.items)
    }

    /// Field names declared at the top level of the schema.
    pub fn field_names(&self) -> Vec<&str> {
        self.schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether the pack accepts files with this extension (case-insensitive).
    ///
    /// Packs that don't declare formats accept everything.
    pub fn supports_format(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.');
        match &self.supported_formats {
            Some(formats) => formats.iter().any(|f| f.eq_ignore_ascii_case(ext)),
            None => true,
        }
    }
}
