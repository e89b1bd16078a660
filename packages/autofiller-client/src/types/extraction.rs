//! Extraction results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::{decode, parse_optional_timestamp};
use crate::error::Result;

/// Outcome of a finished extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Every field in the schema was attempted
    Completed,
    /// Some fields could not be extracted; see warnings
    Partial,
}

/// Location of an extracted field on the page.
///
/// Coordinates are normalized to 0-1 relative to the page size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// 1-indexed page number
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Metadata about how a document was processed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMetadata {
    /// Total pages in the document. Default: 0.
    pub pages: u32,

    /// Server-side processing time. Default: 0.
    pub processing_time_ms: u64,

    /// Model version used. Default: "unknown".
    pub model_version: String,

    /// When the extraction was created
    pub created_at: Option<DateTime<Utc>>,
}

impl Default for ExtractionMetadata {
    fn default() -> Self {
        Self {
            pages: 0,
            processing_time_ms: 0,
            model_version: "unknown".to_string(),
            created_at: None,
        }
    }
}

/// Result of a document extraction.
///
/// Produced once per successful `extract` call or completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// Unique extraction ID
    pub id: String,

    pub status: ExtractionStatus,

    /// Domain pack used (may have been chosen by auto-routing)
    pub domain_pack: String,

    /// Extracted fields. Shape depends on the domain pack.
    pub data: Map<String, Value>,

    /// Per-field confidence (0.0 to 1.0)
    pub confidence: Option<HashMap<String, f64>>,

    /// Per-field bounding boxes
    pub bounding_boxes: Option<HashMap<String, BoundingBox>>,

    pub metadata: ExtractionMetadata,

    /// Non-fatal warnings reported by the server
    pub warnings: Option<Vec<String>>,
}

impl ExtractionResult {
    /// Look up an extracted field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Confidence for a field, if confidence scores were requested.
    pub fn confidence_for(&self, name: &str) -> Option<f64> {
        self.confidence.as_ref()?.get(name).copied()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings.as_ref().is_some_and(|w| !w.is_empty())
    }

    /// Normalize an extraction payload from the API.
    pub(crate) fn from_wire(value: Value) -> Result<Self> {
        let wire: WireExtractionResult = decode(value, "extraction result")?;
        wire.normalize()
    }
}

#[derive(Debug, Deserialize)]
struct WireExtractionResult {
    id: String,
    status: ExtractionStatus,
    domain_pack: String,
    data: Map<String, Value>,
    #[serde(default)]
    confidence: Option<HashMap<String, f64>>,
    #[serde(default)]
    bounding_boxes: Option<HashMap<String, BoundingBox>>,
    #[serde(default)]
    metadata: Option<WireMetadata>,
    #[serde(default)]
    warnings: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    pages: Option<u32>,
    #[serde(default)]
    processing_time_ms: Option<u64>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl WireExtractionResult {
    fn normalize(self) -> Result<ExtractionResult> {
        let wire_meta = self.metadata.unwrap_or_default();
        let defaults = ExtractionMetadata::default();

        let metadata = ExtractionMetadata {
            pages: wire_meta.pages.unwrap_or(defaults.pages),
            processing_time_ms: wire_meta
                .processing_time_ms
                .unwrap_or(defaults.processing_time_ms),
            model_version: wire_meta.model_version.unwrap_or(defaults.model_version),
            created_at: parse_optional_timestamp(
                wire_meta.created_at.as_deref(),
                "metadata.created_at",
            )?,
        };

        Ok(ExtractionResult {
            id: self.id,
            status: self.status,
            domain_pack: self.domain_pack,
            data: self.data,
            confidence: self.confidence,
            bounding_boxes: self.bounding_boxes,
            metadata,
            warnings: self.warnings,
        })
    }
}
