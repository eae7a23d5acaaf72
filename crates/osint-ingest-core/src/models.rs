//! Core data models shared by the normalizer, the store, and the ingestor.
//!
//! Raw provider items stay as [`serde_json::Value`]; everything written to
//! the index goes through [`CanonicalDocument`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse provider family a raw item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    News,
    Web,
    Unknown,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::News => "news",
            SourceType::Web => "web",
            SourceType::Unknown => "unknown",
        }
    }
}

/// Kind of content a raw item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Article,
    Page,
    Unknown,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Article => "article",
            DataType::Page => "page",
            DataType::Unknown => "unknown",
        }
    }
}

/// Normalized document written to the search index.
///
/// `id` is the content hash of `raw_source` and is sent as the bulk `_id`,
/// never as part of the document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    #[serde(skip)]
    pub id: String,
    pub timestamp: String,
    pub source_file: String,
    pub source_type: SourceType,
    pub data_type: DataType,
    pub title: String,
    pub body: String,
    pub url: String,
    pub raw_source: Value,
    pub report_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_date: Option<String>,
}

/// A canonical document paired with the index it is destined for.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    pub index: String,
    pub document: CanonicalDocument,
}
