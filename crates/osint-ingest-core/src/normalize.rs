//! Schema normalization: raw provider JSON → [`CanonicalDocument`]s.
//!
//! A file's top-level value is resolved once into a [`RawShape`]; every item
//! it yields is then classified by [`CLASSIFICATION_RULES`] and projected
//! onto the canonical fields. The input is never mutated.
//!
//! # Shapes
//!
//! | Input | Shape |
//! |-------|-------|
//! | `[ {...}, {...} ]` | [`RawShape::ArrayOfItems`] |
//! | `{"articles": {"results": [ ... ]}}` | [`RawShape::WrappedArticles`] |
//! | `{ ... }` | [`RawShape::SingleItem`] |
//! | anything else | [`RawShape::Unrecognized`] |

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::identity::content_id;
use crate::models::{CanonicalDocument, DataType, SourceType};

/// Recognized top-level layouts of a raw data file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawShape<'a> {
    ArrayOfItems(&'a [Value]),
    WrappedArticles(&'a [Value]),
    SingleItem(&'a Value),
    Unrecognized,
}

impl<'a> RawShape<'a> {
    /// Resolve the shape of a raw document. Checks run in order; the first
    /// match wins.
    pub fn detect(raw: &'a Value) -> Self {
        match raw {
            Value::Array(items) => RawShape::ArrayOfItems(items),
            Value::Object(map) => match map.get("articles").and_then(|a| a.get("results")) {
                Some(Value::Array(results)) => RawShape::WrappedArticles(results),
                Some(_) => RawShape::Unrecognized,
                None => RawShape::SingleItem(raw),
            },
            _ => RawShape::Unrecognized,
        }
    }

    /// Items carried by this shape; empty when unrecognized.
    pub fn items(&self) -> &'a [Value] {
        match *self {
            RawShape::ArrayOfItems(items) | RawShape::WrappedArticles(items) => items,
            RawShape::SingleItem(item) => std::slice::from_ref(item),
            RawShape::Unrecognized => &[],
        }
    }
}

/// One entry of the provider heuristic: an item carrying every field in
/// `required_fields` is tagged with `source_type` / `data_type`.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub name: &'static str,
    pub required_fields: &'static [&'static str],
    pub source_type: SourceType,
    pub data_type: DataType,
}

impl ClassificationRule {
    pub fn matches(&self, item: &Map<String, Value>) -> bool {
        self.required_fields.iter().all(|f| item.contains_key(*f))
    }
}

/// Provider detection rules, evaluated top-down. Order matters: a news item
/// usually carries a `url` too.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "news-api",
        required_fields: &["source", "uri"],
        source_type: SourceType::News,
        data_type: DataType::Article,
    },
    ClassificationRule {
        name: "generic-web",
        required_fields: &["url"],
        source_type: SourceType::Web,
        data_type: DataType::Page,
    },
];

/// Classify an item with the given ordered rules. Non-object items and items
/// matching no rule are `(Unknown, Unknown)`.
pub fn classify_with(rules: &[ClassificationRule], item: &Value) -> (SourceType, DataType) {
    item.as_object()
        .and_then(|obj| rules.iter().find(|rule| rule.matches(obj)))
        .map(|rule| (rule.source_type, rule.data_type))
        .unwrap_or((SourceType::Unknown, DataType::Unknown))
}

/// Classify an item with [`CLASSIFICATION_RULES`].
pub fn classify(item: &Value) -> (SourceType, DataType) {
    classify_with(CLASSIFICATION_RULES, item)
}

/// Per-file provenance attached to every document normalized from it.
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    /// Path of the originating file, as discovered.
    pub source_file: String,
    /// Report timestamp (`YYYYMMDD_HHMMSS`) the target index was named after.
    pub report_timestamp: String,
    /// Name of the directory owning the `raw_data` tree.
    pub report_id: String,
    /// Ingestion time stamped on every document.
    pub ingested_at: DateTime<Utc>,
}

impl NormalizeContext {
    pub fn new(source_file: &str, report_timestamp: &str, report_id: &str) -> Self {
        Self {
            source_file: source_file.to_string(),
            report_timestamp: report_timestamp.to_string(),
            report_id: report_id.to_string(),
            ingested_at: Utc::now(),
        }
    }

    fn collection_date(&self) -> Option<String> {
        NaiveDateTime::parse_from_str(&self.report_timestamp, "%Y%m%d_%H%M%S")
            .ok()
            .map(|dt| dt.and_utc().to_rfc3339())
    }
}

/// Normalize one file's parsed content into canonical documents.
///
/// Unrecognized top-level shapes yield no documents and a warning naming the
/// file.
pub fn normalize(raw: &Value, ctx: &NormalizeContext) -> Vec<CanonicalDocument> {
    let shape = RawShape::detect(raw);
    if shape == RawShape::Unrecognized {
        warn!("Unknown JSON structure in {}", ctx.source_file);
        return Vec::new();
    }

    let timestamp = ctx.ingested_at.to_rfc3339();
    let collection_date = ctx.collection_date();

    shape
        .items()
        .iter()
        .map(|item| {
            let (source_type, data_type) = classify(item);
            CanonicalDocument {
                id: content_id(item),
                timestamp: timestamp.clone(),
                source_file: ctx.source_file.clone(),
                source_type,
                data_type,
                title: text_field(item, &["title"]),
                body: text_field(item, &["body", "content"]),
                url: text_field(item, &["url", "link"]),
                raw_source: item.clone(),
                report_id: ctx.report_id.clone(),
                collection_date: collection_date.clone(),
            }
        })
        .collect()
}

/// First key present in `item` wins, even when its value is null. Non-string
/// values are rendered as compact JSON.
fn text_field(item: &Value, keys: &[&str]) -> String {
    let Some(obj) = item.as_object() else {
        return String::new();
    };
    match keys.iter().find_map(|k| obj.get(*k)) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
