//! Field mapping schema for report indices.
//!
//! Every index the pipeline creates gets the same explicit mapping, so
//! documents from different providers stay queryable with one set of field
//! types. `raw_source` is kept in `_source` only and never parsed.

use serde_json::{json, Map, Value};

pub const DATE_FIELDS: &[&str] = &["timestamp", "date", "collection_date"];

pub const KEYWORD_FIELDS: &[&str] = &[
    "source_file",
    "source_type",
    "data_type",
    "url",
    "uri",
    "source",
    "author",
    "lang",
    "sources",
    "report_id",
];

pub const TEXT_FIELDS: &[&str] = &["body", "public_statements"];

pub const ENTITY_FIELDS: &[&str] = &["person", "organization", "location", "position"];

/// Free-form objects stored as-is. `raw_source` is the only one with
/// parsing disabled.
pub const OBJECT_FIELDS: &[&str] = &[
    "metadata",
    "russian_contacts",
    "criminal_allegations",
    "intelligence_allegations",
];

/// Shard/replica settings written alongside the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSettings {
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

/// Build the `PUT /<index>` request body.
pub fn index_body(settings: &IndexSettings) -> Value {
    let mut properties = Map::new();

    for field in DATE_FIELDS {
        properties.insert(field.to_string(), json!({"type": "date"}));
    }
    for field in KEYWORD_FIELDS {
        properties.insert(field.to_string(), json!({"type": "keyword"}));
    }
    properties.insert(
        "title".to_string(),
        json!({"type": "text", "fields": {"keyword": {"type": "keyword"}}}),
    );
    for field in TEXT_FIELDS {
        properties.insert(field.to_string(), json!({"type": "text"}));
    }

    let entities: Map<String, Value> = ENTITY_FIELDS
        .iter()
        .map(|f| (f.to_string(), json!({"type": "keyword"})))
        .collect();
    properties.insert("entities".to_string(), json!({"properties": entities}));

    for field in OBJECT_FIELDS {
        properties.insert(field.to_string(), json!({"type": "object", "enabled": true}));
    }
    properties.insert(
        "raw_source".to_string(),
        json!({"type": "object", "enabled": false}),
    );

    json!({
        "mappings": {"properties": properties},
        "settings": {
            "number_of_shards": settings.number_of_shards,
            "number_of_replicas": settings.number_of_replicas,
        }
    })
}

/// Look up the declared type of a top-level property in an index body.
pub fn field_type<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.pointer(&format!("/mappings/properties/{}/type", field))
        .and_then(Value::as_str)
}
