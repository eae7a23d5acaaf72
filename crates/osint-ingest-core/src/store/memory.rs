//! In-memory [`SearchStore`] implementation for tests.
//!
//! Keeps indices and documents in `HashMap`s behind `std::sync::RwLock`.
//! Bulk items are checked against the index mapping the way the real engine
//! rejects them: `date` fields must hold a date string or epoch number and
//! `keyword` / `text` fields must not hold objects. Writes to a missing
//! index are rejected instead of auto-creating it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use super::{BulkAction, BulkItemResult, ItemError, SearchStore, StoreError};
use crate::mapping::field_type;

struct StoredIndex {
    body: Value,
    docs: HashMap<String, Value>,
}

/// In-memory store for tests.
pub struct InMemoryStore {
    indices: RwLock<HashMap<String, StoredIndex>>,
    failing_creates: RwLock<HashSet<String>>,
    offline: AtomicBool,
    bulk_calls: AtomicUsize,
    bulk_call_limit: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            indices: RwLock::new(HashMap::new()),
            failing_creates: RwLock::new(HashSet::new()),
            offline: AtomicBool::new(false),
            bulk_calls: AtomicUsize::new(0),
            bulk_call_limit: AtomicUsize::new(usize::MAX),
        }
    }

    /// Make every call behave as if the store were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make `create_index(name, ..)` fail.
    pub fn fail_creation_of(&self, name: &str) {
        self.failing_creates
            .write()
            .unwrap()
            .insert(name.to_string());
    }

    /// Let `calls` more `bulk_write` calls through, then fail every later
    /// one with a transport error.
    pub fn drop_connection_after_bulk_calls(&self, calls: usize) {
        self.bulk_call_limit.store(calls, Ordering::SeqCst);
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indices.read().unwrap().contains_key(name)
    }

    pub fn index_body(&self, name: &str) -> Option<Value> {
        self.indices
            .read()
            .unwrap()
            .get(name)
            .map(|idx| idx.body.clone())
    }

    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.indices
            .read()
            .unwrap()
            .get(index)
            .and_then(|idx| idx.docs.get(id).cloned())
    }

    pub fn doc_count(&self, index: &str) -> usize {
        self.indices
            .read()
            .unwrap()
            .get(index)
            .map(|idx| idx.docs.len())
            .unwrap_or(0)
    }

    pub fn doc_ids(&self, index: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .indices
            .read()
            .unwrap()
            .get(index)
            .map(|idx| idx.docs.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Number of `bulk_write` calls received.
    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_date_value(value: &Value) -> bool {
    match value {
        Value::Null | Value::Number(_) => true,
        Value::String(s) => {
            DateTime::parse_from_rfc3339(s).is_ok()
                || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        }
        _ => false,
    }
}

/// Returns the first mapping violation in `source`, if any.
fn validate(body: &Value, id: &str, source: &Value) -> Option<ItemError> {
    let fields = source.as_object()?;
    for (field, value) in fields {
        let ok = match field_type(body, field) {
            Some("date") => is_date_value(value),
            Some("keyword") | Some("text") => !value.is_object(),
            _ => true,
        };
        if !ok {
            return Some(ItemError {
                error_type: "mapper_parsing_exception".to_string(),
                reason: format!(
                    "failed to parse field [{}] of type [{}] in document with id '{}'",
                    field,
                    field_type(body, field).unwrap_or("unknown"),
                    id
                ),
            });
        }
    }
    None
}

#[async_trait]
impl SearchStore for InMemoryStore {
    async fn ping(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }

    async fn index_exists(&self, name: &str) -> Result<bool, StoreError> {
        self.check_online()?;
        Ok(self.has_index(name))
    }

    async fn create_index(&self, name: &str, body: &Value) -> Result<(), StoreError> {
        self.check_online()?;
        if self.failing_creates.read().unwrap().contains(name) {
            return Err(StoreError::Rejected {
                status: 400,
                error_type: "illegal_argument_exception".to_string(),
                reason: format!("index [{}] cannot be created", name),
            });
        }
        let mut indices = self.indices.write().unwrap();
        if indices.contains_key(name) {
            return Err(StoreError::Rejected {
                status: 400,
                error_type: "resource_already_exists_exception".to_string(),
                reason: format!("index [{}] already exists", name),
            });
        }
        indices.insert(
            name.to_string(),
            StoredIndex {
                body: body.clone(),
                docs: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn bulk_write(&self, actions: &[BulkAction]) -> Result<Vec<BulkItemResult>, StoreError> {
        self.check_online()?;
        let limit = self.bulk_call_limit.load(Ordering::SeqCst);
        if self.bulk_calls.load(Ordering::SeqCst) >= limit {
            return Err(StoreError::Transport("connection reset".to_string()));
        }
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);

        let mut indices = self.indices.write().unwrap();
        let results = actions
            .iter()
            .map(|action| {
                let (status, error) = match indices.get_mut(&action.index) {
                    None => (
                        404,
                        Some(ItemError {
                            error_type: "index_not_found_exception".to_string(),
                            reason: format!("no such index [{}]", action.index),
                        }),
                    ),
                    Some(idx) => match validate(&idx.body, &action.id, &action.source) {
                        Some(err) => (400, Some(err)),
                        None => {
                            let previous =
                                idx.docs.insert(action.id.clone(), action.source.clone());
                            (if previous.is_some() { 200 } else { 201 }, None)
                        }
                    },
                };
                BulkItemResult {
                    index: action.index.clone(),
                    id: action.id.clone(),
                    status,
                    error,
                }
            })
            .collect();
        Ok(results)
    }
}
