//! Search-store abstraction.
//!
//! The [`SearchStore`] trait is the whole contract the pipeline needs from
//! the search engine: liveness, index existence, index creation, and bulk
//! writes with per-item outcomes. The production backend speaks the
//! Elasticsearch HTTP API; [`memory::InMemoryStore`] backs the tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure of a store call as a whole (not of an individual bulk item).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request could not be sent or no response came back.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with an error status.
    #[error("store rejected request ({status}): {error_type} - {reason}")]
    Rejected {
        status: u16,
        error_type: String,
        reason: String,
    },

    /// The store answered but the response could not be understood.
    #[error("unreadable store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Error type string as reported by the store, or a local category.
    pub fn error_type(&self) -> &str {
        match self {
            StoreError::Transport(_) => "transport_error",
            StoreError::Rejected { error_type, .. } => error_type,
            StoreError::Decode(_) => "decode_error",
        }
    }

    pub fn reason(&self) -> String {
        match self {
            StoreError::Transport(msg) | StoreError::Decode(msg) => msg.clone(),
            StoreError::Rejected { reason, .. } => reason.clone(),
        }
    }
}

/// One document write inside a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkAction {
    pub index: String,
    pub id: String,
    pub source: Value,
}

/// Store-side error attached to a rejected bulk item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    pub error_type: String,
    pub reason: String,
}

/// Outcome of one bulk item, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemResult {
    pub index: String,
    pub id: String,
    pub status: u16,
    pub error: Option<ItemError>,
}

impl BulkItemResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

/// Abstract search-engine backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`ping`](SearchStore::ping) | Is the store reachable? |
/// | [`index_exists`](SearchStore::index_exists) | Does an index exist? |
/// | [`create_index`](SearchStore::create_index) | Create an index with settings + mappings |
/// | [`bulk_write`](SearchStore::bulk_write) | Index many documents, one result per item |
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Returns false on any failure; never errors.
    async fn ping(&self) -> bool;

    async fn index_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Create `name` with the given settings/mappings body.
    async fn create_index(&self, name: &str, body: &Value) -> Result<(), StoreError>;

    /// Write every action, keyed by `(index, id)`. An existing document with
    /// the same key is overwritten. Item-level rejections are reported in
    /// the returned results; `Err` means the batch was not processed at all.
    async fn bulk_write(&self, actions: &[BulkAction]) -> Result<Vec<BulkItemResult>, StoreError>;
}
