//! Index provisioning.
//!
//! Makes sure every target index exists with the report mapping before any
//! document is written. Failures are logged and reported back per index; they
//! never abort provisioning of the remaining indices.

use osint_ingest_core::mapping::{index_body, IndexSettings};
use osint_ingest_core::store::{SearchStore, StoreError};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{error, info};

/// What happened to one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    Existing,
    Created,
    Failed { error_type: String, reason: String },
}

impl IndexStatus {
    pub fn is_ready(&self) -> bool {
        !matches!(self, IndexStatus::Failed { .. })
    }
}

impl From<&StoreError> for IndexStatus {
    fn from(err: &StoreError) -> Self {
        IndexStatus::Failed {
            error_type: err.error_type().to_string(),
            reason: err.reason(),
        }
    }
}

/// Ensure `name` exists, creating it with the report mapping if needed.
pub async fn ensure_index(
    store: &dyn SearchStore,
    name: &str,
    settings: &IndexSettings,
) -> IndexStatus {
    match store.index_exists(name).await {
        Ok(true) => {
            info!("Index {} already exists", name);
            return IndexStatus::Existing;
        }
        Ok(false) => {}
        Err(e) => {
            error!("Failed to check index {}: {}", name, e);
            return IndexStatus::from(&e);
        }
    }

    match store.create_index(name, &index_body(settings)).await {
        Ok(()) => {
            info!("Created index {} with mappings", name);
            IndexStatus::Created
        }
        Err(e) => {
            error!("Failed to create index {}: {}", name, e);
            IndexStatus::from(&e)
        }
    }
}

/// Ensure every index in `names`, in name order.
pub async fn ensure_indices(
    store: &dyn SearchStore,
    names: &BTreeSet<String>,
    settings: &IndexSettings,
) -> BTreeMap<String, IndexStatus> {
    let mut statuses = BTreeMap::new();
    for name in names {
        let status = ensure_index(store, name, settings).await;
        statuses.insert(name.clone(), status);
    }
    statuses
}
