//! Bulk ingestion.
//!
//! Sends canonical documents to the store with `_bulk`, keyed by content id,
//! in chunks of `ES_BULK_CHUNK_SIZE`. The batch is best-effort: documents the
//! store rejects are collected as [`DocumentFailure`]s while the rest are
//! written. Only a failure to submit a chunk at all is returned as `Err`,
//! carrying the outcome of the chunks that were already written.

use osint_ingest_core::models::IndexedDocument;
use osint_ingest_core::store::{BulkAction, SearchStore, StoreError};
use thiserror::Error;
use tracing::{debug, error, info};

/// How many failures are spelled out individually in the log.
pub const TOP_FAILURES: usize = 5;

/// A document that did not make it into the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    pub id: String,
    pub index: String,
    pub error_type: String,
    pub reason: String,
    /// Item status from the store; `None` when the document was never sent.
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failures: Vec<DocumentFailure>,
}

impl BulkOutcome {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// The failures worth printing first, plus how many are left over.
    pub fn top_failures(&self) -> (&[DocumentFailure], usize) {
        let shown = self.failures.len().min(TOP_FAILURES);
        (&self.failures[..shown], self.failures.len() - shown)
    }
}

/// A chunk could not be submitted. `partial` holds what earlier chunks
/// already wrote.
#[derive(Debug, Error)]
#[error("bulk write aborted after {} document(s) were written", .partial.succeeded)]
pub struct BulkAborted {
    #[source]
    pub error: StoreError,
    pub partial: BulkOutcome,
}

fn to_action(doc: &IndexedDocument) -> Result<BulkAction, DocumentFailure> {
    serde_json::to_value(&doc.document)
        .map(|source| BulkAction {
            index: doc.index.clone(),
            id: doc.document.id.clone(),
            source,
        })
        .map_err(|e| DocumentFailure {
            id: doc.document.id.clone(),
            index: doc.index.clone(),
            error_type: "serialization_error".to_string(),
            reason: e.to_string(),
            status: None,
        })
}

/// Write `documents` to the store.
///
/// Returns the number of documents the store accepted and one failure per
/// rejected document. A transport-level failure of any chunk aborts the
/// remaining chunks; documents from chunks already sent stay written and
/// are counted in [`BulkAborted::partial`].
pub async fn ingest(
    store: &dyn SearchStore,
    documents: &[IndexedDocument],
    chunk_size: usize,
) -> Result<BulkOutcome, BulkAborted> {
    let mut outcome = BulkOutcome::default();
    let chunk_size = chunk_size.max(1);

    for (n, chunk) in documents.chunks(chunk_size).enumerate() {
        let mut actions = Vec::with_capacity(chunk.len());
        for doc in chunk {
            match to_action(doc) {
                Ok(action) => actions.push(action),
                Err(failure) => outcome.failures.push(failure),
            }
        }

        debug!("Sending bulk chunk {} ({} documents)", n + 1, actions.len());
        let results = match store.bulk_write(&actions).await {
            Ok(results) => results,
            Err(error) => {
                return Err(BulkAborted {
                    error,
                    partial: outcome,
                })
            }
        };

        for result in results {
            if result.is_success() {
                outcome.succeeded += 1;
                continue;
            }
            let (error_type, reason) = match result.error {
                Some(err) => (err.error_type, err.reason),
                None => (
                    "unknown".to_string(),
                    format!("unexpected item status {}", result.status),
                ),
            };
            outcome.failures.push(DocumentFailure {
                id: result.id,
                index: result.index,
                error_type,
                reason,
                status: Some(result.status),
            });
        }
    }

    Ok(outcome)
}

/// Log the aggregate result, the first [`TOP_FAILURES`] failures, and a count
/// of the rest.
pub fn log_outcome(outcome: &BulkOutcome) {
    if outcome.failures.is_empty() {
        info!(
            "Ingestion complete. Success: {}, Failed: 0",
            outcome.succeeded
        );
        return;
    }

    error!(
        "Bulk ingestion completed with errors. Success: {}, Failed: {}",
        outcome.succeeded,
        outcome.failed()
    );
    let (top, rest) = outcome.top_failures();
    for (i, failure) in top.iter().enumerate() {
        error!(
            "  Failed doc {} (ID: {}, index: {}): {} - {}",
            i + 1,
            failure.id,
            failure.index,
            failure.error_type,
            failure.reason
        );
    }
    if rest > 0 {
        error!("  ... and {} more errors", rest);
    }
}
