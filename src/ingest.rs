//! Ingestion pipeline orchestration.
//!
//! Runs in two strictly sequenced phases:
//!
//! 1. **Plan**: walk the reports directory, name each report's index, read
//!    and normalize every raw file, and accumulate one batch of documents.
//!    Bad files are logged and skipped.
//! 2. **Write**: provision every target index, then bulk-write the batch.
//!    Documents whose index could not be provisioned are held back and
//!    reported as failures instead of being sent.
//!
//! All writes are keyed by content id, so re-running is always safe. A run
//! cut short by a transport failure still reports what it wrote, through
//! [`RunAborted`].

use anyhow::{bail, Context, Result};
use osint_ingest_core::index_name::index_for_report;
use osint_ingest_core::models::IndexedDocument;
use osint_ingest_core::normalize::{normalize, NormalizeContext, RawShape};
use osint_ingest_core::store::SearchStore;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::bulk::{self, BulkAborted, BulkOutcome, DocumentFailure};
use crate::config::IngestConfig;
use crate::provision::{ensure_indices, IndexStatus};
use crate::walker::{discover_reports, Report};

/// Error type reported for documents whose index could not be provisioned.
pub const INDEX_UNAVAILABLE: &str = "index_unavailable";

/// Everything the write phase needs, produced without touching the store.
#[derive(Debug, Default)]
pub struct IngestPlan {
    pub reports: Vec<Report>,
    pub indices: BTreeSet<String>,
    pub documents: Vec<IndexedDocument>,
    pub files_processed: usize,
    pub files_unrecognized: usize,
    pub files_failed: usize,
}

/// End-of-run counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: usize,
    pub files_processed: usize,
    pub files_unrecognized: usize,
    pub files_failed: usize,
    pub documents_attempted: usize,
    pub documents_succeeded: usize,
    pub documents_failed: usize,
    pub indices_created: usize,
    pub indices_existing: usize,
    pub indices_failed: usize,
    /// The bulk write stopped early on a transport failure.
    pub aborted: bool,
}

/// The store became unreachable during the bulk write. `summary` covers
/// everything done before that point.
#[derive(Debug, Error)]
#[error("Bulk ingestion failed")]
pub struct RunAborted {
    pub summary: RunSummary,
    #[source]
    pub source: BulkAborted,
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Walk `base_dir` and normalize every raw file into one document batch.
pub fn plan_ingest(base_dir: &Path, config: &IngestConfig) -> Result<IngestPlan> {
    info!("Scanning {} for raw data...", base_dir.display());

    let mut plan = IngestPlan {
        reports: discover_reports(base_dir)?,
        ..Default::default()
    };

    for report in &plan.reports {
        let target = index_for_report(&report.id, &config.index_prefix);
        if target.is_fallback {
            warn!(
                "Report id '{}' has no YYYYMMDD_HHMMSS prefix; using current time for index {} \
                 (reports ingested in the same second share this index)",
                report.id, target.name
            );
        }
        plan.indices.insert(target.name.clone());

        for file in &report.files {
            info!("Processing {}", file.display());
            let raw = match read_json(file) {
                Ok(raw) => raw,
                Err(e) => {
                    error!("Failed to process {}: {:#}", file.display(), e);
                    plan.files_failed += 1;
                    continue;
                }
            };

            if RawShape::detect(&raw) == RawShape::Unrecognized {
                plan.files_unrecognized += 1;
            } else {
                plan.files_processed += 1;
            }

            let ctx = NormalizeContext::new(
                &file.to_string_lossy(),
                &target.report_timestamp,
                &report.id,
            );
            plan.documents
                .extend(normalize(&raw, &ctx).into_iter().map(|document| IndexedDocument {
                    index: target.name.clone(),
                    document,
                }));
        }
    }

    Ok(plan)
}

/// Provision indices and write the planned batch.
///
/// Returns `Err` only when the bulk write could not be submitted at all; the
/// error is a [`RunAborted`] holding the counts up to that point.
pub async fn execute_plan(
    store: &dyn SearchStore,
    plan: IngestPlan,
    config: &IngestConfig,
) -> Result<(RunSummary, BulkOutcome)> {
    let statuses = ensure_indices(store, &plan.indices, &config.index_settings).await;

    let mut summary = RunSummary {
        reports: plan.reports.len(),
        files_processed: plan.files_processed,
        files_unrecognized: plan.files_unrecognized,
        files_failed: plan.files_failed,
        documents_attempted: plan.documents.len(),
        ..Default::default()
    };
    for status in statuses.values() {
        match status {
            IndexStatus::Created => summary.indices_created += 1,
            IndexStatus::Existing => summary.indices_existing += 1,
            IndexStatus::Failed { .. } => summary.indices_failed += 1,
        }
    }

    let (ready, blocked): (Vec<IndexedDocument>, Vec<IndexedDocument>) = plan
        .documents
        .into_iter()
        .partition(|doc| statuses.get(&doc.index).map(IndexStatus::is_ready).unwrap_or(false));

    if ready.is_empty() && blocked.is_empty() {
        info!("No documents found to ingest.");
        return Ok((summary, BulkOutcome::default()));
    }

    let (mut outcome, aborted) = if ready.is_empty() {
        (BulkOutcome::default(), None)
    } else {
        info!(
            "Ingesting {} documents into {} index(es)...",
            ready.len(),
            statuses.values().filter(|s| s.is_ready()).count()
        );
        match bulk::ingest(store, &ready, config.bulk_chunk_size).await {
            Ok(outcome) => (outcome, None),
            Err(e) => {
                error!("Bulk ingestion failed: {}: {}", e, e.error);
                (e.partial.clone(), Some(e))
            }
        }
    };

    if !blocked.is_empty() {
        warn!(
            "Holding back {} document(s) whose index could not be provisioned",
            blocked.len()
        );
    }
    outcome
        .failures
        .extend(blocked.into_iter().map(|doc| held_back(doc, &statuses)));

    bulk::log_outcome(&outcome);
    summary.documents_succeeded = outcome.succeeded;
    summary.documents_failed = outcome.failed();

    if let Some(source) = aborted {
        summary.aborted = true;
        return Err(RunAborted { summary, source }.into());
    }
    Ok((summary, outcome))
}

fn held_back(doc: IndexedDocument, statuses: &BTreeMap<String, IndexStatus>) -> DocumentFailure {
    let cause = match statuses.get(&doc.index) {
        Some(IndexStatus::Failed { error_type, reason }) => format!("{} - {}", error_type, reason),
        _ => "not provisioned".to_string(),
    };
    DocumentFailure {
        id: doc.document.id,
        reason: format!("index {} could not be provisioned: {}", doc.index, cause),
        index: doc.index,
        error_type: INDEX_UNAVAILABLE.to_string(),
        status: None,
    }
}

/// Full run: check the store, plan, provision, write.
///
/// An unreachable store aborts before anything is read.
pub async fn run_ingest(
    store: &dyn SearchStore,
    base_dir: &Path,
    config: &IngestConfig,
) -> Result<RunSummary> {
    if !store.ping().await {
        error!("Could not connect to Elasticsearch at {}", config.es_host);
        bail!("Could not connect to Elasticsearch at {}", config.es_host);
    }

    let plan = plan_ingest(base_dir, config)?;
    let (summary, _) = execute_plan(store, plan, config).await?;
    Ok(summary)
}

/// Print the plan produced by a dry run.
pub fn print_plan(plan: &IngestPlan) {
    println!("ingest (dry-run)");
    println!("  reports: {}", plan.reports.len());
    println!("  files processed: {}", plan.files_processed);
    println!("  files unrecognized: {}", plan.files_unrecognized);
    println!("  files failed: {}", plan.files_failed);
    println!("  documents: {}", plan.documents.len());
    for index in &plan.indices {
        let count = plan.documents.iter().filter(|d| &d.index == index).count();
        println!("  index {}: {} documents", index, count);
    }
}

/// Print the end-of-run summary.
pub fn print_summary(summary: &RunSummary) {
    println!("ingest");
    println!("  reports: {}", summary.reports);
    println!(
        "  files processed: {} (unrecognized: {}, failed: {})",
        summary.files_processed, summary.files_unrecognized, summary.files_failed
    );
    println!("  documents attempted: {}", summary.documents_attempted);
    println!("  documents succeeded: {}", summary.documents_succeeded);
    println!("  documents failed: {}", summary.documents_failed);
    println!(
        "  indices created: {} (existing: {}, failed: {})",
        summary.indices_created, summary.indices_existing, summary.indices_failed
    );
    println!("{}", if summary.aborted { "aborted" } else { "ok" });
}
