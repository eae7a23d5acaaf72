//! Pipeline tests against the in-memory store: discovery → normalization →
//! provisioning → bulk write.

use osint_ingest::config::IngestConfig;
use osint_ingest::ingest::{
    execute_plan, plan_ingest, run_ingest, RunAborted, INDEX_UNAVAILABLE,
};
use osint_ingest_core::identity::content_id;
use osint_ingest_core::store::memory::InMemoryStore;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BERLIN: &str = "osint_20260204_110300";
const PARIS: &str = "osint_20260301_090000";

fn config() -> IngestConfig {
    IngestConfig::from_lookup(|_| None).unwrap()
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn setup() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(
        root,
        "20260204_110300_berlin_ops/raw_data/newsapi.json",
        r#"{"articles": {"results": [
            {"uri": "1", "source": {"uri": "dw.com"}, "title": "One", "body": "b1"},
            {"uri": "2", "source": {"uri": "taz.de"}, "title": "Two", "body": "b2"}
        ]}}"#,
    );
    write(
        root,
        "20260204_110300_berlin_ops/raw_data/web/pages.json",
        r#"[{"url": "https://a.example", "title": "A"}, {"link": "https://b.example", "title": "B"}]"#,
    );
    write(root, "20260204_110300_berlin_ops/raw_data/broken.json", "[1, 2");
    write(root, "20260204_110300_berlin_ops/raw_data/number.json", "42");
    write(
        root,
        "20260301_090000_paris/raw_data/profile.json",
        r#"{"title": "Profile", "content": "c"}"#,
    );
    tmp
}

#[tokio::test]
async fn test_full_run() {
    let tmp = setup();
    let store = InMemoryStore::new();

    let summary = run_ingest(&store, tmp.path(), &config()).await.unwrap();

    assert_eq!(summary.reports, 2);
    assert_eq!(summary.files_processed, 3);
    assert_eq!(summary.files_unrecognized, 1);
    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.documents_attempted, 5);
    assert_eq!(summary.documents_succeeded, 5);
    assert_eq!(summary.documents_failed, 0);
    assert_eq!(summary.indices_created, 2);

    assert_eq!(store.doc_count(BERLIN), 4);
    assert_eq!(store.doc_count(PARIS), 1);

    let item = json!({"uri": "1", "source": {"uri": "dw.com"}, "title": "One", "body": "b1"});
    let doc = store.document(BERLIN, &content_id(&item)).unwrap();
    assert_eq!(doc["source_type"], "news");
    assert_eq!(doc["data_type"], "article");
    assert_eq!(doc["report_id"], "20260204_110300_berlin_ops");
    assert_eq!(doc["raw_source"], item);
    assert_eq!(doc["collection_date"], "2026-02-04T11:03:00+00:00");
    assert!(doc["source_file"]
        .as_str()
        .unwrap()
        .ends_with("raw_data/newsapi.json"));

    let link_item = json!({"link": "https://b.example", "title": "B"});
    let doc = store.document(BERLIN, &content_id(&link_item)).unwrap();
    assert_eq!(doc["source_type"], "unknown");
    assert_eq!(doc["url"], "https://b.example");

    let profile = json!({"title": "Profile", "content": "c"});
    let doc = store.document(PARIS, &content_id(&profile)).unwrap();
    assert_eq!(doc["body"], "c");
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let tmp = setup();
    let store = InMemoryStore::new();

    run_ingest(&store, tmp.path(), &config()).await.unwrap();
    let ids_first = store.doc_ids(BERLIN);

    let second = run_ingest(&store, tmp.path(), &config()).await.unwrap();
    assert_eq!(second.indices_existing, 2);
    assert_eq!(second.indices_created, 0);
    assert_eq!(second.documents_succeeded, 5);
    assert_eq!(store.doc_ids(BERLIN), ids_first);
    assert_eq!(store.doc_count(BERLIN), 4);
}

#[tokio::test]
async fn test_duplicate_content_collapses_to_one_document() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "20260204_110300_x/raw_data/a.json",
        r#"[{"title": "same", "url": "u"}]"#,
    );
    write(
        tmp.path(),
        "20260204_110300_x/raw_data/b.json",
        r#"{"url": "u", "title": "same"}"#,
    );
    let store = InMemoryStore::new();
    let summary = run_ingest(&store, tmp.path(), &config()).await.unwrap();
    assert_eq!(summary.documents_attempted, 2);
    assert_eq!(store.doc_count(BERLIN), 1);
}

#[tokio::test]
async fn test_failed_index_holds_back_its_documents() {
    let tmp = setup();
    let store = InMemoryStore::new();
    store.fail_creation_of(PARIS);

    let plan = plan_ingest(tmp.path(), &config()).unwrap();
    let (summary, outcome) = execute_plan(&store, plan, &config()).await.unwrap();

    assert_eq!(summary.indices_created, 1);
    assert_eq!(summary.indices_failed, 1);
    assert_eq!(summary.documents_succeeded, 4);
    assert_eq!(summary.documents_failed, 1);

    let failure = &outcome.failures[0];
    assert_eq!(failure.index, PARIS);
    assert_eq!(failure.error_type, INDEX_UNAVAILABLE);
    assert_eq!(failure.status, None);
    assert!(failure.reason.contains("illegal_argument_exception"));
    assert!(!store.has_index(PARIS));
    assert_eq!(store.doc_count(BERLIN), 4);
}

#[tokio::test]
async fn test_unreachable_store_aborts() {
    let tmp = setup();
    let store = InMemoryStore::new();
    store.set_offline(true);
    let err = run_ingest(&store, tmp.path(), &config()).await.unwrap_err();
    assert!(err.to_string().contains("Could not connect"));
    assert!(!store.has_index(BERLIN));
}

#[tokio::test]
async fn test_connection_lost_mid_write_keeps_counts() {
    let tmp = setup();
    let config =
        IngestConfig::from_lookup(|k| (k == "ES_BULK_CHUNK_SIZE").then(|| "3".to_string()))
            .unwrap();
    let store = InMemoryStore::new();
    store.drop_connection_after_bulk_calls(1);

    let err = run_ingest(&store, tmp.path(), &config).await.unwrap_err();
    let aborted = err
        .downcast_ref::<RunAborted>()
        .expect("transport failure should carry the run summary");
    assert!(aborted.summary.aborted);
    assert_eq!(aborted.summary.documents_attempted, 5);
    assert_eq!(aborted.summary.documents_succeeded, 3);
    assert_eq!(aborted.summary.documents_failed, 0);
    assert_eq!(aborted.summary.indices_created, 2);
    assert_eq!(store.doc_count(BERLIN) + store.doc_count(PARIS), 3);
}

#[tokio::test]
async fn test_malformed_report_id_falls_back_to_clock() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "adhoc/raw_data/a.json", r#"{"title": "x"}"#);
    let plan = plan_ingest(tmp.path(), &config()).unwrap();
    assert_eq!(plan.indices.len(), 1);
    let name = plan.indices.iter().next().unwrap();
    let stamp = name.strip_prefix("osint_").unwrap();
    assert_eq!(stamp.len(), 15);
    assert_eq!(&stamp[8..9], "_");
    assert!(stamp.replace('_', "").chars().all(|c| c.is_ascii_digit()));
    assert_eq!(plan.documents[0].index, *name);
}

#[tokio::test]
async fn test_empty_tree_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("r/raw_data")).unwrap();
    let store = InMemoryStore::new();
    let summary = run_ingest(&store, tmp.path(), &config()).await.unwrap();
    assert_eq!(summary.documents_attempted, 0);
    assert_eq!(store.bulk_calls(), 0);
}

#[tokio::test]
async fn test_prefix_from_config() {
    let tmp = setup();
    let config =
        IngestConfig::from_lookup(|k| (k == "ES_INDEX_PREFIX").then(|| "Intel_".to_string()))
            .unwrap();
    let store = InMemoryStore::new();
    run_ingest(&store, tmp.path(), &config).await.unwrap();
    assert!(store.has_index("intel_20260204_110300"));
    assert!(!store.has_index(BERLIN));
}
