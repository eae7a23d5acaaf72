//! # OSINT Ingest
//!
//! Normalizes heterogeneous JSON captures from OSINT feeds (news APIs,
//! generic web captures) into one canonical document schema and bulk-writes
//! them into Elasticsearch, idempotently.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────┐   ┌───────────────┐
//! │   Walker    │──▶│  Normalizer  │──▶│ Provisioner │──▶│ Bulk ingestor │
//! │ raw_data/*  │   │ + content id │   │  indices    │   │    _bulk      │
//! └─────────────┘   └──────────────┘   └─────────────┘   └───────────────┘
//! ```
//!
//! Pure logic (document model, identity, normalization, index naming,
//! mappings, store trait) lives in `osint-ingest-core`; this crate adds the
//! filesystem, HTTP, configuration, and logging around it.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Key/value configuration (`ES_*`) |
//! | [`logging`] | stderr + daily log file |
//! | [`walker`] | Report discovery under a base directory |
//! | [`provision`] | Index existence / creation with mappings |
//! | [`bulk`] | Chunked `_bulk` writes with per-document failures |
//! | [`elastic`] | Elasticsearch HTTP backend |
//! | [`ingest`] | Plan / write orchestration and run summary |

pub mod bulk;
pub mod config;
pub mod elastic;
pub mod ingest;
pub mod logging;
pub mod provision;
pub mod walker;
