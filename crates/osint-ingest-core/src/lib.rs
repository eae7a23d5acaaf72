//! # OSINT Ingest Core
//!
//! Shared, I/O-free logic for the OSINT ingestion pipeline: the canonical
//! document model, content-addressed identity, schema normalization, index
//! naming, the index mapping schema, and the search-store abstraction.
//!
//! This crate contains no HTTP client, filesystem walking, or runtime
//! setup. Everything here is a pure function of its inputs (plus the
//! in-memory store used by tests).

pub mod identity;
pub mod index_name;
pub mod mapping;
pub mod models;
pub mod normalize;
pub mod store;
