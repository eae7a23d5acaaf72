//! Deterministic index naming for reports.
//!
//! A report directory named `YYYYMMDD_HHMMSS_<label>` maps to the index
//! `<prefix>YYYYMMDD_HHMMSS`, lower-cased. Ids with no `_` fall back to the
//! current local time, so two such reports ingested within the same second
//! share an index. Callers surface that case through [`IndexTarget::is_fallback`].

use chrono::{DateTime, Local, TimeZone};

/// Timestamp layout of report directory names and fallback stamps.
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where a report's documents go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    /// Full, lower-cased index name.
    pub name: String,
    /// Timestamp portion the name was derived from.
    pub report_timestamp: String,
    /// True when the report id was not well-formed and the clock was used.
    pub is_fallback: bool,
}

/// Derive the target index for a report using the current local time as the
/// fallback stamp.
pub fn index_for_report(report_id: &str, prefix: &str) -> IndexTarget {
    index_for_report_at(report_id, prefix, Local::now())
}

/// Like [`index_for_report`] with an explicit fallback clock.
pub fn index_for_report_at<Tz>(report_id: &str, prefix: &str, now: DateTime<Tz>) -> IndexTarget
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut parts = report_id.split('_');
    let (report_timestamp, is_fallback) = match (parts.next(), parts.next()) {
        (Some(date), Some(time)) => (format!("{}_{}", date, time), false),
        _ => (now.format(REPORT_TIMESTAMP_FORMAT).to_string(), true),
    };

    IndexTarget {
        name: format!("{}{}", prefix, report_timestamp).to_lowercase(),
        report_timestamp,
        is_fallback,
    }
}
