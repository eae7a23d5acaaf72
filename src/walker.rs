//! Report discovery.
//!
//! Walks the base directory and groups `*.json` files by the report that
//! owns them. A file belongs to a report when one of its ancestor
//! directories is named `raw_data`; the report id is the name of that
//! directory's parent. With nested `raw_data` directories the innermost one
//! wins. Symlinked files are collected; symlinked directories are not
//! descended into.
//!
//! ```text
//! reports/
//! └── 20260204_110300_berlin_ops/      ← report id
//!     └── raw_data/
//!         ├── newsapi.json
//!         └── web/capture.json
//! ```

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const RAW_DATA_DIR: &str = "raw_data";

/// A report and the raw files it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: String,
    /// The `raw_data` directory the files were found under.
    pub raw_data_dir: PathBuf,
    /// Candidate files, sorted by path.
    pub files: Vec<PathBuf>,
}

fn is_json_file(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .map(|name| name.ends_with(".json"))
        .unwrap_or(false)
}

/// Innermost ancestor of `file` named `raw_data`, not looking above `base`.
fn raw_data_root<'a>(file: &'a Path, base: &Path) -> Option<&'a Path> {
    for dir in file.ancestors().skip(1) {
        if dir.file_name() == Some(OsStr::new(RAW_DATA_DIR)) {
            return Some(dir);
        }
        if dir == base {
            break;
        }
    }
    None
}

/// Discover all reports under `base_dir`.
///
/// Reports are returned sorted by id, then by `raw_data` directory. Entries
/// that cannot be read are logged and skipped.
pub fn discover_reports(base_dir: &Path) -> Result<Vec<Report>> {
    if !base_dir.is_dir() {
        bail!("Reports directory does not exist: {}", base_dir.display());
    }

    // TODO: bound the walk with a deadline so a huge or hung mount cannot
    // stall the run before any write happens.
    let mut grouped: BTreeMap<(String, PathBuf), Vec<PathBuf>> = BTreeMap::new();
    for entry in WalkDir::new(base_dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                continue;
            }
        };
        // Follows symlinks so linked captures count; linked dirs are not entered.
        if !entry.path().is_file() || !is_json_file(entry.path()) {
            continue;
        }

        let path = entry.path();
        let Some(root) = raw_data_root(path, base_dir) else {
            continue;
        };
        let Some(report_id) = root
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().to_string())
        else {
            warn!(
                "Cannot derive report id for {}: raw_data has no parent directory",
                root.display()
            );
            continue;
        };

        grouped
            .entry((report_id, root.to_path_buf()))
            .or_default()
            .push(path.to_path_buf());
    }

    let reports: Vec<Report> = grouped
        .into_iter()
        .map(|((id, raw_data_dir), mut files)| {
            files.sort();
            Report {
                id,
                raw_data_dir,
                files,
            }
        })
        .collect();

    for report in &reports {
        debug!(
            "Report {} ({}): {} file(s)",
            report.id,
            report.raw_data_dir.display(),
            report.files.len()
        );
    }
    Ok(reports)
}
