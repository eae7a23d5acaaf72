//! # OSINT Ingest CLI (`osint-ingest`)
//!
//! Scans a reports directory for `raw_data/**/*.json` captures, normalizes
//! them, and bulk-writes them into Elasticsearch under one index per report.
//!
//! ## Usage
//!
//! ```bash
//! osint-ingest                         # scan ./reports using ./.env
//! osint-ingest --reports-dir /data/reports --env-file /etc/osint/ingest.env
//! osint-ingest --dry-run               # show what would be written
//! ```
//!
//! Connection settings come from `ES_HOST`, `ES_USER`, `ES_PASS`, and
//! `ES_INDEX_PREFIX` (see [`osint_ingest::config`]).

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use osint_ingest::config::{load_env_file, IngestConfig};
use osint_ingest::elastic::ElasticStore;
use osint_ingest::ingest::{plan_ingest, print_plan, print_summary, run_ingest, RunAborted};
use osint_ingest::logging::init_logging;

/// Normalize OSINT JSON captures and ingest them into Elasticsearch.
///
/// Every directory named `raw_data` under the reports directory is scanned
/// for `*.json` files. The directory above `raw_data` names the report and
/// its target index (`<prefix>YYYYMMDD_HHMMSS`).
#[derive(Parser)]
#[command(name = "osint-ingest", version)]
struct Cli {
    /// Directory holding report folders.
    #[arg(long, default_value = "reports")]
    reports_dir: PathBuf,

    /// `.env` file with `ES_*` settings. Variables already in the
    /// environment take precedence. A missing file is ignored.
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Directory for the daily `ingest_YYYYMMDD.log` file.
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Walk and normalize only; print the plan without contacting the store.
    #[arg(long)]
    dry_run: bool,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    load_env_file(&cli.env_file)?;
    let config = IngestConfig::from_env()?;

    if cli.dry_run {
        let plan = plan_ingest(&cli.reports_dir, &config)?;
        print_plan(&plan);
        return Ok(());
    }

    let store = ElasticStore::new(&config)?;
    match run_ingest(&store, &cli.reports_dir, &config).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            if let Some(aborted) = e.downcast_ref::<RunAborted>() {
                print_summary(&aborted.summary);
            }
            Err(e)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_dir) {
        eprintln!("Warning: {:#}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
