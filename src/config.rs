//! Ingestion configuration.
//!
//! Read from a key/value source (the process environment, optionally seeded
//! from a `.env` file) into an explicit [`IngestConfig`] that is passed to
//! each component. Nothing here is global.
//!
//! | Key | Default |
//! |-----|---------|
//! | `ES_HOST` | `http://localhost:9200` |
//! | `ES_USER` / `ES_PASS` | unset (both needed for basic auth) |
//! | `ES_INDEX_PREFIX` | `osint_` |
//! | `ES_BULK_CHUNK_SIZE` | `500` |
//! | `ES_TIMEOUT_SECS` | `30` |
//! | `ES_NUMBER_OF_SHARDS` | `1` |
//! | `ES_NUMBER_OF_REPLICAS` | `1` |

use anyhow::{bail, Context, Result};
use osint_ingest_core::mapping::IndexSettings;
use reqwest::Url;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub es_host: Url,
    pub credentials: Option<Credentials>,
    pub index_prefix: String,
    pub bulk_chunk_size: usize,
    pub timeout_secs: u64,
    pub index_settings: IndexSettings,
}

pub const DEFAULT_ES_HOST: &str = "http://localhost:9200";
pub const DEFAULT_INDEX_PREFIX: &str = "osint_";
pub const DEFAULT_BULK_CHUNK_SIZE: usize = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl IngestConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("ES_HOST").unwrap_or_else(|| DEFAULT_ES_HOST.to_string());
        let es_host =
            Url::parse(&host).with_context(|| format!("ES_HOST is not a valid URL: {}", host))?;
        if !matches!(es_host.scheme(), "http" | "https") {
            bail!("ES_HOST must use http or https, got '{}'", es_host.scheme());
        }

        let credentials = match (get("ES_USER"), get("ES_PASS")) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            (Some(_), None) => {
                warn!("ES_USER is set without ES_PASS; connecting without authentication");
                None
            }
            (None, Some(_)) => {
                warn!("ES_PASS is set without ES_USER; connecting without authentication");
                None
            }
        };

        let config = Self {
            es_host,
            credentials,
            index_prefix: get("ES_INDEX_PREFIX")
                .unwrap_or_else(|| DEFAULT_INDEX_PREFIX.to_string()),
            bulk_chunk_size: parse_or(&get, "ES_BULK_CHUNK_SIZE", DEFAULT_BULK_CHUNK_SIZE)?,
            timeout_secs: parse_or(&get, "ES_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            index_settings: IndexSettings {
                number_of_shards: parse_or(&get, "ES_NUMBER_OF_SHARDS", 1)?,
                number_of_replicas: parse_or(&get, "ES_NUMBER_OF_REPLICAS", 1)?,
            },
        };

        if config.bulk_chunk_size == 0 {
            bail!("ES_BULK_CHUNK_SIZE must be > 0");
        }
        if config.timeout_secs == 0 {
            bail!("ES_TIMEOUT_SECS must be > 0");
        }
        if config.index_settings.number_of_shards == 0 {
            bail!("ES_NUMBER_OF_SHARDS must be > 0");
        }

        Ok(config)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got '{}'", key, raw)),
        None => Ok(default),
    }
}

/// Load `.env`-style `KEY=VALUE` lines into the process environment without
/// overriding variables that are already set. A missing file is not an error.
pub fn load_env_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    dotenv::from_path(path)
        .with_context(|| format!("Failed to read env file: {}", path.display()))?;
    Ok(())
}
