//! Elasticsearch HTTP backend for [`SearchStore`].
//!
//! Talks to the REST API directly with `reqwest`:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | ping | `HEAD /` |
//! | index exists | `HEAD /<index>` |
//! | create index | `PUT /<index>` with settings + mappings |
//! | bulk write | `POST /_bulk` (NDJSON, `index` actions) |
//!
//! Basic auth is sent when both credentials are configured. Every request
//! is bounded by `ES_TIMEOUT_SECS`.

use async_trait::async_trait;
use osint_ingest_core::store::{BulkAction, BulkItemResult, ItemError, SearchStore, StoreError};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::{Credentials, IngestConfig};

pub struct ElasticStore {
    client: Client,
    base: Url,
    credentials: Option<Credentials>,
}

impl ElasticStore {
    pub fn new(config: &IngestConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base: config.es_host.clone(),
            credentials: config.credentials.clone(),
        })
    }

    /// URL of `segment` under the base path. The segment is percent-encoded
    /// as a whole, so `#`, `?` and `/` in an index name stay in the name.
    /// An empty segment addresses the base itself.
    fn url(&self, segment: &str) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        if !segment.is_empty() {
            url.path_segments_mut()
                .map_err(|_| StoreError::Transport(format!("{} cannot carry a path", self.base)))?
                .pop_if_empty()
                .push(segment);
        }
        Ok(url)
    }

    fn request(&self, method: Method, segment: &str) -> Result<RequestBuilder, StoreError> {
        let builder = self.client.request(method, self.url(segment)?);
        Ok(match &self.credentials {
            Some(c) => builder.basic_auth(&c.username, Some(&c.password)),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        builder
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))
    }
}

/// Turn a non-success response into [`StoreError::Rejected`], reading the
/// `{"error": {"type", "reason"}}` envelope when present.
async fn rejected(response: Response) -> StoreError {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let (error_type, reason) = parse_error(&body, status);
    StoreError::Rejected {
        status: status.as_u16(),
        error_type,
        reason,
    }
}

fn parse_error(body: &Value, status: StatusCode) -> (String, String) {
    match body.get("error") {
        Some(Value::Object(err)) => (
            err.get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            err.get("reason")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
        ),
        Some(Value::String(msg)) => ("unknown".to_string(), msg.clone()),
        _ => (
            "http_error".to_string(),
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        ),
    }
}

/// Render bulk actions as the NDJSON `_bulk` body.
pub fn bulk_body(actions: &[BulkAction]) -> String {
    let mut body = String::new();
    for action in actions {
        let meta = json!({"index": {"_index": action.index, "_id": action.id}});
        body.push_str(&meta.to_string());
        body.push('\n');
        body.push_str(&action.source.to_string());
        body.push('\n');
    }
    body
}

/// Parse the `items` array of a `_bulk` response.
///
/// Items missing an `_id` fall back to the id of the action at the same
/// position.
pub fn parse_bulk_response(
    response: &Value,
    actions: &[BulkAction],
) -> Result<Vec<BulkItemResult>, StoreError> {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Decode("bulk response has no items array".to_string()))?;

    if items.len() != actions.len() {
        return Err(StoreError::Decode(format!(
            "bulk response has {} items for {} actions",
            items.len(),
            actions.len()
        )));
    }

    Ok(items
        .iter()
        .zip(actions)
        .map(|(item, action)| {
            let result = item
                .as_object()
                .and_then(|obj| obj.values().next())
                .cloned()
                .unwrap_or(Value::Null);
            let status = result
                .get("status")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u16;
            let error = result.get("error").map(|err| ItemError {
                error_type: err
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                reason: err
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
            });
            BulkItemResult {
                index: result
                    .get("_index")
                    .and_then(Value::as_str)
                    .unwrap_or(action.index.as_str())
                    .to_string(),
                id: result
                    .get("_id")
                    .and_then(Value::as_str)
                    .unwrap_or(action.id.as_str())
                    .to_string(),
                status,
                error,
            }
        })
        .collect())
}

#[async_trait]
impl SearchStore for ElasticStore {
    async fn ping(&self) -> bool {
        let Ok(builder) = self.request(Method::HEAD, "") else {
            return false;
        };
        match self.send(builder).await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("ping failed: {}", e);
                false
            }
        }
    }

    async fn index_exists(&self, name: &str) -> Result<bool, StoreError> {
        let resp = self.send(self.request(Method::HEAD, name)?).await?;
        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(rejected(resp).await),
        }
    }

    async fn create_index(&self, name: &str, body: &Value) -> Result<(), StoreError> {
        let resp = self
            .send(self.request(Method::PUT, name)?.json(body))
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(rejected(resp).await)
        }
    }

    async fn bulk_write(&self, actions: &[BulkAction]) -> Result<Vec<BulkItemResult>, StoreError> {
        if actions.is_empty() {
            return Ok(Vec::new());
        }
        let resp = self
            .send(
                self.request(Method::POST, "_bulk")?
                    .header("Content-Type", "application/x-ndjson")
                    .body(bulk_body(actions)),
            )
            .await?;
        if !resp.status().is_success() {
            return Err(rejected(resp).await);
        }
        let parsed: Value = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        parse_bulk_response(&parsed, actions)
    }
}
