//! Record sources.
//!
//! A [`DataSource`] yields the raw JSON records of one batch. The
//! [`SourceKind`] of the batch decides how those records are read.

mod fetch;
mod kinds;

pub use fetch::{stage_bytes, ContentFetcher, FetchedContent, HttpFetcher};
pub use kinds::{RecordContent, SourceKind};

use magnet_core::{AppError, AppResult};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Keys commonly wrapping the record list in API responses.
const RECORD_LIST_KEYS: [&str; 6] = ["records", "results", "value", "items", "data", "pages"];

/// Provides the raw records of one batch.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    async fn get_data(&self) -> AppResult<Vec<Value>>;
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<Value>,
}

impl StaticSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }
}

#[async_trait::async_trait]
impl DataSource for StaticSource {
    async fn get_data(&self) -> AppResult<Vec<Value>> {
        Ok(self.records.clone())
    }
}

/// Records read from a JSON or JSON Lines file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl DataSource for JsonFileSource {
    async fn get_data(&self) -> AppResult<Vec<Value>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Source(format!("Failed to read records from {:?}: {}", self.path, e))
        })?;

        let is_jsonl = self
            .path
            .extension()
            .is_some_and(|ext| ext == "jsonl" || ext == "ndjson");

        let records = if is_jsonl {
            contents
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str::<Value>)
                .collect::<Result<Vec<Value>, _>>()?
        } else {
            record_list(serde_json::from_str(&contents)?, None)?
        };

        tracing::debug!(path = ?self.path, records = records.len(), "Loaded records from file");
        Ok(records)
    }
}

/// Records fetched from a JSON HTTP endpoint.
pub struct HttpJsonSource {
    client: reqwest::Client,
    url: String,
    bearer_token: Option<String>,
    records_pointer: Option<String>,
}

impl HttpJsonSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Source(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            bearer_token: None,
            records_pointer: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// JSON pointer to the record array, e.g. `/results`.
    pub fn with_records_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.records_pointer = Some(pointer.into());
        self
    }
}

#[async_trait::async_trait]
impl DataSource for HttpJsonSource {
    async fn get_data(&self) -> AppResult<Vec<Value>> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Source(format!("Failed to fetch {}: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Source(format!(
                "Request to {} failed with status {}: {}",
                self.url, status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Source(format!("Invalid JSON from {}: {}", self.url, e)))?;

        let records = record_list(body, self.records_pointer.as_deref())?;
        tracing::debug!(url = %self.url, records = records.len(), "Fetched records");
        Ok(records)
    }
}

/// Extract the record array from a response body.
fn record_list(body: Value, pointer: Option<&str>) -> AppResult<Vec<Value>> {
    let list = match pointer {
        Some(pointer) => body.pointer(pointer).cloned().ok_or_else(|| {
            AppError::Source(format!("No value at JSON pointer '{}'", pointer))
        })?,
        None => match body {
            Value::Array(_) => body,
            Value::Object(mut map) => RECORD_LIST_KEYS
                .iter()
                .find_map(|key| map.remove(*key).filter(Value::is_array))
                .ok_or_else(|| {
                    AppError::Source(format!(
                        "Response has no record list (looked for {})",
                        RECORD_LIST_KEYS.join(", ")
                    ))
                })?,
            _ => {
                return Err(AppError::Source(
                    "Expected a JSON array or object of records".to_string(),
                ))
            }
        },
    };

    match list {
        Value::Array(records) => Ok(records),
        _ => Err(AppError::Source("Record list is not an array".to_string())),
    }
}
