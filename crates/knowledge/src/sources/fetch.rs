//! Content download and temporary staging.

use magnet_core::{AppError, AppResult};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Raw bytes of a downloaded document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedContent {
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the server, if any
    pub content_type: Option<String>,
}

/// Retrieves the document behind a record link.
#[async_trait::async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, location: &str) -> AppResult<FetchedContent>;
}

/// Fetches `http(s)` URLs with reqwest and reads anything else from the
/// local filesystem.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Source(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn fetch_url(&self, url: &str) -> AppResult<FetchedContent> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Source(format!("Failed to download {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Source(format!(
                "Download of {} failed with status {}",
                url, status
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Source(format!("Failed to read body of {}: {}", url, e)))?;

        tracing::debug!(url, bytes = bytes.len(), ?content_type, "Downloaded content");

        Ok(FetchedContent {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[async_trait::async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> AppResult<FetchedContent> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return self.fetch_url(location).await;
        }

        let path = location.strip_prefix("file://").unwrap_or(location);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Source(format!("Failed to read {}: {}", path, e)))?;

        Ok(FetchedContent {
            bytes,
            content_type: None,
        })
    }
}

/// Write bytes to a uniquely named temporary file, in `dir` or the system
/// temp directory.
///
/// The file is removed when the returned handle is dropped.
pub fn stage_bytes(bytes: &[u8], suffix: &str, dir: Option<&Path>) -> AppResult<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("magnet-").suffix(suffix);
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(bytes)?;
    file.flush()?;

    tracing::trace!(path = ?file.path(), bytes = bytes.len(), "Staged content");
    Ok(file)
}
