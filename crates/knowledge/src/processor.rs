//! Per-batch record processing: identity, planning and chunking.

use crate::chunk::{detect_content_kind, sniff_content_kind, BaseMetadata, ChunkPipeline, ContentKind};
use crate::chunk::splitters::{embed_url_builder, ensure_pdf_strategy};
use crate::config::SplitterSettings;
use crate::diff::{compute_plan, inconsistent_groups};
use crate::sources::{stage_bytes, ContentFetcher, DataSource, RecordContent, SourceKind};
use crate::types::{Document, IncrementalUpdatePlan, PersistedChunk, SourceRecordMetadata};
use magnet_core::{AppError, AppResult};
use magnet_prompt::PromptExecutor;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Why a record produced no chunks without failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// MIME type or extension no splitter handles
    UnsupportedContentType(String),
    /// The record carries nothing to chunk
    NoContent(String),
    /// Content was present but blank after normalization
    EmptyContent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedContentType(kind) => write!(f, "unsupported content type: {}", kind),
            Self::NoContent(reason) => write!(f, "no content: {}", reason),
            Self::EmptyContent => f.write_str("content is empty"),
        }
    }
}

/// Result of chunking one record.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    Chunks(Vec<Document>),
    Skipped(SkipReason),
}

impl ChunkOutcome {
    /// Chunks produced; empty for a skipped record.
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            Self::Chunks(documents) => documents,
            Self::Skipped(_) => Vec::new(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Holds one batch of records from a single source kind.
pub struct DataProcessor {
    kind: SourceKind,
    pipeline: ChunkPipeline,
    fetcher: Option<Arc<dyn ContentFetcher>>,
    staging_dir: Option<PathBuf>,
    records: Vec<Value>,
    index: HashMap<String, usize>,
}

impl DataProcessor {
    pub fn new(kind: SourceKind, settings: SplitterSettings) -> Self {
        Self {
            kind,
            pipeline: ChunkPipeline::new(settings),
            fetcher: None,
            staging_dir: None,
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn PromptExecutor>) -> Self {
        self.pipeline = self.pipeline.with_executor(executor);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ContentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Directory for downloaded files awaiting extraction.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Load a batch from a data source, replacing any previous batch.
    pub async fn load(&mut self, source: &dyn DataSource) -> AppResult<usize> {
        let records = source.get_data().await?;
        Ok(self.set_records(records))
    }

    /// Replace the batch. Records without an id are kept but cannot be
    /// chunked; `basic_metadata` reports them.
    pub fn set_records(&mut self, records: Vec<Value>) -> usize {
        self.index = records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| self.kind.record_id(record).map(|id| (id, i)))
            .collect();
        self.records = records;

        tracing::info!(
            source = %self.kind,
            records = self.records.len(),
            unique_ids = self.index.len(),
            "Loaded record batch"
        );
        self.records.len()
    }

    /// Check settings that would fail every record, before any store change.
    pub fn validate(&self) -> AppResult<()> {
        self.pipeline.validate()
    }

    /// Identity and change marker of every record in the batch.
    pub fn basic_metadata(&self) -> AppResult<Vec<SourceRecordMetadata>> {
        self.records
            .iter()
            .map(|record| self.kind.basic_metadata(record))
            .collect()
    }

    /// Plan the add/delete work against previously persisted chunks.
    pub fn incremental_update_plan(
        &self,
        persisted: &[PersistedChunk],
    ) -> AppResult<IncrementalUpdatePlan> {
        let current = self.basic_metadata()?;

        let inconsistent = inconsistent_groups(persisted);
        if !inconsistent.is_empty() {
            tracing::warn!(
                source_ids = ?inconsistent,
                "Persisted chunks disagree on title or modified marker within a record"
            );
        }

        Ok(compute_plan(&current, persisted))
    }

    /// Chunk one record of the batch.
    pub async fn chunk_one(&self, source_id: &str) -> AppResult<ChunkOutcome> {
        let position = self.index.get(source_id).ok_or_else(|| {
            AppError::NotFound(format!("Record '{}' is not in the loaded batch", source_id))
        })?;
        let record = &self.records[*position];
        let base = self.kind.base_metadata(record)?;

        let outcome = match self.kind.content(record) {
            RecordContent::Text(text) => chunks(self.pipeline.chunk_text(&text, &base).await?),
            RecordContent::Html(html) => chunks(self.pipeline.chunk_html(&html, &base).await?),
            RecordContent::Video {
                description,
                video_url,
            } => {
                let url_builder = embed_url_builder(&video_url);
                chunks(
                    self.pipeline
                        .chunk_video(&description, &base, url_builder.as_ref())
                        .await?,
                )
            }
            RecordContent::Download { url, mime_type } => {
                self.chunk_download(&url, mime_type.as_deref(), &base).await?
            }
            RecordContent::Unsupported { reason } => ChunkOutcome::Skipped(SkipReason::NoContent(reason)),
        };

        match &outcome {
            ChunkOutcome::Chunks(documents) => tracing::info!(
                source_id,
                chunks = documents.len(),
                "Chunked record"
            ),
            ChunkOutcome::Skipped(reason) => tracing::warn!(
                source_id,
                reason = %reason,
                "Skipped record"
            ),
        }

        Ok(outcome)
    }

    async fn chunk_download(
        &self,
        url: &str,
        declared_mime: Option<&str>,
        base: &BaseMetadata,
    ) -> AppResult<ChunkOutcome> {
        let declared = detect_content_kind(declared_mime, Some(url));
        match declared {
            ContentKind::Unknown => {
                if let Some(mime) = declared_mime.filter(|m| !is_generic_mime(m)) {
                    return Ok(ChunkOutcome::Skipped(SkipReason::UnsupportedContentType(
                        mime.to_string(),
                    )));
                }
            }
            ContentKind::Video => {
                let described = declared_mime.unwrap_or(url).to_string();
                return Ok(ChunkOutcome::Skipped(SkipReason::UnsupportedContentType(
                    described,
                )));
            }
            ContentKind::Pdf => ensure_pdf_strategy(self.pipeline.settings())?,
            ContentKind::Text | ContentKind::Markdown | ContentKind::Html => {}
        }

        let fetcher = self.fetcher.as_ref().ok_or_else(|| {
            AppError::Config(format!(
                "Record '{}' needs downloading but no content fetcher is configured",
                base.source_id
            ))
        })?;
        let fetched = fetcher.fetch(url).await?;

        let mut kind = declared;
        if kind == ContentKind::Unknown {
            kind = detect_content_kind(fetched.content_type.as_deref(), None);
        }
        if kind == ContentKind::Unknown {
            kind = sniff_content_kind(&fetched.bytes);
        }

        let documents = match kind {
            ContentKind::Pdf => {
                // Removed when `staged` drops, on success or error
                let staged = stage_bytes(&fetched.bytes, ".pdf", self.staging_dir.as_deref())?;
                self.pipeline.chunk_pdf_file(staged.path(), base).await?
            }
            ContentKind::Html => {
                let html = String::from_utf8_lossy(&fetched.bytes);
                self.pipeline.chunk_html(&html, base).await?
            }
            ContentKind::Text | ContentKind::Markdown => {
                let text = String::from_utf8_lossy(&fetched.bytes);
                self.pipeline.chunk_text(&text, base).await?
            }
            ContentKind::Video | ContentKind::Unknown => {
                let described = fetched
                    .content_type
                    .or_else(|| declared_mime.map(str::to_string))
                    .unwrap_or_else(|| url.to_string());
                return Ok(ChunkOutcome::Skipped(SkipReason::UnsupportedContentType(
                    described,
                )));
            }
        };

        Ok(chunks(documents))
    }
}

fn chunks(documents: Vec<Document>) -> ChunkOutcome {
    if documents.is_empty() {
        ChunkOutcome::Skipped(SkipReason::EmptyContent)
    } else {
        ChunkOutcome::Chunks(documents)
    }
}

fn is_generic_mime(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/octet-stream") || essence.is_empty()
}
