//! Chunking pipeline orchestrator.

use super::{
    metadata::BaseMetadata,
    splitters::{extract_pdf_pages, normalize_html, split_pages, split_text, split_video, Segment},
    transform::prepare_chunk,
    KEY_CHUNKS_TOTAL, KEY_CHUNK_NUMBER, KEY_CHUNK_TITLE, KEY_CONTENT,
};
use crate::config::SplitterSettings;
use crate::types::Document;
use magnet_core::{AppError, AppResult};
use magnet_prompt::PromptExecutor;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// Turns normalized record content into numbered documents.
#[derive(Clone)]
pub struct ChunkPipeline {
    settings: SplitterSettings,
    executor: Option<Arc<dyn PromptExecutor>>,
}

impl ChunkPipeline {
    pub fn new(settings: SplitterSettings) -> Self {
        Self {
            settings,
            executor: None,
        }
    }

    /// Attach the prompt executor used by chunk transformation.
    pub fn with_executor(mut self, executor: Arc<dyn PromptExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn settings(&self) -> &SplitterSettings {
        &self.settings
    }

    /// Check that an enabled transformation has a template and an executor.
    pub fn validate(&self) -> AppResult<()> {
        let transformation = &self.settings.transformation;
        if !transformation.enabled {
            return Ok(());
        }
        if transformation.prompt_template.is_none() {
            return Err(AppError::Config(
                "transformation_enabled is set but transformation_prompt_template is missing"
                    .to_string(),
            ));
        }
        if self.executor.is_none() {
            return Err(AppError::Config(
                "transformation_enabled is set but no prompt executor is configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Chunk plain text or Markdown.
    pub async fn chunk_text(&self, text: &str, base: &BaseMetadata) -> AppResult<Vec<Document>> {
        let segments = split_text(text, &self.settings)?;
        self.finalize(segments, base).await
    }

    /// Chunk HTML after normalizing it to Markdown.
    pub async fn chunk_html(&self, html: &str, base: &BaseMetadata) -> AppResult<Vec<Document>> {
        let markdown = normalize_html(html)?;
        self.chunk_text(&markdown, base).await
    }

    /// Chunk a local PDF file.
    pub async fn chunk_pdf_file(&self, path: &Path, base: &BaseMetadata) -> AppResult<Vec<Document>> {
        let pages = extract_pdf_pages(path).await?;
        self.chunk_pdf_pages(&pages, base).await
    }

    /// Chunk already-extracted PDF pages.
    pub async fn chunk_pdf_pages(
        &self,
        pages: &[String],
        base: &BaseMetadata,
    ) -> AppResult<Vec<Document>> {
        let segments = split_pages(pages, &base.source, &self.settings)?;
        self.finalize(segments, base).await
    }

    /// Chunk a video description by chapter.
    pub async fn chunk_video(
        &self,
        description: &str,
        base: &BaseMetadata,
        url_builder: &(dyn Fn(Option<u64>) -> String + Send + Sync),
    ) -> AppResult<Vec<Document>> {
        let segments = split_video(description, &self.settings, url_builder)?;
        self.finalize(segments, base).await
    }

    /// Number segments, attach metadata and run the optional transformation.
    pub async fn finalize(
        &self,
        segments: Vec<Segment>,
        base: &BaseMetadata,
    ) -> AppResult<Vec<Document>> {
        let total = segments.len();
        let mut documents = Vec::with_capacity(total);

        for (index, segment) in segments.into_iter().enumerate() {
            let number = index + 1;
            let chunk_title = format!("{} ({}/{})", base.title, number, total);

            let prepared = prepare_chunk(
                &segment.content,
                &chunk_title,
                &self.settings.transformation,
                self.executor.as_deref(),
            )
            .await?;

            let mut metadata = base.to_metadata();
            metadata.extend(segment.extra);
            metadata.insert(KEY_CHUNK_NUMBER.into(), json!(number));
            metadata.insert(KEY_CHUNKS_TOTAL.into(), json!(total));
            metadata.insert(KEY_CHUNK_TITLE.into(), json!(chunk_title));
            metadata.insert(
                KEY_CONTENT.into(),
                json!({
                    "unmodified": prepared.unmodified,
                    "retrieval": prepared.retrieval,
                }),
            );

            documents.push(Document::new(prepared.index, metadata));
        }

        tracing::debug!(
            source_id = %base.source_id,
            chunks = documents.len(),
            "Chunked record"
        );

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::transform::tests::WrapExecutor;
    use crate::config::{ChunkUsageMethod, ChunkingStrategy, TransformationMethod};

    fn base() -> BaseMetadata {
        BaseMetadata {
            source_id: "A".into(),
            name: "guide".into(),
            title: "Guide".into(),
            source: "https://docs/guide.pdf".into(),
            created_time: Some("2024-01-01".into()),
            modified_time: Some("2024-02-01".into()),
            modified_marker: "2024-02-01".into(),
        }
    }

    #[tokio::test]
    async fn test_numbering_and_titles() {
        let pipeline = ChunkPipeline::new(SplitterSettings::default().with_sizes(100, 0));
        let text = "Paragraph text for the guide. ".repeat(20);
        let documents = pipeline.chunk_text(&text, &base()).await.unwrap();

        let total = documents.len();
        assert!(total > 1);
        for (i, doc) in documents.iter().enumerate() {
            assert_eq!(doc.metadata["chunk_number"], i + 1);
            assert_eq!(doc.metadata["chunks_total"], total);
            assert_eq!(
                doc.metadata["chunk_title"],
                format!("Guide ({}/{})", i + 1, total)
            );
            assert_eq!(doc.metadata["source_id"], "A");
            assert_eq!(doc.metadata["content"]["unmodified"], doc.content.as_str());
        }
    }

    #[tokio::test]
    async fn test_html_is_normalized() {
        let pipeline = ChunkPipeline::new(SplitterSettings::default());
        let html = "<h2>Reset password</h2><p>Open settings.</p><script>track()</script>";
        let documents = pipeline.chunk_html(html, &base()).await.unwrap();

        assert_eq!(documents.len(), 1);
        assert!(documents[0].content.contains("## Reset password"));
        assert!(!documents[0].content.contains("track()"));
    }

    #[tokio::test]
    async fn test_pdf_pages_keep_base_title() {
        let pipeline = ChunkPipeline::new(SplitterSettings::default());
        let pages = vec!["Page one".to_string(), "Page two".to_string()];
        let documents = pipeline.chunk_pdf_pages(&pages, &base()).await.unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[1].metadata["page_number"], 2);
        assert_eq!(documents[1].metadata["source"], "https://docs/guide.pdf#page=2");
        assert_eq!(documents[1].metadata["title"], "Guide");
        assert_eq!(documents[1].metadata["modified_marker"], "2024-02-01");
    }

    #[tokio::test]
    async fn test_transformation_applied_per_chunk() {
        let mut settings = SplitterSettings::default().with_strategy(ChunkingStrategy::None);
        settings.transformation.enabled = true;
        settings.transformation.prompt_template = Some("chunk.rewrite".into());
        settings.transformation.method = TransformationMethod::Append;
        settings.transformation.usage = ChunkUsageMethod::OriginalIndexTransformedRetrieval;

        let executor = Arc::new(WrapExecutor::default());
        let pipeline = ChunkPipeline::new(settings).with_executor(executor.clone());
        let documents = pipeline.chunk_text("X", &base()).await.unwrap();

        assert_eq!(documents[0].content, "X");
        assert_eq!(documents[0].metadata["content"]["retrieval"], "X\n\nT(X)");
        assert_eq!(documents[0].metadata["content"]["unmodified"], "X");
        assert_eq!(executor.calls.lock().unwrap()[0]["title"], "Guide (1/1)");
    }

    #[test]
    fn test_validate_transformation_wiring() {
        assert!(ChunkPipeline::new(SplitterSettings::default()).validate().is_ok());

        let mut settings = SplitterSettings::default();
        settings.transformation.enabled = true;
        let pipeline = ChunkPipeline::new(settings.clone())
            .with_executor(Arc::new(WrapExecutor::default()));
        assert!(matches!(pipeline.validate(), Err(AppError::Config(_))));

        settings.transformation.prompt_template = Some("chunk.rewrite".to_string());
        let pipeline = ChunkPipeline::new(settings.clone());
        assert!(matches!(pipeline.validate(), Err(AppError::Config(_))));

        let pipeline = ChunkPipeline::new(settings).with_executor(Arc::new(WrapExecutor::default()));
        assert!(pipeline.validate().is_ok());
    }

    #[tokio::test]
    async fn test_empty_text_has_no_documents() {
        let pipeline = ChunkPipeline::new(SplitterSettings::default());
        assert!(pipeline.chunk_text("", &base()).await.unwrap().is_empty());
    }
}
