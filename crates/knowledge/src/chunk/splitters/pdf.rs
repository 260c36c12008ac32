//! Page-aware PDF splitting.

use super::{split_recursive, Segment};
use crate::chunk::{KEY_PAGE_NUMBER, KEY_SOURCE};
use crate::config::{ChunkingStrategy, SplitterSettings};
use magnet_core::{AppError, AppResult};
use std::path::Path;

/// Extract the text of each page of a local PDF file.
///
/// Extraction is CPU-bound and runs on the blocking pool.
pub async fn extract_pdf_pages(path: &Path) -> AppResult<Vec<String>> {
    let path = path.to_path_buf();
    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&path))
        .await
        .map_err(|e| AppError::Splitter(format!("PDF extraction task failed: {}", e)))?
        .map_err(|e| AppError::Splitter(format!("Failed to extract PDF text: {}", e)))?;

    tracing::debug!(pages = pages.len(), "Extracted PDF text");
    Ok(pages)
}

/// Fail early when the strategy cannot split PDF pages.
pub fn ensure_pdf_strategy(settings: &SplitterSettings) -> AppResult<()> {
    match settings.strategy {
        ChunkingStrategy::HtmlHeader => Err(unsupported_for_pdf(settings.strategy)),
        ChunkingStrategy::RecursiveCharacter | ChunkingStrategy::None => Ok(()),
    }
}

fn unsupported_for_pdf(strategy: ChunkingStrategy) -> AppError {
    AppError::UnsupportedStrategy(format!("{} is not supported for PDF documents", strategy))
}

/// Split extracted pages into segments.
///
/// With `recursive_character`, pages are split independently and each
/// segment records its 1-based `page_number` and a `#page=N` deep link.
/// With `none`, all pages are joined into one segment without page fields.
pub fn split_pages(
    pages: &[String],
    source: &str,
    settings: &SplitterSettings,
) -> AppResult<Vec<Segment>> {
    match settings.strategy {
        ChunkingStrategy::None => {
            let joined = pages
                .iter()
                .map(|page| page.trim())
                .filter(|page| !page.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");

            if joined.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![Segment::new(joined)])
        }
        ChunkingStrategy::RecursiveCharacter => {
            let mut segments = Vec::new();
            for (index, page) in pages.iter().enumerate() {
                let page_number = index + 1;
                for piece in split_recursive(page, settings.chunk_size, settings.chunk_overlap)? {
                    let mut segment = Segment::new(piece).with(KEY_PAGE_NUMBER, page_number);
                    if !source.is_empty() {
                        segment = segment.with(KEY_SOURCE, page_link(source, page_number));
                    }
                    segments.push(segment);
                }
            }
            Ok(segments)
        }
        ChunkingStrategy::HtmlHeader => Err(unsupported_for_pdf(settings.strategy)),
    }
}

fn page_link(source: &str, page_number: usize) -> String {
    let base = source.split('#').next().unwrap_or(source);
    format!("{}#page={}", base, page_number)
}
