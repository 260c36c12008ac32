//! Format-specific splitters.
//!
//! Every splitter turns one document into ordered [`Segment`]s. Segments
//! carry only their text and the position fields their format adds (page,
//! chapter, deep link). Numbering and base metadata are applied by the
//! pipeline.

mod html;
mod pdf;
mod text;
mod video;

pub use html::{normalize_html, split_by_headings, HeadingSection};
pub use pdf::{ensure_pdf_strategy, extract_pdf_pages, split_pages};
pub use text::split_text;
pub use video::{embed_url_builder, parse_chapters, split_video, Chapter};

use crate::types::Metadata;
use magnet_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// A piece of a document before numbering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    pub content: String,
    /// Format-specific metadata merged over the base fields
    pub extra: Metadata,
}

impl Segment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            extra: Metadata::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Split text recursively on blank lines, line breaks, sentences, words
/// and finally characters, so no piece exceeds `chunk_size` characters.
pub fn split_recursive(text: &str, chunk_size: usize, overlap: usize) -> AppResult<Vec<String>> {
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|e| AppError::Splitter(format!("Invalid chunk configuration: {}", e)))?;
    let splitter = TextSplitter::new(config);

    let chunks: Vec<String> = splitter
        .chunks(text)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(str::to_string)
        .collect();

    tracing::trace!(
        "Recursive splitter created {} chunks from {} bytes",
        chunks.len(),
        text.len()
    );

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_recursive_respects_size() {
        let text = "This is a sentence. ".repeat(200);
        let chunks = split_recursive(&text, 300, 50).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 300);
        }
    }

    #[test]
    fn test_split_recursive_prefers_paragraphs() {
        let text = format!("{}\n\n{}", "a ".repeat(40).trim(), "b ".repeat(40).trim());
        let chunks = split_recursive(&text, 100, 0).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with('a'));
        assert!(chunks[1].starts_with('b'));
    }

    #[test]
    fn test_split_recursive_utf8() {
        let text = "Acentuação: ã, õ, ç 🚀 ".repeat(100);
        let chunks = split_recursive(&text, 64, 8).unwrap();
        assert!(chunks.len() > 1);
    }

    #[test]
    fn test_split_recursive_blank_input() {
        assert!(split_recursive("   \n\n  ", 100, 0).unwrap().is_empty());
    }

    #[test]
    fn test_segment_extra() {
        let segment = Segment::new("x").with("page_number", 3);
        assert_eq!(segment.extra["page_number"], 3);
    }
}
