//! Splitting for plain text and Markdown.

use super::{html::split_by_headings, split_recursive, Segment};
use crate::config::{ChunkingStrategy, SplitterSettings};
use magnet_core::AppResult;

/// Split Markdown or plain text according to the configured strategy.
///
/// `html_header` splits at Markdown headings; HTML input is normalized to
/// Markdown before it reaches this function.
pub fn split_text(text: &str, settings: &SplitterSettings) -> AppResult<Vec<Segment>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let segments = match settings.strategy {
        ChunkingStrategy::None => vec![Segment::new(text)],
        ChunkingStrategy::RecursiveCharacter => {
            split_recursive(text, settings.chunk_size, settings.chunk_overlap)?
                .into_iter()
                .map(Segment::new)
                .collect()
        }
        ChunkingStrategy::HtmlHeader => {
            let mut segments = Vec::new();
            for section in split_by_headings(text) {
                let prefix = section.heading_prefix();
                let budget = settings.chunk_size.saturating_sub(prefix.chars().count());
                let body = section.body.trim();

                if body.chars().count() <= budget {
                    segments.push(Segment::new(format!("{}{}", prefix, body)));
                    continue;
                }

                // Headings alone fill the chunk: keep the body within size
                if budget == 0 {
                    for piece in split_recursive(body, settings.chunk_size, settings.chunk_overlap)? {
                        segments.push(Segment::new(piece));
                    }
                    continue;
                }

                let overlap = if settings.chunk_overlap < budget {
                    settings.chunk_overlap
                } else {
                    0
                };
                for piece in split_recursive(body, budget, overlap)? {
                    segments.push(Segment::new(format!("{}{}", prefix, piece)));
                }
            }
            segments
        }
    };

    tracing::debug!(
        strategy = %settings.strategy,
        segments = segments.len(),
        "Split text document"
    );

    Ok(segments)
}
