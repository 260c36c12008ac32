//! Chunking pipeline for source records.
//!
//! This module provides:
//! - Content kind detection (text, HTML, PDF, video)
//! - Format-specific splitters producing position-tagged segments
//! - Numbering, titling and optional LLM transformation of chunks

mod detection;
mod metadata;
mod pipeline;
pub mod splitters;
mod transform;

pub use detection::{detect_content_kind, sniff_content_kind, ContentKind};
pub use metadata::BaseMetadata;
pub use pipeline::ChunkPipeline;
pub use transform::{prepare_chunk, PreparedContent};

pub const KEY_SOURCE_ID: &str = "source_id";
pub const KEY_NAME: &str = "name";
pub const KEY_TITLE: &str = "title";
pub const KEY_SOURCE: &str = "source";
pub const KEY_CREATED_TIME: &str = "created_time";
pub const KEY_MODIFIED_TIME: &str = "modified_time";
pub const KEY_MODIFIED_MARKER: &str = "modified_marker";
pub const KEY_CHUNK_NUMBER: &str = "chunk_number";
pub const KEY_CHUNKS_TOTAL: &str = "chunks_total";
pub const KEY_CHUNK_TITLE: &str = "chunk_title";
pub const KEY_CONTENT: &str = "content";
pub const KEY_PAGE_NUMBER: &str = "page_number";
pub const KEY_CHAPTER_START_TIME: &str = "chapter_start_time";
pub const KEY_CHAPTER_TITLE: &str = "chapter_title";
pub const KEY_EMBED_URL: &str = "embed_url";
