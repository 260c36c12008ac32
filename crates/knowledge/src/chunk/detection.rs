//! Content kind detection for source documents.

use serde::{Deserialize, Serialize};

/// Broad content kind that selects a splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Markdown,
    Html,
    Pdf,
    Video,
    Unknown,
}

impl ContentKind {
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Markdown | Self::Html)
    }
}

/// Detect content kind from a MIME type, falling back to the file
/// extension of a name or URL.
pub fn detect_content_kind(mime_type: Option<&str>, name_or_url: Option<&str>) -> ContentKind {
    if let Some(kind) = mime_type.map(from_mime_type) {
        if kind != ContentKind::Unknown {
            return kind;
        }
    }

    name_or_url
        .and_then(extension)
        .map(|ext| from_extension(&ext))
        .unwrap_or(ContentKind::Unknown)
}

/// Detect content kind from downloaded bytes.
pub fn sniff_content_kind(bytes: &[u8]) -> ContentKind {
    if bytes.starts_with(b"%PDF-") {
        return ContentKind::Pdf;
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]).to_lowercase();
    let head = head.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        return ContentKind::Html;
    }

    ContentKind::Unknown
}

fn from_mime_type(mime_type: &str) -> ContentKind {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    match essence.as_str() {
        "text/plain" => ContentKind::Text,
        "text/markdown" | "text/x-markdown" => ContentKind::Markdown,
        "text/html" | "application/xhtml+xml" => ContentKind::Html,
        "application/pdf" => ContentKind::Pdf,
        other if other.starts_with("video/") => ContentKind::Video,
        _ => ContentKind::Unknown,
    }
}

fn from_extension(ext: &str) -> ContentKind {
    match ext {
        "txt" | "text" => ContentKind::Text,
        "md" | "markdown" => ContentKind::Markdown,
        "html" | "htm" | "xhtml" => ContentKind::Html,
        "pdf" => ContentKind::Pdf,
        "mp4" | "mov" | "webm" | "mkv" | "avi" | "m4v" => ContentKind::Video,
        _ => ContentKind::Unknown,
    }
}

/// Lowercased extension of the last path segment, ignoring query and
/// fragment.
fn extension(name_or_url: &str) -> Option<String> {
    let path = name_or_url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_lowercase())
}
