//! Knowledge sync type definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Free-form chunk metadata, stored alongside each document.
pub type Metadata = serde_json::Map<String, Value>;

/// Identity and change marker of one source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecordMetadata {
    pub source_id: String,
    pub title: String,

    /// Opaque change marker (timestamp, version, etag). Compared by
    /// exact string equality only.
    pub modified_marker: String,
}

impl SourceRecordMetadata {
    pub fn new(
        source_id: impl Into<String>,
        title: impl Into<String>,
        modified_marker: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            title: title.into(),
            modified_marker: modified_marker.into(),
        }
    }
}

/// A chunk previously written to the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedChunk {
    pub chunk_id: String,
    pub metadata: Metadata,
}

impl PersistedChunk {
    pub fn new(chunk_id: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            metadata,
        }
    }

    /// Owning record id; empty when the metadata has none.
    pub fn source_id(&self) -> String {
        metadata_string(&self.metadata, crate::chunk::KEY_SOURCE_ID)
    }

    pub fn title(&self) -> String {
        metadata_string(&self.metadata, crate::chunk::KEY_TITLE)
    }

    pub fn modified_marker(&self) -> String {
        metadata_string(&self.metadata, crate::chunk::KEY_MODIFIED_MARKER)
    }
}

/// Read a metadata field as a string. Missing and null read as "".
pub fn metadata_string(metadata: &Metadata, key: &str) -> String {
    match metadata.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Work needed to bring a collection in line with its source.
///
/// Sets are ordered so plans print and iterate deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalUpdatePlan {
    pub record_ids_to_add: BTreeSet<String>,
    pub chunk_ids_to_delete: BTreeSet<String>,
}

impl IncrementalUpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.record_ids_to_add.is_empty() && self.chunk_ids_to_delete.is_empty()
    }
}

/// An indexable unit of text with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}
