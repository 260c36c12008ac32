//! Record-level metadata copied onto every chunk.

use super::{
    KEY_CREATED_TIME, KEY_MODIFIED_MARKER, KEY_MODIFIED_TIME, KEY_NAME, KEY_SOURCE,
    KEY_SOURCE_ID, KEY_TITLE,
};
use crate::types::Metadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields every chunk of a record carries verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseMetadata {
    pub source_id: String,
    pub name: String,
    pub title: String,
    /// Link back to the record in its system of origin
    pub source: String,
    pub created_time: Option<String>,
    pub modified_time: Option<String>,
    pub modified_marker: String,
}

impl BaseMetadata {
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(KEY_SOURCE_ID.into(), Value::String(self.source_id.clone()));
        metadata.insert(KEY_NAME.into(), Value::String(self.name.clone()));
        metadata.insert(KEY_TITLE.into(), Value::String(self.title.clone()));
        metadata.insert(KEY_SOURCE.into(), Value::String(self.source.clone()));
        metadata.insert(KEY_CREATED_TIME.into(), optional(&self.created_time));
        metadata.insert(KEY_MODIFIED_TIME.into(), optional(&self.modified_time));
        metadata.insert(
            KEY_MODIFIED_MARKER.into(),
            Value::String(self.modified_marker.clone()),
        );
        metadata
    }
}

fn optional(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_metadata() {
        let base = BaseMetadata {
            source_id: "A".into(),
            name: "guide.pdf".into(),
            title: "Guide".into(),
            source: "https://files/guide.pdf".into(),
            created_time: None,
            modified_time: Some("2024-05-01T00:00:00Z".into()),
            modified_marker: "2024-05-01T00:00:00Z".into(),
        };

        let metadata = base.to_metadata();
        assert_eq!(metadata["source_id"], "A");
        assert_eq!(metadata["title"], "Guide");
        assert_eq!(metadata["created_time"], Value::Null);
        assert_eq!(metadata["modified_marker"], "2024-05-01T00:00:00Z");
        assert_eq!(metadata.len(), 7);
    }
}
