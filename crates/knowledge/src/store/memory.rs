//! In-memory document store.

use super::DocumentStore;
use crate::types::{Document, PersistedChunk};
use magnet_core::AppResult;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<(String, Document)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents of a collection, in insertion order.
    pub async fn documents(&self, collection_id: &str) -> Vec<(String, Document)> {
        self.collections
            .read()
            .await
            .get(collection_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self, collection_id: &str) -> AppResult<Vec<PersistedChunk>> {
        Ok(self
            .documents(collection_id)
            .await
            .into_iter()
            .map(|(id, document)| PersistedChunk::new(id, document.metadata))
            .collect())
    }

    async fn create_documents(
        &self,
        documents: Vec<Document>,
        collection_id: &str,
    ) -> AppResult<Vec<String>> {
        let mut collections = self.collections.write().await;
        let collection = collections.entry(collection_id.to_string()).or_default();

        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            let id = uuid::Uuid::new_v4().to_string();
            collection.push((id.clone(), document));
            ids.push(id);
        }
        Ok(ids)
    }

    async fn delete_documents(
        &self,
        document_ids: &[String],
        collection_id: &str,
    ) -> AppResult<usize> {
        let wanted: HashSet<&str> = document_ids.iter().map(String::as_str).collect();
        let mut collections = self.collections.write().await;

        let Some(collection) = collections.get_mut(collection_id) else {
            return Ok(0);
        };

        let before = collection.len();
        collection.retain(|(id, _)| !wanted.contains(id.as_str()));
        Ok(before - collection.len())
    }
}
