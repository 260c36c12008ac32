//! Document stores holding chunked collections.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::types::{Document, PersistedChunk};
use magnet_core::AppResult;

/// Persistence for the chunks of a collection.
///
/// `list_documents` returns chunks in insertion order; incremental
/// planning reads the first chunk of each record.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self, collection_id: &str) -> AppResult<Vec<PersistedChunk>>;

    /// Store documents, returning their new ids in order.
    async fn create_documents(
        &self,
        documents: Vec<Document>,
        collection_id: &str,
    ) -> AppResult<Vec<String>>;

    /// Delete documents by id, returning how many existed.
    async fn delete_documents(&self, document_ids: &[String], collection_id: &str)
        -> AppResult<usize>;
}
