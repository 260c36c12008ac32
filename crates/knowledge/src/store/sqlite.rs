//! SQLite-backed document store.

use super::DocumentStore;
use crate::types::{Document, Metadata, PersistedChunk};
use chrono::Utc;
use magnet_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Storage(format!("Failed to open SQLite store: {}", e)))?;
        let store = Self::from_connection(conn)?;

        tracing::debug!("Opened SQLite store at {:?}", db_path);
        Ok(store)
    }

    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Storage(format!("Failed to open SQLite store: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection_id TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection_id);
            "#,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Storage("SQLite connection lock poisoned".to_string()))
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection_id: &str) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection_id = ?1",
            params![collection_id],
            |row| row.get::<_, i64>(0).map(|v| v as usize),
        )
        .map_err(|e| AppError::Storage(format!("Failed to count documents: {}", e)))
    }

    /// Stored text of one document.
    pub fn content(&self, document_id: &str) -> AppResult<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT content FROM documents WHERE id = ?1",
            params![document_id],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| AppError::Storage(format!("Failed to read document: {}", e)))
    }
}

#[async_trait::async_trait]
impl DocumentStore for SqliteStore {
    async fn list_documents(&self, collection_id: &str) -> AppResult<Vec<PersistedChunk>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, metadata FROM documents WHERE collection_id = ?1 ORDER BY rowid",
            )
            .map_err(|e| AppError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![collection_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| AppError::Storage(format!("Failed to list documents: {}", e)))?;

        let mut chunks = Vec::new();
        for row in rows {
            let (id, metadata_json) =
                row.map_err(|e| AppError::Storage(format!("Failed to read row: {}", e)))?;
            let metadata: Metadata = serde_json::from_str(&metadata_json)?;
            chunks.push(PersistedChunk::new(id, metadata));
        }

        tracing::debug!(collection_id, documents = chunks.len(), "Listed documents");
        Ok(chunks)
    }

    async fn create_documents(
        &self,
        documents: Vec<Document>,
        collection_id: &str,
    ) -> AppResult<Vec<String>> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;

        let created_at = Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(documents.len());

        for document in &documents {
            let id = uuid::Uuid::new_v4().to_string();
            let metadata_json = serde_json::to_string(&document.metadata)?;

            tx.execute(
                "INSERT INTO documents (id, collection_id, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, collection_id, document.content, metadata_json, created_at],
            )
            .map_err(|e| AppError::Storage(format!("Failed to insert document: {}", e)))?;

            ids.push(id);
        }

        tx.commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit documents: {}", e)))?;

        Ok(ids)
    }

    async fn delete_documents(
        &self,
        document_ids: &[String],
        collection_id: &str,
    ) -> AppResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;

        let mut deleted = 0;
        for id in document_ids {
            deleted += tx
                .execute(
                    "DELETE FROM documents WHERE id = ?1 AND collection_id = ?2",
                    params![id, collection_id],
                )
                .map_err(|e| AppError::Storage(format!("Failed to delete document: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit deletion: {}", e)))?;

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn document(source_id: &str, n: u64) -> Document {
        let metadata = json!({"source_id": source_id, "title": "T", "chunk_number": n});
        Document::new(format!("{} chunk {}", source_id, n), metadata.as_object().cloned().unwrap())
    }

    #[test]
    fn test_open_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp.path().join("nested").join("store.sqlite")).unwrap();

        let table_count: i64 = store
            .lock()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='documents'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 1);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order_and_metadata() {
        let store = SqliteStore::in_memory().unwrap();
        let ids = store
            .create_documents(vec![document("A", 1), document("A", 2), document("B", 1)], "kb")
            .await
            .unwrap();

        let listed = store.list_documents("kb").await.unwrap();
        assert_eq!(listed.iter().map(|c| c.chunk_id.clone()).collect::<Vec<_>>(), ids);
        assert_eq!(listed[1].metadata["chunk_number"], 2);
        assert_eq!(listed[2].source_id(), "B");
        assert_eq!(store.content(&ids[0]).unwrap().as_deref(), Some("A chunk 1"));
    }

    #[tokio::test]
    async fn test_delete_scoped_to_collection() {
        let store = SqliteStore::in_memory().unwrap();
        let ids = store.create_documents(vec![document("A", 1)], "one").await.unwrap();
        store.create_documents(vec![document("A", 1)], "two").await.unwrap();

        assert_eq!(store.delete_documents(&ids, "two").await.unwrap(), 0);
        assert_eq!(store.delete_documents(&ids, "one").await.unwrap(), 1);
        assert_eq!(store.count("one").unwrap(), 0);
        assert_eq!(store.count("two").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.sqlite");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_documents(vec![document("A", 1)], "kb").await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.list_documents("kb").await.unwrap().len(), 1);
    }
}
