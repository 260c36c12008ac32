//! Incremental knowledge-source sync.
//!
//! Loads a batch of records from a source system, works out which records
//! changed since the last sync, and turns new or changed records into
//! numbered chunks ready for a document store.
//!
//! - [`diff`]: add/delete planning against persisted chunks
//! - [`chunk`]: text, HTML, PDF and video splitting with optional LLM
//!   transformation
//! - [`sources`]: source kinds, data sources and content fetching
//! - [`processor`]: per-batch orchestration
//! - [`store`]: document stores
//! - [`sync`]: one-call collection sync

pub mod chunk;
pub mod config;
pub mod diff;
pub mod processor;
pub mod progress;
pub mod sources;
pub mod store;
pub mod sync;
pub mod types;

// Re-export commonly used types
pub use config::{
    ChunkUsageMethod, ChunkingStrategy, SplitterSettings, TransformationMethod,
    TransformationSettings,
};
pub use diff::{compute_plan, inconsistent_groups};
pub use processor::{ChunkOutcome, DataProcessor, SkipReason};
pub use progress::{ProgressEvent, ProgressReporter, SyncPhase};
pub use sources::{
    ContentFetcher, DataSource, HttpFetcher, HttpJsonSource, JsonFileSource, RecordContent,
    SourceKind, StaticSource,
};
pub use store::{DocumentStore, MemoryStore, SqliteStore};
pub use sync::{sync_collection, SyncStats};
pub use types::{Document, IncrementalUpdatePlan, Metadata, PersistedChunk, SourceRecordMetadata};
