//! Incremental sync of one collection.

use crate::processor::{ChunkOutcome, DataProcessor};
use crate::progress::ProgressReporter;
use crate::store::DocumentStore;
use magnet_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Outcome of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStats {
    pub records_total: usize,
    pub records_unchanged: usize,
    pub records_chunked: usize,
    pub records_skipped: usize,
    /// Records whose chunking failed, with the error message
    pub records_failed: Vec<(String, String)>,
    pub chunks_created: usize,
    pub chunks_deleted: usize,
    pub duration_secs: f64,
}

/// Bring `collection_id` in line with the processor's loaded batch.
///
/// Chunks of records that left the source are deleted first. Each new or
/// changed record is then chunked, and its stale chunks are replaced only
/// once chunking succeeded. A record that fails to chunk keeps its old
/// chunks and is retried on the next run. Configuration, planning and store
/// errors abort the run.
pub async fn sync_collection(
    processor: &DataProcessor,
    store: &dyn DocumentStore,
    collection_id: &str,
    progress: &ProgressReporter,
) -> AppResult<SyncStats> {
    let start = Instant::now();
    let mut stats = SyncStats {
        records_total: processor.records().len(),
        ..Default::default()
    };

    tracing::info!(
        source = %processor.kind(),
        collection_id,
        records = stats.records_total,
        "Starting sync"
    );

    processor.validate()?;

    let persisted = store.list_documents(collection_id).await?;
    let plan = processor.incremental_update_plan(&persisted)?;
    progress.planned(plan.record_ids_to_add.len(), plan.chunk_ids_to_delete.len());

    stats.records_unchanged = processor
        .basic_metadata()?
        .iter()
        .map(|record| &record.source_id)
        .collect::<HashSet<_>>()
        .len()
        .saturating_sub(plan.record_ids_to_add.len());

    // Stale chunk ids per owning record
    let mut stale: HashMap<String, Vec<String>> = HashMap::new();
    for chunk in &persisted {
        if plan.chunk_ids_to_delete.contains(&chunk.chunk_id) {
            stale
                .entry(chunk.source_id())
                .or_default()
                .push(chunk.chunk_id.clone());
        }
    }

    let orphaned: Vec<String> = stale
        .iter()
        .filter(|(source_id, _)| !plan.record_ids_to_add.contains(*source_id))
        .flat_map(|(_, ids)| ids.iter().cloned())
        .collect();
    if !orphaned.is_empty() {
        stats.chunks_deleted = store.delete_documents(&orphaned, collection_id).await?;
        progress.deleted(stats.chunks_deleted, orphaned.len());
    }

    let total = plan.record_ids_to_add.len();
    for (index, source_id) in plan.record_ids_to_add.iter().enumerate() {
        progress.chunked(index + 1, total, source_id);

        let outcome = match processor.chunk_one(source_id).await {
            Ok(outcome) => outcome,
            Err(e @ (AppError::Config(_) | AppError::UnsupportedStrategy(_))) => {
                tracing::error!(source_id = %source_id, error = %e, "Sync aborted by configuration error");
                return Err(e);
            }
            Err(e) => {
                tracing::error!(source_id = %source_id, error = %e, "Failed to chunk record");
                stats.records_failed.push((source_id.clone(), e.to_string()));
                continue;
            }
        };

        if let Some(ids) = stale.get(source_id.as_str()) {
            stats.chunks_deleted += store.delete_documents(ids, collection_id).await?;
        }

        match outcome {
            ChunkOutcome::Chunks(documents) => {
                let ids = store.create_documents(documents, collection_id).await?;
                stats.chunks_created += ids.len();
                stats.records_chunked += 1;
            }
            ChunkOutcome::Skipped(_) => stats.records_skipped += 1,
        }
    }
    progress.stored(stats.chunks_created);

    stats.duration_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        collection_id,
        chunked = stats.records_chunked,
        unchanged = stats.records_unchanged,
        skipped = stats.records_skipped,
        failed = stats.records_failed.len(),
        chunks_created = stats.chunks_created,
        chunks_deleted = stats.chunks_deleted,
        duration_secs = stats.duration_secs,
        "Sync complete"
    );

    Ok(stats)
}
