//! Sync command handler.

use super::shared::{SourceArgs, StoreArgs};
use clap::Args;
use magnet_core::{AppConfig, AppResult};
use magnet_knowledge::{sync_collection, ProgressEvent, ProgressReporter};
use std::sync::Arc;

/// Incrementally sync a source into a collection
#[derive(Args, Debug)]
pub struct SyncCommand {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Output stats as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl SyncCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing sync command for collection '{}'", self.store.collection);

        let processor = self.source.load_processor(config, true).await?;
        let store = self.store.open(config)?;

        let progress = if self.quiet || self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| eprintln!("{}", event.format_simple())))
        };
        progress.loaded(processor.records().len());

        let stats = sync_collection(&processor, &store, &self.store.collection, &progress).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Sync of '{}' complete", self.store.collection);
        println!("  Records: {}", stats.records_total);
        println!("  Unchanged: {}", stats.records_unchanged);
        println!("  Chunked: {}", stats.records_chunked);
        println!("  Skipped: {}", stats.records_skipped);
        println!("  Chunks created: {}", stats.chunks_created);
        println!("  Chunks deleted: {}", stats.chunks_deleted);
        println!("  Duration: {:.2}s", stats.duration_secs);

        if !stats.records_failed.is_empty() {
            println!("  Failed: {}", stats.records_failed.len());
            for (id, error) in &stats.records_failed {
                println!("    {}: {}", id, error);
            }
        }

        Ok(())
    }
}
