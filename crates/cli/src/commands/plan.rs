//! Plan command handler.
//!
//! Loads the source batch and the persisted chunks and prints the
//! incremental update plan without changing the store.

use super::shared::{SourceArgs, StoreArgs};
use clap::Args;
use magnet_core::{AppConfig, AppResult};
use magnet_knowledge::DocumentStore;

/// Show what a sync would add and delete
#[derive(Args, Debug)]
pub struct PlanCommand {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PlanCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing plan command for collection '{}'", self.store.collection);

        let processor = self.source.load_processor(config, false).await?;
        let store = self.store.open(config)?;

        let persisted = store.list_documents(&self.store.collection).await?;
        let plan = processor.incremental_update_plan(&persisted)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(());
        }

        println!(
            "Collection '{}': {} records, {} persisted chunks",
            self.store.collection,
            processor.records().len(),
            persisted.len()
        );

        if plan.is_empty() {
            println!("Up to date");
            return Ok(());
        }

        println!("Records to chunk: {}", plan.record_ids_to_add.len());
        for id in &plan.record_ids_to_add {
            println!("  + {}", id);
        }
        println!("Chunks to delete: {}", plan.chunk_ids_to_delete.len());
        for id in &plan.chunk_ids_to_delete {
            println!("  - {}", id);
        }

        Ok(())
    }
}
