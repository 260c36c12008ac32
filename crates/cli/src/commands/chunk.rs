//! Chunk command handler.

use super::shared::SourceArgs;
use clap::Args;
use magnet_core::{AppConfig, AppResult};
use magnet_knowledge::ChunkOutcome;

/// Chunk a single record and print the documents
#[derive(Args, Debug)]
pub struct ChunkCommand {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Record id to chunk
    #[arg(long)]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChunkCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chunk command for record '{}'", self.id);

        let processor = self.source.load_processor(config, true).await?;

        let documents = match processor.chunk_one(&self.id).await? {
            ChunkOutcome::Chunks(documents) => documents,
            ChunkOutcome::Skipped(reason) => {
                if self.json {
                    println!("{}", serde_json::json!({ "skipped": reason.to_string() }));
                } else {
                    println!("Skipped: {}", reason);
                }
                return Ok(());
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&documents)?);
            return Ok(());
        }

        for document in &documents {
            let title = document
                .metadata
                .get(magnet_knowledge::chunk::KEY_CHUNK_TITLE)
                .and_then(|v| v.as_str())
                .unwrap_or("(untitled)");
            println!("=== {} ===", title);
            println!("{}", document.content);
            println!();
        }
        println!("{} chunks", documents.len());

        Ok(())
    }
}
