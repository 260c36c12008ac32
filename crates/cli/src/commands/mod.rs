//! Command handlers for the Magnet CLI.

pub mod chunk;
pub mod plan;
pub mod prompts;
pub mod shared;
pub mod sync;

pub use chunk::ChunkCommand;
pub use plan::PlanCommand;
pub use prompts::PromptsCommand;
pub use sync::SyncCommand;
