//! Prompts command handler.

use clap::{Args, Subcommand};
use magnet_core::{AppConfig, AppResult};

/// List or show prompt templates
#[derive(Args, Debug)]
pub struct PromptsCommand {
    #[command(subcommand)]
    pub action: PromptsAction,
}

#[derive(Subcommand, Debug)]
pub enum PromptsAction {
    /// List available prompt templates
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one prompt template
    Show {
        /// Prompt id (file stem under the prompts directory)
        id: String,
    },
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let prompts_dir = config.prompts_dir();

        match &self.action {
            PromptsAction::List { json } => {
                let ids = magnet_prompt::list_prompts(&prompts_dir)?;
                if *json {
                    println!("{}", serde_json::to_string_pretty(&ids)?);
                } else if ids.is_empty() {
                    println!("No prompts found in {}", prompts_dir.display());
                } else {
                    for id in ids {
                        println!("{}", id);
                    }
                }
            }
            PromptsAction::Show { id } => {
                let definition = magnet_prompt::load_prompt(&prompts_dir, id)?;
                print!("{}", serde_yaml::to_string(&definition)?);
            }
        }

        Ok(())
    }
}
