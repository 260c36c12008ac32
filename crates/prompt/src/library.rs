//! Cached access to prompt definitions.
//!
//! A `PromptLibrary` owns its cache; there is no process-wide template
//! state. Edits to template files become visible after `invalidate` or
//! `clear`.

use crate::loader::{list_prompts, load_prompt};
use crate::types::PromptDefinition;
use magnet_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Prompt definitions loaded from one directory, cached by id.
#[derive(Debug)]
pub struct PromptLibrary {
    prompts_dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<PromptDefinition>>>,
}

impl PromptLibrary {
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompts_dir: prompts_dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }

    /// Get a definition, loading it from disk on first use.
    pub fn get(&self, prompt_id: &str) -> AppResult<Arc<PromptDefinition>> {
        {
            let cache = self.cache.read().map_err(poisoned)?;
            if let Some(definition) = cache.get(prompt_id) {
                return Ok(Arc::clone(definition));
            }
        }

        let definition = Arc::new(load_prompt(&self.prompts_dir, prompt_id)?);

        let mut cache = self.cache.write().map_err(poisoned)?;
        let entry = cache
            .entry(prompt_id.to_string())
            .or_insert_with(|| Arc::clone(&definition));
        Ok(Arc::clone(entry))
    }

    /// Insert a definition that did not come from disk.
    pub fn insert(&self, definition: PromptDefinition) -> AppResult<()> {
        let mut cache = self.cache.write().map_err(poisoned)?;
        cache.insert(definition.id.clone(), Arc::new(definition));
        Ok(())
    }

    /// Drop one cached definition. Returns whether it was cached.
    pub fn invalidate(&self, prompt_id: &str) -> AppResult<bool> {
        let mut cache = self.cache.write().map_err(poisoned)?;
        Ok(cache.remove(prompt_id).is_some())
    }

    /// Drop every cached definition.
    pub fn clear(&self) -> AppResult<()> {
        self.cache.write().map_err(poisoned)?.clear();
        Ok(())
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Ids of all templates available on disk.
    pub fn available(&self) -> AppResult<Vec<String>> {
        list_prompts(&self.prompts_dir)
    }
}

fn poisoned<T>(_: T) -> AppError {
    AppError::Prompt("Prompt cache lock poisoned".to_string())
}
