//! Optional LLM rewrite of chunk text.

use crate::config::{ChunkUsageMethod, TransformationMethod, TransformationSettings};
use magnet_core::{AppError, AppResult};
use magnet_prompt::PromptExecutor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The three texts a chunk can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedContent {
    /// Text that is embedded and searched
    pub index: String,
    /// Text returned to the caller at retrieval time
    pub retrieval: String,
    /// Splitter output before any transformation
    pub unmodified: String,
}

impl PreparedContent {
    fn original(text: &str) -> Self {
        Self {
            index: text.to_string(),
            retrieval: text.to_string(),
            unmodified: text.to_string(),
        }
    }
}

/// Decide index and retrieval text for one chunk, running the transformation
/// prompt when enabled.
///
/// The prompt receives `content` and `title`. Executor failures propagate.
pub async fn prepare_chunk(
    text: &str,
    title: &str,
    settings: &TransformationSettings,
    executor: Option<&dyn PromptExecutor>,
) -> AppResult<PreparedContent> {
    if !settings.enabled {
        return Ok(PreparedContent::original(text));
    }

    let template = settings.prompt_template.as_deref().ok_or_else(|| {
        AppError::Config(
            "transformation_enabled is set but transformation_prompt_template is missing"
                .to_string(),
        )
    })?;
    let executor = executor.ok_or_else(|| {
        AppError::Config("transformation_enabled is set but no prompt executor is configured".to_string())
    })?;

    let mut values = HashMap::new();
    values.insert("content".to_string(), text.to_string());
    values.insert("title".to_string(), title.to_string());

    let output = executor.execute_prompt_template(template, &values).await?;
    let transformed = output.content.trim();

    if transformed.is_empty() {
        tracing::warn!(template, title, "Transformation returned no text, keeping original");
        return Ok(PreparedContent::original(text));
    }

    let combined = match settings.method {
        TransformationMethod::Replace => transformed.to_string(),
        TransformationMethod::Append => format!("{}\n\n{}", text, transformed),
        TransformationMethod::Prepend => format!("{}\n\n{}", transformed, text),
    };

    let (index, retrieval) = match settings.usage {
        ChunkUsageMethod::TransformedBoth => (combined.clone(), combined),
        ChunkUsageMethod::OriginalIndexTransformedRetrieval => (text.to_string(), combined),
        ChunkUsageMethod::TransformedIndexOriginalRetrieval => (combined, text.to_string()),
        ChunkUsageMethod::OriginalBoth => (text.to_string(), text.to_string()),
    };

    Ok(PreparedContent {
        index,
        retrieval,
        unmodified: text.to_string(),
    })
}
