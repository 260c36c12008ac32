//! Splitter settings parsed from the free-form `sync.splitter` map.
//!
//! Numeric values that are missing, non-numeric or out of range fall back
//! to defaults with a warning. Unknown enum strings are configuration
//! errors.

use magnet_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CHUNK_SIZE: usize = 12_000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 2_000;

/// How text is cut into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Split on blank lines, line breaks, sentences, words, then characters
    #[default]
    RecursiveCharacter,
    /// One chunk per document (or per page for paged input)
    None,
    /// Split at Markdown/HTML heading boundaries
    HtmlHeader,
}

impl ChunkingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecursiveCharacter => "recursive_character",
            Self::None => "none",
            Self::HtmlHeader => "html_header",
        }
    }
}

impl FromStr for ChunkingStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recursive_character" | "recursive" => Ok(Self::RecursiveCharacter),
            "none" => Ok(Self::None),
            "html_header" | "html_headers" => Ok(Self::HtmlHeader),
            other => Err(AppError::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a transformed chunk is combined with the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationMethod {
    #[default]
    Replace,
    Append,
    Prepend,
}

impl FromStr for TransformationMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            "prepend" => Ok(Self::Prepend),
            other => Err(AppError::Config(format!(
                "Unknown transformation_method '{}'. Expected replace, append or prepend",
                other
            ))),
        }
    }
}

/// Which text is indexed and which is returned at retrieval time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkUsageMethod {
    #[default]
    TransformedBoth,
    OriginalIndexTransformedRetrieval,
    TransformedIndexOriginalRetrieval,
    OriginalBoth,
}

impl FromStr for ChunkUsageMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transformed_both" => Ok(Self::TransformedBoth),
            "original_index_transformed_retrieval" => Ok(Self::OriginalIndexTransformedRetrieval),
            "transformed_index_original_retrieval" => Ok(Self::TransformedIndexOriginalRetrieval),
            "original_both" => Ok(Self::OriginalBoth),
            other => Err(AppError::Config(format!(
                "Unknown chunk_usage_method '{}'",
                other
            ))),
        }
    }
}

/// Optional LLM rewrite of each chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformationSettings {
    pub enabled: bool,
    pub prompt_template: Option<String>,
    pub method: TransformationMethod,
    pub usage: ChunkUsageMethod,
}

/// Settings shared by every splitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitterSettings {
    pub strategy: ChunkingStrategy,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub transformation: TransformationSettings,
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self {
            strategy: ChunkingStrategy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            transformation: TransformationSettings::default(),
        }
    }
}

impl SplitterSettings {
    /// Parse settings from a key/value map.
    ///
    /// Recognized keys: `strategy` (alias `chunking_strategy`), `chunk_size`,
    /// `chunk_overlap`, `transformation_enabled`,
    /// `transformation_prompt_template`, `transformation_method`,
    /// `chunk_usage_method`.
    pub fn from_map(values: &BTreeMap<String, Value>) -> AppResult<Self> {
        let strategy = match string_value(values, "strategy")
            .or_else(|| string_value(values, "chunking_strategy"))
        {
            Some(s) => s.parse()?,
            None => ChunkingStrategy::default(),
        };

        let chunk_size = positive_usize(values, "chunk_size", DEFAULT_CHUNK_SIZE);
        let mut chunk_overlap = usize_value(values, "chunk_overlap", DEFAULT_CHUNK_OVERLAP);
        if chunk_overlap >= chunk_size {
            let fallback = if DEFAULT_CHUNK_OVERLAP < chunk_size {
                DEFAULT_CHUNK_OVERLAP
            } else {
                0
            };
            tracing::warn!(
                chunk_size,
                chunk_overlap,
                fallback,
                "chunk_overlap must be smaller than chunk_size, using fallback"
            );
            chunk_overlap = fallback;
        }

        let transformation = TransformationSettings {
            enabled: bool_value(values, "transformation_enabled"),
            prompt_template: string_value(values, "transformation_prompt_template")
                .filter(|s| !s.trim().is_empty()),
            method: match string_value(values, "transformation_method") {
                Some(s) => s.parse()?,
                None => TransformationMethod::default(),
            },
            usage: match string_value(values, "chunk_usage_method") {
                Some(s) => s.parse()?,
                None => ChunkUsageMethod::default(),
            },
        };

        Ok(Self {
            strategy,
            chunk_size,
            chunk_overlap,
            transformation,
        })
    }

    pub fn with_strategy(mut self, strategy: ChunkingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_sizes(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }
}

fn string_value(values: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    match values.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn usize_value(values: &BTreeMap<String, Value>, key: &str, default: usize) -> usize {
    let Some(value) = values.get(key) else {
        return default;
    };

    let parsed = match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        tracing::warn!(key, value = %value, default, "Invalid splitter setting, using default");
        default
    })
}

fn positive_usize(values: &BTreeMap<String, Value>, key: &str, default: usize) -> usize {
    match usize_value(values, key, default) {
        0 => {
            tracing::warn!(key, default, "Splitter setting must be positive, using default");
            default
        }
        n => n,
    }
}

fn bool_value(values: &BTreeMap<String, Value>, key: &str) -> bool {
    match values.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        Some(Value::Number(n)) => n.as_u64().is_some_and(|n| n != 0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> BTreeMap<String, Value> {
        value
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = SplitterSettings::from_map(&BTreeMap::new()).unwrap();
        assert_eq!(settings, SplitterSettings::default());
        assert_eq!(settings.chunk_size, 12_000);
        assert_eq!(settings.chunk_overlap, 2_000);
        assert!(!settings.transformation.enabled);
    }

    #[test]
    fn test_parse_all_keys() {
        let settings = SplitterSettings::from_map(&map(json!({
            "strategy": "html_header",
            "chunk_size": 800,
            "chunk_overlap": "100",
            "transformation_enabled": "true",
            "transformation_prompt_template": "chunk.rewrite",
            "transformation_method": "append",
            "chunk_usage_method": "original_index_transformed_retrieval",
        })))
        .unwrap();

        assert_eq!(settings.strategy, ChunkingStrategy::HtmlHeader);
        assert_eq!(settings.chunk_size, 800);
        assert_eq!(settings.chunk_overlap, 100);
        assert!(settings.transformation.enabled);
        assert_eq!(
            settings.transformation.prompt_template.as_deref(),
            Some("chunk.rewrite")
        );
        assert_eq!(settings.transformation.method, TransformationMethod::Append);
        assert_eq!(
            settings.transformation.usage,
            ChunkUsageMethod::OriginalIndexTransformedRetrieval
        );
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let settings = SplitterSettings::from_map(&map(json!({
            "chunk_size": "lots",
            "chunk_overlap": -5,
        })))
        .unwrap();
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(settings.chunk_overlap, DEFAULT_CHUNK_OVERLAP);

        let settings = SplitterSettings::from_map(&map(json!({"chunk_size": 0}))).unwrap();
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_overlap_not_smaller_than_size() {
        let settings = SplitterSettings::from_map(&map(json!({
            "chunk_size": 5000,
            "chunk_overlap": 6000,
        })))
        .unwrap();
        assert_eq!(settings.chunk_overlap, DEFAULT_CHUNK_OVERLAP);

        let settings = SplitterSettings::from_map(&map(json!({
            "chunk_size": 500,
            "chunk_overlap": 500,
        })))
        .unwrap();
        assert_eq!(settings.chunk_overlap, 0);
    }

    #[test]
    fn test_unknown_strategy_is_error() {
        let result = SplitterSettings::from_map(&map(json!({"strategy": "semantic"})));
        assert!(matches!(result, Err(AppError::UnsupportedStrategy(s)) if s == "semantic"));

        let result = SplitterSettings::from_map(&map(json!({"chunking_strategy": "semantic"})));
        assert!(matches!(result, Err(AppError::UnsupportedStrategy(_))));
    }

    #[test]
    fn test_strategy_key_and_alias() {
        let settings = SplitterSettings::from_map(&map(json!({"strategy": "none"}))).unwrap();
        assert_eq!(settings.strategy, ChunkingStrategy::None);

        let settings =
            SplitterSettings::from_map(&map(json!({"chunking_strategy": "html_header"}))).unwrap();
        assert_eq!(settings.strategy, ChunkingStrategy::HtmlHeader);

        // The canonical key wins when both are present
        let settings = SplitterSettings::from_map(&map(json!({
            "strategy": "none",
            "chunking_strategy": "html_header",
        })))
        .unwrap();
        assert_eq!(settings.strategy, ChunkingStrategy::None);
    }

    #[test]
    fn test_unknown_methods_are_config_errors() {
        let result = SplitterSettings::from_map(&map(json!({"transformation_method": "merge"})));
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = SplitterSettings::from_map(&map(json!({"chunk_usage_method": "both"})));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_strategy_round_trip_names() {
        for strategy in [
            ChunkingStrategy::RecursiveCharacter,
            ChunkingStrategy::None,
            ChunkingStrategy::HtmlHeader,
        ] {
            assert_eq!(strategy.as_str().parse::<ChunkingStrategy>().unwrap(), strategy);
        }
    }
}
