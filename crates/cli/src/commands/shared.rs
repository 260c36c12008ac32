//! Arguments and setup shared by the sync commands.

use clap::Args;
use magnet_core::{AppConfig, AppError, AppResult};
use magnet_knowledge::{
    DataProcessor, DataSource, HttpFetcher, HttpJsonSource, JsonFileSource, SourceKind,
    SplitterSettings, SqliteStore,
};
use magnet_prompt::{LlmPromptExecutor, PromptExecutor, PromptLibrary};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Where records come from and how they are split.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Source type (file, salesforce, sharepoint, confluence, hubspot,
    /// rightnow, oracle_knowledge, documentation)
    #[arg(short = 't', long)]
    pub source_type: String,

    /// JSON or JSONL file with the source records
    #[arg(long, conflicts_with = "url")]
    pub records: Option<PathBuf>,

    /// HTTP endpoint returning the source records as JSON
    #[arg(long)]
    pub url: Option<String>,

    /// JSON pointer to the record array in the HTTP response
    #[arg(long, requires = "url")]
    pub records_pointer: Option<String>,

    /// Bearer token for the records endpoint
    #[arg(long, env = "MAGNET_SOURCE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// YAML or JSON file with splitter settings, merged over sync.splitter
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

impl SourceArgs {
    pub fn kind(&self) -> AppResult<SourceKind> {
        self.source_type.parse()
    }

    pub fn splitter_settings(&self, config: &AppConfig) -> AppResult<SplitterSettings> {
        let mut values = config.sync.splitter.clone();
        if let Some(path) = &self.settings {
            values.extend(read_settings_file(path)?);
        }
        SplitterSettings::from_map(&values)
    }

    fn data_source(&self, config: &AppConfig) -> AppResult<Box<dyn DataSource>> {
        match (&self.records, &self.url) {
            (Some(path), _) => Ok(Box::new(JsonFileSource::new(path))),
            (None, Some(url)) => {
                let mut source = HttpJsonSource::new(url, request_timeout(config))?;
                if let Some(token) = &self.token {
                    source = source.with_bearer_token(token);
                }
                if let Some(pointer) = &self.records_pointer {
                    source = source.with_records_pointer(pointer);
                }
                Ok(Box::new(source))
            }
            (None, None) => Err(AppError::Config(
                "Either --records or --url is required".to_string(),
            )),
        }
    }

    /// Build a processor and load the source batch into it.
    ///
    /// The LLM executor is only wired up when `transform` is set and the
    /// settings enable chunk transformation.
    pub async fn load_processor(&self, config: &AppConfig, transform: bool) -> AppResult<DataProcessor> {
        let kind = self.kind()?;
        let settings = self.splitter_settings(config)?;
        let transformation_enabled = settings.transformation.enabled;

        tracing::debug!(source = %kind, strategy = %settings.strategy, "Splitter settings resolved");

        let mut processor = DataProcessor::new(kind, settings)
            .with_fetcher(Arc::new(HttpFetcher::new(request_timeout(config))?));

        if transform && transformation_enabled {
            processor = processor.with_executor(build_executor(config)?);
        }

        let source = self.data_source(config)?;
        let loaded = processor.load(source.as_ref()).await?;
        tracing::info!(source = %kind, records = loaded, "Loaded source records");

        Ok(processor)
    }
}

/// Target store and collection.
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Collection to sync into
    #[arg(short = 'C', long)]
    pub collection: String,

    /// SQLite store path (default: .magnet/store.sqlite)
    #[arg(long)]
    pub store: Option<PathBuf>,
}

impl StoreArgs {
    pub fn open(&self, config: &AppConfig) -> AppResult<SqliteStore> {
        let path = self
            .store
            .clone()
            .unwrap_or_else(|| config.magnet_dir().join("store.sqlite"));
        tracing::debug!("Opening store at {:?}", path);
        SqliteStore::open(&path)
    }
}

fn request_timeout(config: &AppConfig) -> Duration {
    Duration::from_secs(config.sync.request_timeout_secs)
}

fn read_settings_file(path: &Path) -> AppResult<BTreeMap<String, Value>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Failed to read settings file {:?}: {}", path, e))
    })?;
    // YAML is a superset of JSON, so one parser covers both
    Ok(serde_yaml::from_str(&contents)?)
}

/// Prompt executor for chunk transformation, from the active provider.
pub fn build_executor(config: &AppConfig) -> AppResult<Arc<dyn PromptExecutor>> {
    config.validate()?;

    let endpoint = config
        .get_provider_config(&config.provider)
        .and_then(|provider| provider.endpoint());
    let api_key = config.resolve_api_key(&config.provider);

    let client = magnet_llm::create_client(
        &config.provider,
        endpoint,
        api_key.as_deref(),
        request_timeout(config),
    )?;

    tracing::info!(
        provider = client.provider_name(),
        model = %config.model,
        "Chunk transformation enabled"
    );

    let library = PromptLibrary::new(config.prompts_dir());
    Ok(Arc::new(LlmPromptExecutor::new(library, client, config.model.clone())))
}
