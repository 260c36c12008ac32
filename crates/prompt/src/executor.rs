//! Prompt template execution.
//!
//! [`PromptExecutor`] is the seam the chunking pipeline calls when a chunk
//! transformation is enabled. [`LlmPromptExecutor`] renders a template from
//! a [`PromptLibrary`] and sends it to an [`LlmClient`].

use crate::builder::build_prompt;
use crate::library::PromptLibrary;
use crate::types::PromptOutput;
use magnet_core::AppResult;
use magnet_llm::{LlmClient, LlmRequest};
use std::collections::HashMap;
use std::sync::Arc;

/// Executes a named prompt template against a set of values.
#[async_trait::async_trait]
pub trait PromptExecutor: Send + Sync {
    async fn execute_prompt_template(
        &self,
        template_name: &str,
        values: &HashMap<String, String>,
    ) -> AppResult<PromptOutput>;
}

/// Prompt executor backed by an LLM provider.
pub struct LlmPromptExecutor {
    library: PromptLibrary,
    client: Arc<dyn LlmClient>,
    default_model: String,
}

impl LlmPromptExecutor {
    pub fn new(
        library: PromptLibrary,
        client: Arc<dyn LlmClient>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            library,
            client,
            default_model: default_model.into(),
        }
    }

    pub fn library(&self) -> &PromptLibrary {
        &self.library
    }
}

#[async_trait::async_trait]
impl PromptExecutor for LlmPromptExecutor {
    async fn execute_prompt_template(
        &self,
        template_name: &str,
        values: &HashMap<String, String>,
    ) -> AppResult<PromptOutput> {
        let definition = self.library.get(template_name)?;
        let built = build_prompt(&definition, values.clone())?;

        let model = definition
            .model
            .name
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let mut request = LlmRequest::new(built.user, model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = definition.model.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = definition.model.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.client.complete(&request).await?;

        tracing::debug!(
            template = template_name,
            provider = self.client.provider_name(),
            total_tokens = response.usage.total_tokens,
            "Executed prompt template"
        );

        Ok(PromptOutput {
            content: response.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptDefinition, PromptModelSettings};
    use magnet_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;

    /// Echoes the request back and records it.
    #[derive(Default)]
    struct EchoClient {
        seen: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmClient for EchoClient {
        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(LlmResponse {
                content: format!("echo: {}", request.prompt),
                model: request.model.clone(),
                usage: LlmUsage::new(1, 1),
            })
        }
    }

    fn definition(model: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "chunk.rewrite".to_string(),
            title: "Rewrite".to_string(),
            api_version: "1.0".to_string(),
            created_by: String::new(),
            system: Some("Be brief".to_string()),
            template: "Rewrite: {{content}}".to_string(),
            model: PromptModelSettings {
                name: model.map(str::to_string),
                temperature: Some(0.0),
                max_tokens: None,
            },
        }
    }

    #[tokio::test]
    async fn test_execute_renders_and_completes() {
        let client = Arc::new(EchoClient::default());
        let library = PromptLibrary::new("unused");
        library.insert(definition(None)).unwrap();

        let executor = LlmPromptExecutor::new(library, client.clone(), "llama3.2");

        let mut values = HashMap::new();
        values.insert("content".to_string(), "Install the agent".to_string());
        let output = executor
            .execute_prompt_template("chunk.rewrite", &values)
            .await
            .unwrap();

        assert_eq!(output.content, "echo: Rewrite: Install the agent");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].model, "llama3.2");
        assert_eq!(seen[0].system.as_deref(), Some("Be brief"));
        assert_eq!(seen[0].temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_template_model_override() {
        let client = Arc::new(EchoClient::default());
        let library = PromptLibrary::new("unused");
        library.insert(definition(Some("gpt-4o-mini"))).unwrap();

        let executor = LlmPromptExecutor::new(library, client.clone(), "llama3.2");
        executor
            .execute_prompt_template("chunk.rewrite", &HashMap::new())
            .await
            .unwrap();

        assert_eq!(client.seen.lock().unwrap()[0].model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_unknown_template_errors() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let executor = LlmPromptExecutor::new(
            PromptLibrary::new(temp_dir.path()),
            Arc::new(EchoClient::default()),
            "llama3.2",
        );

        let result = executor
            .execute_prompt_template("missing", &HashMap::new())
            .await;
        assert!(result.is_err());
    }
}
