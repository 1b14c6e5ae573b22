use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use schemars::JsonSchema;
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    services::cache::ResponseCache,
};

/// One structured completion: instructions, labelled inputs and the JSON
/// schema the answer must follow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredPrompt {
    pub name: String,
    pub instructions: String,
    pub input: String,
    pub schema: Value,
}

impl StructuredPrompt {
    pub fn for_output<T: JsonSchema>(
        name: &str,
        instructions: &str,
        fields: &[(&str, &str)],
    ) -> Self {
        let input = fields
            .iter()
            .map(|(label, value)| format!("{}:\n{}", label, value))
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            name: name.to_string(),
            instructions: instructions.to_string(),
            input,
            schema: Value::from(schemars::schema_for!(T)),
        }
    }

    fn cache_key(&self, model: &str) -> String {
        format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
            model, self.name, self.instructions, self.input, self.schema
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the raw JSON text produced for the prompt.
    async fn complete_json(&self, prompt: StructuredPrompt) -> AppResult<String>;
}

/// Runs the prompt and decodes the answer into `T`.
pub async fn predict<T>(model: &dyn LanguageModel, prompt: StructuredPrompt) -> AppResult<T>
where
    T: DeserializeOwned,
{
    let name = prompt.name.clone();
    let raw = model.complete_json(prompt).await?;
    serde_json::from_str(strip_code_fence(&raw)).map_err(|e| {
        log::warn!("Model returned malformed {} output: {}", name, e);
        AppError::UpstreamError(format!("Model returned malformed {} output", name))
    })
}

/// Some models wrap JSON in a markdown fence even when asked not to.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    choices: Vec<ChoiceBody>,
}

#[derive(Debug, Deserialize)]
struct ChoiceBody {
    message: MessageBody,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

pub struct OpenAiModelService {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiModelService {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.openai_api_key.expose_secret())
            .with_api_base(config.openai_api_base.clone());

        Self {
            client: Client::with_config(openai_config),
            model: config.quiz_model.clone(),
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModelService {
    async fn complete_json(&self, prompt: StructuredPrompt) -> AppResult<String> {
        let request = json!({
            "model": self.model,
            "temperature": 0.0,
            "messages": [
                { "role": "system", "content": prompt.instructions },
                { "role": "user", "content": prompt.input },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": prompt.name,
                    "schema": prompt.schema,
                    "strict": false,
                },
            },
        });

        log::debug!("Requesting {} from {}", prompt.name, self.model);

        let response: ChatCompletionBody = self.client.chat().create_byot(request).await?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AppError::UpstreamError("Model returned no choices".to_string()))?;

        if let Some(refusal) = message.refusal {
            return Err(AppError::UpstreamError(format!(
                "Model refused the request: {}",
                refusal
            )));
        }

        message
            .content
            .ok_or_else(|| AppError::UpstreamError("Model returned an empty message".to_string()))
    }
}

/// Memoizes completions of an inner model by prompt and model name.
pub struct CachedLanguageModel {
    inner: Arc<dyn LanguageModel>,
    cache: Arc<dyn ResponseCache>,
    model: String,
}

impl CachedLanguageModel {
    pub fn new(
        inner: Arc<dyn LanguageModel>,
        cache: Arc<dyn ResponseCache>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            cache,
            model: model.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for CachedLanguageModel {
    async fn complete_json(&self, prompt: StructuredPrompt) -> AppResult<String> {
        let key = prompt.cache_key(&self.model);
        if let Some(hit) = self.cache.get(&key).await? {
            return Ok(hit);
        }

        let response = self.inner.complete_json(prompt).await?;
        if let Err(e) = self.cache.put(&key, &response).await {
            log::warn!("Failed to cache model response: {}", e);
        }
        Ok(response)
    }
}
