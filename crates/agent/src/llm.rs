use std::time::Duration;

use async_trait::async_trait;
use nl2sql_core::config::{LlmConfig, LlmProvider};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("llm endpoint returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("llm response contained no {0}")]
    EmptyResponse(&'static str),
    #[error("llm client misconfigured: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

/// Chat completion and embedding client for OpenAI-style HTTP APIs.
///
/// OpenAI and Ollama share the `/v1/...` routes; Azure OpenAI addresses
/// deployments by name and authenticates with an `api-key` header.
pub struct OpenAiCompatibleClient {
    client: Client,
    provider: LlmProvider,
    base_url: String,
    api_key: Option<SecretString>,
    api_version: Option<String>,
    model: String,
    embedding_model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let base_url = match (&config.base_url, config.provider) {
            (Some(base_url), _) => base_url.trim_end_matches('/').to_string(),
            (None, LlmProvider::OpenAi) => "https://api.openai.com".to_string(),
            (None, provider) => {
                return Err(LlmError::Configuration(format!(
                    "llm.base_url is required for the {provider:?} provider"
                )))
            }
        };

        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            client,
            provider: config.provider,
            base_url,
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    fn endpoint(&self, deployment: &str, operation: &str) -> String {
        match self.provider {
            LlmProvider::AzureOpenAi => format!(
                "{}/openai/deployments/{deployment}/{operation}?api-version={}",
                self.base_url,
                self.api_version.as_deref().unwrap_or_default()
            ),
            LlmProvider::OpenAi | LlmProvider::Ollama => {
                format!("{}/v1/{operation}", self.base_url)
            }
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(api_key) = &self.api_key else {
            return request;
        };
        match self.provider {
            LlmProvider::AzureOpenAi => request.header("api-key", api_key.expose_secret()),
            LlmProvider::OpenAi | LlmProvider::Ollama => {
                request.bearer_auth(api_key.expose_secret())
            }
        }
    }

    async fn post_json<B, R>(&self, url: String, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let response = self.authorize(self.client.post(url)).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };
        let url = self.endpoint(&self.model, "chat/completions");
        let response: ChatResponse = self.post_json(url, &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse("completion choices"))
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiCompatibleClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request = EmbedRequest { model: &self.embedding_model, input: text };
        let url = self.endpoint(&self.embedding_model, "embeddings");
        let response: EmbedResponse = self.post_json(url, &request).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or(LlmError::EmptyResponse("embedding data"))
    }
}
