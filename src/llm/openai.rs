use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    config::PlannerConfig,
    llm::{LlmClient, LlmError},
    message::{Conversation, Turn},
};

/// Client for an OpenAI-compatible chat-completions endpoint (vLLM, Ollama, ...).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: PlannerConfig,
    model: String,
    client: Client,
}

impl OpenAiClient {
    /// Creates a client for an explicit model id, ignoring `config.model`.
    pub fn new(config: PlannerConfig, model: impl Into<String>) -> Result<Self, LlmError> {
        let client = build_http_client(&config)?;
        Ok(Self {
            config,
            model: model.into(),
            client,
        })
    }

    /// Creates a client, asking the server for its first model when none is configured.
    pub async fn connect(config: PlannerConfig) -> Result<Self, LlmError> {
        let client = build_http_client(&config)?;
        let model = match config.model.clone() {
            Some(model) => model,
            None => discover_model(&client, &config).await?,
        };
        debug!(base_url = %config.base_url, model = %model, "completion client ready");
        Ok(Self {
            config,
            model,
            client,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Sends a request, retrying connection-level failures only.
    async fn send_with_retries(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, LlmError> {
        let mut attempt = 0;
        loop {
            let Some(this_try) = request.try_clone() else {
                return request.send().await.map_err(http_error);
            };
            match this_try.send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() && attempt < self.config.http_retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, "completion service unreachable, retrying");
                }
                Err(e) => return Err(http_error(e)),
            }
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        conversation: &Conversation,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: conversation.messages(),
            max_completion_tokens: max_tokens,
        };
        let request = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&body);

        let response = self.send_with_retries(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %body, "completion service returned error status");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Serialization(format!("Failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Response("No content in completion response".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn build_http_client(config: &PlannerConfig) -> Result<Client, LlmError> {
    let mut builder = Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(http_error)
}

async fn discover_model(client: &Client, config: &PlannerConfig) -> Result<String, LlmError> {
    let response = client
        .get(config.endpoint("models"))
        .bearer_auth(&config.api_key)
        .send()
        .await
        .map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let models: ModelList = response
        .json()
        .await
        .map_err(|e| LlmError::Serialization(format!("Failed to parse model list: {e}")))?;
    first_model_id(models)
}

fn first_model_id(models: ModelList) -> Result<String, LlmError> {
    models
        .data
        .into_iter()
        .next()
        .map(|model| model.id)
        .ok_or_else(|| LlmError::Response("server lists no models".to_string()))
}

fn http_error(e: reqwest::Error) -> LlmError {
    LlmError::Http(e.to_string())
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [&'a Turn; 2],
    max_completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}
