//! Model transport

use crate::error::{LlmError, LlmResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tt_core::config::ModelConfig;

/// Environment variable that overrides the configured model identifier
pub const MODEL_OVERRIDE_ENV: &str = "OPENROUTER_MODEL";

/// A language model reachable with one system prompt and one user message
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one exchange and return the model's raw reply text
    async fn call(&self, system: &str, user: &str) -> LlmResult<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Option<String> {
        self.choices.into_iter().next()?.message?.content
    }
}

/// OpenRouter chat-completions client
pub struct OpenRouterClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl OpenRouterClient {
    /// Build a client from configuration and the process environment.
    ///
    /// A missing key is not an error here; calls fail with
    /// [`LlmError::MissingApiKey`] instead, so a server can still accept
    /// uploads without model access.
    pub fn from_config(config: &ModelConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        let model = std::env::var(MODEL_OVERRIDE_ENV)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| config.model.clone());
        if api_key.is_none() {
            log::warn!(
                "{} is not set; model calls will fail",
                config.api_key_env
            );
        }
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model,
            api_key,
            api_key_env: config.api_key_env.clone(),
        }
    }

    /// Model identifier sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    async fn call(&self, system: &str, user: &str) -> LlmResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingApiKey {
                var: self.api_key_env.clone(),
            })?;

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        log::debug!("Calling model {} at {}", self.model, self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed.into_content().ok_or(LlmError::EmptyResponse)
    }
}
