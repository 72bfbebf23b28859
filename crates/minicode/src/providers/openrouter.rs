use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use super::base::{FragmentStream, Provider};
use super::configs::OpenRouterProviderConfig;
use super::sse::{fragments, MalformedLineHook};
use crate::errors::{MinicodeError, Result};
use crate::models::message::Message;

const REFERER: &str = "https://minicode.dev";
const TITLE: &str = "MiniCode";

/// Streams chat completions from OpenRouter (or any OpenAI-compatible endpoint)
pub struct OpenRouterProvider {
    client: Client,
    config: OpenRouterProviderConfig,
    on_malformed: Option<MalformedLineHook>,
}

impl OpenRouterProvider {
    pub fn new(config: OpenRouterProviderConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(MinicodeError::Configuration(
                "OPENROUTER_API_KEY is not set".to_string(),
            ));
        }

        // No request timeout: a completion streams for as long as the model talks.
        let client = Client::builder()
            .build()
            .map_err(|e| MinicodeError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            config,
            on_malformed: None,
        })
    }

    /// Report every dropped stream line to `hook`, e.g. to count upstream protocol drift
    pub fn with_malformed_line_hook(mut self, hook: MalformedLineHook) -> Self {
        self.on_malformed = Some(hook);
        self
    }

    pub fn config(&self) -> &OpenRouterProviderConfig {
        &self.config
    }

    fn resolve_model(&self, model: Option<&str>) -> Result<String> {
        model
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.config.model.clone().filter(|m| !m.trim().is_empty()))
            .ok_or_else(|| {
                MinicodeError::Configuration(
                    "No model specified. Provide a model override or set OPENROUTER_MODEL."
                        .to_string(),
                )
            })
    }

    fn payload(&self, model: &str, messages: &[Message]) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();

        json!({
            "model": model,
            "messages": messages,
            "stream": true,
            "stream_options": { "include_usage": true },
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    async fn stream(&self, messages: &[Message], model: Option<&str>) -> Result<FragmentStream> {
        let model = self.resolve_model(model)?;
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );
        tracing::debug!(%model, messages = messages.len(), "opening completion stream");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&self.payload(&model, messages))
            .send()
            .await
            .map_err(|e| MinicodeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MinicodeError::Transport(status.to_string()));
        }
        if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Err(MinicodeError::Protocol("No response body".to_string()));
        }

        Ok(fragments(response.bytes_stream(), self.on_malformed.clone()).boxed())
    }
}
