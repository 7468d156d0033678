//! Ollama Provider
//!
//! Implementation of the LlmProvider trait for Ollama local inference over
//! its HTTP API. No API key is required.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http_client::build_http_client;
use super::provider::{network_error, parse_http_error, LlmProvider};
use super::types::{
    flatten_prompt, LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    StopReason, UsageStats,
};

/// Default Ollama API endpoint
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Ollama provider for local inference
pub struct OllamaProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Get the base URL for the Ollama server
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(OLLAMA_DEFAULT_URL)
            .trim_end_matches('/')
    }

    fn unavailable(&self) -> LlmError {
        LlmError::ProviderUnavailable {
            message: format!("Cannot connect to Ollama at {}", self.base_url()),
        }
    }

    fn map_transport(&self, err: reqwest::Error) -> LlmError {
        if err.is_connect() {
            self.unavailable()
        } else {
            network_error(err)
        }
    }

    /// Build a non-streaming generate request
    fn build_request_body(&self, prompt: &str, request_options: &LlmRequestOptions) -> serde_json::Value {
        let mut options = serde_json::json!({
            "temperature": self.config.temperature_for(request_options),
            "num_predict": self.config.max_tokens_for(request_options),
        });
        if !request_options.stop_sequences.is_empty() {
            options["stop"] = serde_json::json!(request_options.stop_sequences);
        }

        serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": options,
        })
    }

    fn parse_response(&self, response: OllamaGenerateResponse) -> LlmResponse {
        let stop_reason = response
            .done_reason
            .as_deref()
            .map(StopReason::from)
            .unwrap_or(StopReason::EndTurn);

        LlmResponse {
            content: Some(response.response),
            stop_reason,
            usage: UsageStats {
                input_tokens: response.prompt_eval_count.unwrap_or(0),
                output_tokens: response.eval_count.unwrap_or(0),
            },
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let prompt = flatten_prompt(&messages, system.as_deref());
        let body = self.build_request_body(&prompt, &request_options);

        debug!(model = %self.config.model, base_url = %self.base_url(), "sending ollama generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(network_error)?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "ollama"));
        }

        let parsed: OllamaGenerateResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.parse_response(parsed))
    }

    async fn health_check(&self) -> LlmResult<()> {
        // Listing local models is cheap and proves the server is up
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url()))
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(parse_http_error(status, &body, "ollama"))
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// Ollama `/api/generate` response with `stream: false`
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    model: Option<String>,
    #[serde(default)]
    response: String,
    done_reason: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}
