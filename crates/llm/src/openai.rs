//! OpenAI Provider
//!
//! Implementation of the LlmProvider trait for OpenAI-compatible chat
//! completion endpoints.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http_client::build_http_client;
use super::provider::{missing_api_key_error, network_error, parse_http_error, LlmProvider};
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole, ProviderConfig,
    StopReason, UsageStats,
};

/// Default OpenAI API base
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(OPENAI_API_BASE)
            .trim_end_matches('/')
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| missing_api_key_error("openai"))
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut api_messages = Vec::with_capacity(messages.len() + 1);
        if let Some(sys) = system {
            api_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }
        api_messages.extend(messages.iter().map(message_to_openai));

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": api_messages,
            "max_tokens": self.config.max_tokens_for(request_options),
            "temperature": self.config.temperature_for(request_options),
        });

        if !request_options.stop_sequences.is_empty() {
            body["stop"] = serde_json::json!(request_options.stop_sequences);
        }

        body
    }

    /// Parse a response from OpenAI API
    fn parse_response(&self, response: OpenAIResponse) -> LlmResponse {
        let choice = response.choices.into_iter().next();

        let stop_reason = choice
            .as_ref()
            .and_then(|c| c.finish_reason.as_deref())
            .map(StopReason::from)
            .unwrap_or(StopReason::EndTurn);

        let content = choice.and_then(|c| c.message).and_then(|m| m.content);

        let usage = response
            .usage
            .map(|u| UsageStats {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            stop_reason,
            usage,
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
        }
    }
}

fn message_to_openai(message: &Message) -> serde_json::Value {
    let role = match message.role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    };
    serde_json::json!({
        "role": role,
        "content": message.content
    })
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
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
        let api_key = self.api_key()?;
        let body = self.build_request_body(&messages, system.as_deref(), &request_options);

        debug!(model = %self.config.model, messages = messages.len(), "sending openai chat request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url()))
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(network_error)?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "openai"));
        }

        let parsed: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.parse_response(parsed))
    }

    async fn health_check(&self) -> LlmResult<()> {
        let api_key = self.api_key()?;

        // Listing models verifies the key without spending tokens
        let response = self
            .client
            .get(format!("{}/models", self.base_url()))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(parse_http_error(status, &body, "openai"))
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderType;

    fn test_config() -> ProviderConfig {
        ProviderConfig {
            provider: ProviderType::OpenAI,
            api_key: Some("test-key".to_string()),
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new(test_config()).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o-mini");
        assert_eq!(provider.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_base_url_override_strips_trailing_slash() {
        let config = ProviderConfig {
            base_url: Some("http://localhost:8080/v1/".to_string()),
            ..test_config()
        };
        let provider = OpenAIProvider::new(config).unwrap();
        assert_eq!(provider.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_request_body_includes_system_and_stop() {
        let provider = OpenAIProvider::new(test_config()).unwrap();
        let options = LlmRequestOptions {
            stop_sequences: vec!["END".to_string()],
            ..Default::default()
        };
        let body = provider.build_request_body(
            &[Message::user("Analyze")],
            Some("You are a reviewer"),
            &options,
        );

        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Analyze");
        assert_eq!(body["stop"][0], "END");
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_request_body_omits_empty_stop() {
        let provider = OpenAIProvider::new(test_config()).unwrap();
        let body =
            provider.build_request_body(&[Message::user("x")], None, &LlmRequestOptions::default());
        assert!(body.get("stop").is_none());
        assert_eq!(body["messages"].as_array().map(|a| a.len()), Some(1));
    }

    #[test]
    fn test_parse_response() {
        let provider = OpenAIProvider::new(test_config()).unwrap();
        let raw = r#"{
            "model": "gpt-4o-mini-2024",
            "choices": [{"message": {"role": "assistant", "content": "METRICS:\nCOMPLEXITY: 2"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 20, "completion_tokens": 5}
        }"#;
        let parsed: OpenAIResponse = serde_json::from_str(raw).unwrap();
        let response = provider.parse_response(parsed);

        assert_eq!(response.text(), Some("METRICS:\nCOMPLEXITY: 2"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.model, "gpt-4o-mini-2024");
        assert_eq!(response.usage.total_tokens(), 25);
    }

    #[test]
    fn test_parse_response_length_stop() {
        let provider = OpenAIProvider::new(test_config()).unwrap();
        let raw = r#"{"choices": [{"message": {"content": "ERR"}, "finish_reason": "length"}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(raw).unwrap();
        let response = provider.parse_response(parsed);
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
        assert_eq!(response.model, "gpt-4o-mini");
    }
}
