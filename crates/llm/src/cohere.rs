//! Cohere Provider
//!
//! Implementation of the LlmProvider trait for Cohere's generate endpoint.
//! The endpoint takes a single raw prompt, so conversations are flattened.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http_client::build_http_client;
use super::provider::{missing_api_key_error, network_error, parse_http_error, LlmProvider};
use super::types::{
    flatten_prompt, LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    StopReason, UsageStats,
};

/// Default Cohere API base
const COHERE_API_BASE: &str = "https://api.cohere.ai";

/// Cohere provider
pub struct CohereProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl CohereProvider {
    /// Create a new Cohere provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(COHERE_API_BASE)
            .trim_end_matches('/')
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| missing_api_key_error("cohere"))
    }

    /// Build the request body for the generate endpoint
    fn build_request_body(&self, prompt: &str, options: &LlmRequestOptions) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "max_tokens": self.config.max_tokens_for(options),
            "temperature": self.config.temperature_for(options),
            "return_likelihoods": "NONE",
        });

        if !options.stop_sequences.is_empty() {
            body["stop_sequences"] = serde_json::json!(options.stop_sequences);
        }

        body
    }

    /// Parse a response from the generate endpoint
    fn parse_response(&self, response: CohereGenerateResponse) -> LlmResponse {
        let generation = response.generations.into_iter().next();
        let stop_reason = generation
            .as_ref()
            .and_then(|g| g.finish_reason.as_deref())
            .map(StopReason::from)
            .unwrap_or(StopReason::EndTurn);

        let usage = response
            .meta
            .and_then(|m| m.billed_units)
            .map(|u| UsageStats {
                input_tokens: u.input_tokens.unwrap_or(0.0) as u32,
                output_tokens: u.output_tokens.unwrap_or(0.0) as u32,
            })
            .unwrap_or_default();

        LlmResponse {
            content: generation.map(|g| g.text),
            stop_reason,
            usage,
            model: self.config.model.clone(),
        }
    }
}

#[async_trait]
impl LlmProvider for CohereProvider {
    fn name(&self) -> &'static str {
        "cohere"
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
        let prompt = flatten_prompt(&messages, system.as_deref());
        let body = self.build_request_body(&prompt, &request_options);

        debug!(model = %self.config.model, prompt_len = prompt.len(), "sending cohere generate request");

        let response = self
            .client
            .post(format!("{}/v1/generate", self.base_url()))
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(network_error)?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "cohere"));
        }

        let parsed: CohereGenerateResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.parse_response(parsed))
    }

    async fn health_check(&self) -> LlmResult<()> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .post(format!("{}/v1/check-api-key", self.base_url()))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_http_error(status, &body, "cohere"));
        }

        let check: CohereKeyCheck = response.json().await.map_err(|e| LlmError::ParseError {
            message: e.to_string(),
        })?;
        if check.valid {
            Ok(())
        } else {
            Err(LlmError::AuthenticationFailed {
                message: "cohere: Invalid API key".to_string(),
            })
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// Cohere generate response format
#[derive(Debug, Deserialize)]
struct CohereGenerateResponse {
    #[serde(default)]
    generations: Vec<Generation>,
    meta: Option<ResponseMeta>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    #[serde(default)]
    text: String,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMeta {
    billed_units: Option<BilledUnits>,
}

#[derive(Debug, Deserialize)]
struct BilledUnits {
    input_tokens: Option<f64>,
    output_tokens: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CohereKeyCheck {
    #[serde(default)]
    valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderType;

    fn test_config() -> ProviderConfig {
        ProviderConfig {
            provider: ProviderType::Cohere,
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_provider_creation() {
        let provider = CohereProvider::new(test_config()).unwrap();
        assert_eq!(provider.name(), "cohere");
        assert_eq!(provider.model(), "command");
        assert_eq!(provider.base_url(), "https://api.cohere.ai");
    }

    #[test]
    fn test_request_body_carries_generation_controls() {
        let provider = CohereProvider::new(test_config()).unwrap();
        let options = LlmRequestOptions {
            stop_sequences: vec!["END".to_string()],
            ..Default::default()
        };
        let body = provider.build_request_body("Analyze", &options);

        assert_eq!(body["model"], "command");
        assert_eq!(body["prompt"], "Analyze");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["stop_sequences"][0], "END");
        assert_eq!(body["return_likelihoods"], "NONE");
    }

    #[test]
    fn test_parse_response() {
        let provider = CohereProvider::new(test_config()).unwrap();
        let raw = r#"{
            "id": "abc",
            "generations": [{"id": "g1", "text": "ERRORS:\n", "finish_reason": "COMPLETE"}],
            "meta": {"billed_units": {"input_tokens": 12, "output_tokens": 3}}
        }"#;
        let parsed: CohereGenerateResponse = serde_json::from_str(raw).unwrap();
        let response = provider.parse_response(parsed);

        assert_eq!(response.content.as_deref(), Some("ERRORS:\n"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total_tokens(), 15);
    }

    #[test]
    fn test_parse_response_without_generations() {
        let provider = CohereProvider::new(test_config()).unwrap();
        let parsed: CohereGenerateResponse = serde_json::from_str(r#"{"generations": []}"#).unwrap();
        let response = provider.parse_response(parsed);
        assert!(response.content.is_none());
        assert!(response.text().is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_request() {
        let config = ProviderConfig {
            api_key: None,
            ..test_config()
        };
        let provider = CohereProvider::new(config).unwrap();
        let result = provider
            .send_message(vec![Message::user("hi")], None, LlmRequestOptions::default())
            .await;
        assert!(matches!(result, Err(LlmError::AuthenticationFailed { .. })));
    }
}
