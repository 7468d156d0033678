//! LLM Types
//!
//! Core types for advisory provider interactions.

use serde::{Deserialize, Serialize};

/// Supported advisory provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Cohere,
    OpenAI,
    Ollama,
}

impl ProviderType {
    /// Model used when the configuration does not name one
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Cohere => "command",
            ProviderType::OpenAI => "gpt-4o-mini",
            ProviderType::Ollama => "llama3.1",
        }
    }

    /// Environment variable the API key is read from, if the provider needs one
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::Cohere => Some("COHERE_API_KEY"),
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Ollama => None,
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Cohere => write!(f, "cohere"),
            ProviderType::OpenAI => write!(f, "openai"),
            ProviderType::Ollama => write!(f, "ollama"),
        }
    }
}

/// Per-request options for provider behavior.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmRequestOptions {
    /// Optional generation budget override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens_override: Option<u32>,
    /// Optional temperature override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_override: Option<f32>,
    /// Literal strings that end generation when produced.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

/// Configuration for an advisory provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The provider type
    pub provider: ProviderType,
    /// API key (not needed for Ollama); never serialized
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    /// Base URL override (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name to use
    pub model: String,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.0
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::Cohere,
            api_key: None,
            base_url: None,
            model: ProviderType::Cohere.default_model().to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Effective token budget for a request
    pub fn max_tokens_for(&self, options: &LlmRequestOptions) -> u32 {
        options.max_tokens_override.unwrap_or(self.max_tokens)
    }

    /// Effective temperature for a request
    pub fn temperature_for(&self, options: &LlmRequestOptions) -> f32 {
        options.temperature_override.unwrap_or(self.temperature)
    }
}

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A plain-text message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a simple text message
    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: text.into(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(MessageRole::User, text)
    }
}

/// Flatten an optional system prompt and a conversation into a single
/// completion-style prompt, for providers that only accept raw prompts.
pub fn flatten_prompt(messages: &[Message], system: Option<&str>) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(messages.len() + 1);
    if let Some(sys) = system {
        parts.push(sys);
    }
    parts.extend(messages.iter().map(|m| m.content.as_str()));
    parts.join("\n\n")
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageStats {
    /// Input tokens consumed
    pub input_tokens: u32,
    /// Output tokens generated
    pub output_tokens: u32,
}

impl UsageStats {
    /// Total tokens (input + output)
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Reason the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of generation
    EndTurn,
    /// Token budget exhausted
    MaxTokens,
    /// A requested stop sequence was produced
    StopSequence,
    /// Provider-specific reason
    Other(String),
}

impl From<&str> for StopReason {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "end_turn" | "stop" | "complete" => StopReason::EndTurn,
            "max_tokens" | "length" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            _ => StopReason::Other(s.to_string()),
        }
    }
}

/// Complete response from a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Why generation stopped
    pub stop_reason: StopReason,
    /// Token usage
    pub usage: UsageStats,
    /// Model that produced the response
    pub model: String,
}

impl LlmResponse {
    /// Generated text with surrounding whitespace removed, or None when empty
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Error types for LLM operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmError {
    /// Authentication failed (invalid or missing API key)
    AuthenticationFailed { message: String },
    /// Rate limit exceeded
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },
    /// Model not found or not available
    ModelNotFound { model: String },
    /// Invalid request (bad parameters)
    InvalidRequest { message: String },
    /// Server error from the provider
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Network/connection error
    NetworkError { message: String },
    /// Response could not be decoded
    ParseError { message: String },
    /// Provider not available (e.g., Ollama not running)
    ProviderUnavailable { message: String },
    /// No response within the allotted interval
    Timeout { seconds: u64 },
    /// Request abandoned by the caller
    Cancelled,
    /// Other error
    Other { message: String },
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            LlmError::RateLimited { message, .. } => {
                write!(f, "Rate limited: {}", message)
            }
            LlmError::ModelNotFound { model } => {
                write!(f, "Model not found: {}", model)
            }
            LlmError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            LlmError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            LlmError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            LlmError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            LlmError::ProviderUnavailable { message } => {
                write!(f, "Provider unavailable: {}", message)
            }
            LlmError::Timeout { seconds } => {
                write!(f, "Advisory request timed out after {} seconds", seconds)
            }
            LlmError::Cancelled => write!(f, "Advisory request cancelled"),
            LlmError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_default() {
        let config = ProviderConfig::default();
        assert_eq!(config.provider, ProviderType::Cohere);
        assert_eq!(config.model, "command");
        assert_eq!(config.max_tokens, 1000);
        assert!(config.temperature.abs() < f32::EPSILON);
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let config = ProviderConfig {
            api_key: Some("secret-key".to_string()),
            ..ProviderConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-key"));

        let parsed: ProviderConfig = serde_json::from_str(&json).unwrap();
        assert!(parsed.api_key.is_none());
        assert_eq!(parsed.timeout_secs, 60);
    }

    #[test]
    fn test_request_overrides() {
        let config = ProviderConfig::default();
        let options = LlmRequestOptions {
            max_tokens_override: Some(250),
            temperature_override: Some(0.3),
            stop_sequences: vec!["END".to_string()],
        };
        assert_eq!(config.max_tokens_for(&options), 250);
        assert!((config.temperature_for(&options) - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.max_tokens_for(&LlmRequestOptions::default()), 1000);
    }

    #[test]
    fn test_flatten_prompt() {
        let messages = vec![Message::user("Analyze this")];
        assert_eq!(flatten_prompt(&messages, None), "Analyze this");
        assert_eq!(
            flatten_prompt(&messages, Some("You are a reviewer")),
            "You are a reviewer\n\nAnalyze this"
        );
    }

    #[test]
    fn test_response_text_ignores_whitespace() {
        let mut response = LlmResponse {
            content: Some("  \n ".to_string()),
            stop_reason: StopReason::EndTurn,
            usage: UsageStats::default(),
            model: "command".to_string(),
        };
        assert!(response.text().is_none());

        response.content = Some("\nERRORS:\n".to_string());
        assert_eq!(response.text(), Some("ERRORS:"));
    }

    #[test]
    fn test_stop_reason_from_str() {
        assert_eq!(StopReason::from("COMPLETE"), StopReason::EndTurn);
        assert_eq!(StopReason::from("stop"), StopReason::EndTurn);
        assert_eq!(StopReason::from("MAX_TOKENS"), StopReason::MaxTokens);
        assert_eq!(StopReason::from("length"), StopReason::MaxTokens);
        assert_eq!(StopReason::from("stop_sequence"), StopReason::StopSequence);
        assert_eq!(
            StopReason::from("ERROR_TOXIC"),
            StopReason::Other("ERROR_TOXIC".to_string())
        );
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Timeout { seconds: 30 };
        assert!(err.to_string().contains("30 seconds"));

        let err = LlmError::RateLimited {
            message: "Too many requests".to_string(),
            retry_after: Some(60),
        };
        assert!(err.to_string().contains("Rate limited"));
    }

    #[test]
    fn test_usage_stats() {
        let usage = UsageStats {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(usage.total_tokens(), 150);
    }
}
