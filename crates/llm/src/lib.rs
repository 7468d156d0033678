//! Code Insight LLM
//!
//! Provides a unified interface for the advisory model backends:
//! - Cohere (generate endpoint)
//! - OpenAI-compatible chat completions
//! - Ollama (local inference)
//!
//! Also includes the HTTP client factory and the provider factory.

pub mod cohere;
pub mod factory;
pub mod http_client;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use cohere::CohereProvider;
pub use factory::create_provider;
pub use http_client::build_http_client;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;
