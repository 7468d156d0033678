//! Provider Factory
//!
//! Maps a `ProviderType` to its concrete provider implementation.

use std::sync::Arc;

use super::cohere::CohereProvider;
use super::ollama::OllamaProvider;
use super::openai::OpenAIProvider;
use super::provider::LlmProvider;
use super::types::{LlmResult, ProviderConfig, ProviderType};

/// Create an advisory provider from a ProviderConfig.
///
/// An empty model name falls back to the provider's default model.
pub fn create_provider(mut config: ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    if config.model.trim().is_empty() {
        config.model = config.provider.default_model().to_string();
    }

    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderType::Cohere => Arc::new(CohereProvider::new(config)?),
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(config)?),
        ProviderType::Ollama => Arc::new(OllamaProvider::new(config)?),
    };
    Ok(provider)
}
