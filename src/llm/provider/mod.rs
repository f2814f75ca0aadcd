//! LLM Provider implementations and factory

pub mod openai;

use std::sync::Arc;

use tracing::info;

use crate::core::config::{Config, ProviderType};
use crate::core::Result;
use crate::llm::traits::LLMProvider;
use crate::llm::OllamaClient;

use self::openai::OpenAiProvider;

/// Create a new LLM provider based on configuration
pub fn create_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match config.provider.kind {
        ProviderType::Ollama => Arc::new(OllamaClient::from_config(config)?),
        ProviderType::OpenAi => Arc::new(OpenAiProvider::from_config(config)?),
    };

    info!(
        provider = provider.name(),
        model = provider.model(),
        base_url = %config.provider.base_url,
        "Model provider ready"
    );

    Ok(provider)
}
