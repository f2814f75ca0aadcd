//! LLM Provider trait for abstracting different backends
//!
//! Agents only see this trait, so Ollama, OpenAI-compatible servers and test
//! doubles are interchangeable.

use async_trait::async_trait;

use crate::core::{Message, RawResponse, Result};

/// Options for LLM generation
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send one chat request and return the response untouched
    async fn chat(
        &self,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<RawResponse>;

    /// Get the provider name
    fn name(&self) -> &str;

    /// Model every request is sent to
    fn model(&self) -> &str;
}
