//! LLM module - Language Model integrations
//!
//! Provides the provider abstraction plus Ollama and OpenAI-compatible backends.

pub mod ollama;
pub mod provider;
pub mod traits;

pub use ollama::OllamaClient;
pub use provider::create_provider;
pub use traits::{GenerateOptions, LLMProvider};
