//! Medscribe - multi-agent medical text assistant
//!
//! Three tasks (summarize, write and refine, sanitize) run as fixed chains of
//! role agents over a remote language model.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, logging and error handling
//! - **LLM**: Provider abstraction with Ollama and OpenAI-compatible backends
//! - **Agent**: Role agents, retry, response normalization and pipelines
//! - **CLI**: Command-line interface and REPL
//! - **Testing**: Scripted provider for tests
//!
//! # Usage
//!
//! ```rust,no_run
//! use medscribe::agent::{AgentManager, PipelineRequest, PipelineRunner};
//! use medscribe::Config;
//!
//! #[tokio::main]
//! async fn main() -> medscribe::Result<()> {
//!     let manager = AgentManager::from_config(&Config::load()?)?;
//!     let run = PipelineRunner::new(&manager)
//!         .run(&PipelineRequest::Summarize {
//!             text: "Patient has mild fever.".to_string(),
//!         })
//!         .await?;
//!
//!     for stage in &run.stages {
//!         println!("{}: {}", stage.role, stage.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod testing;

// Re-export commonly used items
pub use agent::{AgentManager, PipelineRunner};
pub use cli::Repl;
pub use core::{Config, MedscribeError, ProviderType, Result};
