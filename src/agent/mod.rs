//! Agent module - role agents, retry, normalization and pipelines
//!
//! The manager owns one agent per role; pipelines chain those agents and
//! normalize every response before handing it to the next stage.

pub mod manager;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod role_agent;

pub use manager::AgentManager;
pub use normalizer::normalize;
pub use pipeline::{
    Pipeline, PipelineRequest, PipelineRun, PipelineRunner, PipelineState, ProgressCallback,
    StageEvent, StageOutput,
};
pub use retry::{Backoff, RetryExecutor, RetryPolicy};
pub use role_agent::{AgentInput, RoleAgent};
