//! Role-bound agents
//!
//! An agent owns one role's prompt template and issues exactly one remote
//! call per invocation (plus retries). It holds no per-run state, so one
//! instance can serve any number of concurrent runs.

use std::sync::Arc;

use tracing::debug;

use crate::agent::prompts::{template_for, PromptTemplate};
use crate::agent::retry::{RetryExecutor, RetryPolicy};
use crate::core::{MedscribeError, Message, RawResponse, Result, Task};
use crate::llm::{GenerateOptions, LLMProvider};

/// Inputs for one agent invocation, one variant per input signature
#[derive(Debug, Clone, PartialEq)]
pub enum AgentInput {
    /// `summarize`
    Text { text: String },
    /// `sanitize_data`
    MedicalData { data: String },
    /// `write_article`
    Article {
        topic: String,
        outline: Option<String>,
    },
    /// `refiner`
    Draft { draft: String },
    /// `summarize_validator`
    SummaryCheck {
        original_text: String,
        summary: String,
    },
    /// `validator`
    ArticleCheck { topic: String, article: String },
    /// `sanitize_data_validator`
    SanitizationCheck {
        original_data: String,
        sanitized_data: String,
    },
}

const NO_OUTLINE: &str = "No outline provided. Choose a structure that suits the topic.";

impl AgentInput {
    /// Role whose signature this input matches
    pub fn task(&self) -> Task {
        match self {
            AgentInput::Text { .. } => Task::Summarize,
            AgentInput::MedicalData { .. } => Task::SanitizeData,
            AgentInput::Article { .. } => Task::WriteArticle,
            AgentInput::Draft { .. } => Task::Refiner,
            AgentInput::SummaryCheck { .. } => Task::SummarizeValidator,
            AgentInput::ArticleCheck { .. } => Task::Validator,
            AgentInput::SanitizationCheck { .. } => Task::SanitizeDataValidator,
        }
    }

    /// Template slot values
    pub fn slots(&self) -> Vec<(&'static str, &str)> {
        match self {
            AgentInput::Text { text } => vec![("text", text.as_str())],
            AgentInput::MedicalData { data } => vec![("medical_data", data.as_str())],
            AgentInput::Article { topic, outline } => vec![
                ("topic", topic.as_str()),
                ("outline", outline.as_deref().unwrap_or(NO_OUTLINE)),
            ],
            AgentInput::Draft { draft } => vec![("draft", draft.as_str())],
            AgentInput::SummaryCheck {
                original_text,
                summary,
            } => vec![
                ("original_text", original_text.as_str()),
                ("summary", summary.as_str()),
            ],
            AgentInput::ArticleCheck { topic, article } => {
                vec![("topic", topic.as_str()), ("article", article.as_str())]
            }
            AgentInput::SanitizationCheck {
                original_data,
                sanitized_data,
            } => vec![
                ("original_data", original_data.as_str()),
                ("sanitized_data", sanitized_data.as_str()),
            ],
        }
    }
}

/// Human-readable input signature of a role
fn expected_input(task: Task) -> &'static str {
    match task {
        Task::Summarize => "text",
        Task::SanitizeData => "medical_data",
        Task::WriteArticle => "topic and optional outline",
        Task::Refiner => "draft",
        Task::SummarizeValidator => "original_text and summary",
        Task::Validator => "topic and article",
        Task::SanitizeDataValidator => "original_data and sanitized_data",
    }
}

/// An agent bound to a single role
#[derive(Clone)]
pub struct RoleAgent {
    role: Task,
    template: PromptTemplate,
    retry: RetryExecutor,
    llm: Arc<dyn LLMProvider>,
    options: GenerateOptions,
}

impl RoleAgent {
    pub fn new(
        role: Task,
        llm: Arc<dyn LLMProvider>,
        policy: RetryPolicy,
        options: GenerateOptions,
    ) -> Self {
        Self {
            role,
            template: template_for(role),
            retry: RetryExecutor::new(policy),
            llm,
            options,
        }
    }

    pub fn role(&self) -> Task {
        self.role
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.retry.policy()
    }

    /// Messages sent to the provider for `input`
    pub fn build_messages(&self, input: &AgentInput) -> Result<Vec<Message>> {
        if input.task() != self.role {
            return Err(MedscribeError::InvalidInput {
                role: self.role,
                expected: expected_input(self.role),
            });
        }

        Ok(vec![
            Message::system(self.template.system),
            Message::user(self.template.render(&input.slots())),
        ])
    }

    /// Run the role's model call and return the response untouched
    pub async fn execute(&self, input: &AgentInput) -> Result<RawResponse> {
        let messages = self.build_messages(input)?;
        debug!(role = %self.role, provider = self.llm.name(), "Executing agent");

        let messages = &messages;
        self.retry
            .execute(self.role, || {
                self.llm.chat(messages, Some(self.options.clone()))
            })
            .await
    }
}

impl std::fmt::Debug for RoleAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAgent")
            .field("role", &self.role)
            .field("provider", &self.llm.name())
            .field("retry", self.retry.policy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    fn agent(role: Task, provider: Arc<ScriptedProvider>) -> RoleAgent {
        RoleAgent::new(
            role,
            provider,
            RetryPolicy::new(1, false),
            GenerateOptions::default(),
        )
    }

    #[test]
    fn test_mismatched_input_rejected() {
        let agent = agent(Task::Refiner, Arc::new(ScriptedProvider::new()));
        let err = agent
            .build_messages(&AgentInput::Text {
                text: "x".to_string(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            MedscribeError::InvalidInput {
                role: Task::Refiner,
                expected: "draft"
            }
        ));
    }

    #[test]
    fn test_missing_outline_gets_placeholder() {
        let agent = agent(Task::WriteArticle, Arc::new(ScriptedProvider::new()));
        let messages = agent
            .build_messages(&AgentInput::Article {
                topic: "Sepsis screening".to_string(),
                outline: None,
            })
            .unwrap();
        assert_eq!(messages[0].role, "system");
        assert!(messages[1].content.contains("Topic: Sepsis screening"));
        assert!(messages[1].content.contains(NO_OUTLINE));
    }

    #[tokio::test]
    async fn test_execute_returns_raw_response() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_ok(Task::Refiner, RawResponse::text("{\"content\": \"Polished\"}"));
        let agent = agent(Task::Refiner, provider.clone());

        let raw = agent
            .execute(&AgentInput::Draft {
                draft: "rough".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(raw, RawResponse::text("{\"content\": \"Polished\"}"));
        assert_eq!(provider.call_count(Task::Refiner), 1);
        assert!(provider.calls()[0].instruction.contains("Draft:\nrough"));
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_call() {
        let provider = Arc::new(ScriptedProvider::new());
        let agent = agent(Task::Validator, provider.clone());

        let result = agent
            .execute(&AgentInput::Draft {
                draft: "x".to_string(),
            })
            .await;

        assert!(result.is_err());
        assert_eq!(provider.total_calls(), 0);
    }
}
