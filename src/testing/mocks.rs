//! Mock provider for testing
//!
//! `ScriptedProvider` answers each role from a per-role queue of scripted
//! outcomes and records every call, so tests can count invocations per stage
//! without a model server.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::agent::prompts::template_for;
use crate::core::{MedscribeError, Message, RawResponse, Result, Task};
use crate::llm::{GenerateOptions, LLMProvider};

/// One recorded `chat` call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Role identified from the system prompt, if it matched one
    pub task: Option<Task>,
    /// System message text
    pub system: String,
    /// Rendered instruction text
    pub instruction: String,
}

enum Scripted {
    Ok(RawResponse),
    Fail(String),
    Delay(Duration, RawResponse),
}

/// Provider double with scripted per-role responses
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<Task, VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, task: Task, outcome: Scripted) {
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        scripts.entry(task).or_default().push_back(outcome);
    }

    /// Queue a successful response for `task`
    pub fn push_ok(&self, task: Task, response: impl Into<RawResponse>) {
        self.push(task, Scripted::Ok(response.into()));
    }

    /// Queue a failing call for `task`
    pub fn push_err(&self, task: Task, message: impl Into<String>) {
        self.push(task, Scripted::Fail(message.into()));
    }

    /// Queue `count` failing calls for `task`
    pub fn push_errs(&self, task: Task, count: usize, message: &str) {
        for _ in 0..count {
            self.push_err(task, message);
        }
    }

    /// Queue a response that only arrives after `delay`
    pub fn push_delayed(&self, task: Task, delay: Duration, response: impl Into<RawResponse>) {
        self.push(task, Scripted::Delay(delay, response.into()));
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls made for `task`
    pub fn call_count(&self, task: Task) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.task == Some(task))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn identify(system: &str) -> Option<Task> {
        Task::ALL
            .into_iter()
            .find(|task| template_for(*task).system == system)
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<RawResponse> {
        let system = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let instruction = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let task = Self::identify(&system);

        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                task,
                system,
                instruction,
            });

        let next = task.and_then(|task| {
            self.scripts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get_mut(&task)
                .and_then(VecDeque::pop_front)
        });

        match next {
            Some(Scripted::Ok(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(MedscribeError::provider(message)),
            Some(Scripted::Delay(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            None => Ok(RawResponse::Text(format!(
                "{} output",
                task.map(|t| t.as_str()).unwrap_or("unknown")
            ))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
