//! Agent registry
//!
//! Builds one agent per role up front, all sharing the same provider and
//! retry policy, and hands them out by role name.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::agent::retry::RetryPolicy;
use crate::agent::role_agent::RoleAgent;
use crate::core::{Config, MedscribeError, Result, Task};
use crate::llm::{create_provider, GenerateOptions, LLMProvider};

/// Owns every role agent for the lifetime of the process
#[derive(Debug)]
pub struct AgentManager {
    agents: BTreeMap<Task, RoleAgent>,
    policy: RetryPolicy,
}

impl AgentManager {
    /// Create a manager with the given `(max_retries, verbose)` pair and no
    /// timeout or backoff
    pub fn new(llm: Arc<dyn LLMProvider>, max_retries: u32, verbose: bool) -> Self {
        Self::with_policy(llm, RetryPolicy::new(max_retries, verbose), GenerateOptions::default())
    }

    /// Create a manager with a full retry policy
    pub fn with_policy(
        llm: Arc<dyn LLMProvider>,
        policy: RetryPolicy,
        options: GenerateOptions,
    ) -> Self {
        let agents = Task::ALL
            .into_iter()
            .map(|task| {
                (
                    task,
                    RoleAgent::new(task, Arc::clone(&llm), policy.clone(), options.clone()),
                )
            })
            .collect();

        Self { agents, policy }
    }

    /// Build the configured provider and a manager around it
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm = create_provider(config)?;
        let options = GenerateOptions {
            temperature: Some(config.provider.temperature),
            ..Default::default()
        };
        Ok(Self::with_policy(llm, config.retry_policy(), options))
    }

    /// Look up an agent by role name
    pub fn get_agent(&self, name: &str) -> Result<&RoleAgent> {
        let task: Task = name.parse()?;
        Ok(self.agent(task))
    }

    /// Agent for a known role
    pub fn agent(&self, task: Task) -> &RoleAgent {
        match self.agents.get(&task) {
            Some(agent) => agent,
            // every Task is inserted in `with_policy`
            None => unreachable!("no agent registered for {task}"),
        }
    }

    /// Retry policy shared by every agent
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Registered role names
    pub fn roles(&self) -> impl Iterator<Item = Task> + '_ {
        self.agents.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    fn manager() -> (Arc<ScriptedProvider>, AgentManager) {
        let provider = Arc::new(ScriptedProvider::new());
        let manager = AgentManager::new(provider.clone(), 2, true);
        (provider, manager)
    }

    #[test]
    fn test_every_role_resolves() {
        let (_, manager) = manager();
        for task in Task::ALL {
            let agent = manager.get_agent(task.as_str()).unwrap();
            assert_eq!(agent.role(), task);
        }
        assert_eq!(manager.roles().count(), Task::ALL.len());
    }

    #[test]
    fn test_same_role_same_instance() {
        let (_, manager) = manager();
        let first = manager.get_agent("refiner").unwrap();
        let second = manager.get_agent("refiner").unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_policy_shared_by_all_agents() {
        let (_, manager) = manager();
        for task in Task::ALL {
            let policy = manager.agent(task).retry_policy();
            assert_eq!(policy.max_retries, 2);
            assert!(policy.verbose);
        }
    }

    #[test]
    fn test_unknown_role_makes_no_call() {
        let (provider, manager) = manager();
        let err = manager.get_agent("unknown_role").unwrap_err();
        assert!(matches!(err, MedscribeError::UnknownRole(ref name) if name == "unknown_role"));
        assert_eq!(provider.total_calls(), 0);
    }
}
